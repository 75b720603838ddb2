//! Name sanitization shared by folders and files.
//!
//! Produces names that are legal on both POSIX and Windows filesystems.

use std::path::Path;

/// Placeholder used when a folder name sanitizes to nothing.
pub const FOLDER_PLACEHOLDER: &str = "organized_files";
/// Placeholder used when a file stem sanitizes to nothing.
pub const FILE_PLACEHOLDER: &str = "file";

const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replaces invalid characters with `_`, strips surrounding spaces and dots,
/// and collapses underscore runs. Returns an empty string if nothing is left.
fn clean(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');

    let mut collapsed = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

/// Sanitizes a folder name.
///
/// # Examples
///
/// ```
/// use dirplan::sanitize::sanitize_folder_name;
///
/// assert_eq!(sanitize_folder_name("Tax: 2024/25"), "Tax_ 2024_25");
/// assert_eq!(sanitize_folder_name(" ..misc.. "), "misc");
/// assert_eq!(sanitize_folder_name("???"), "_");
/// assert_eq!(sanitize_folder_name("..."), "organized_files");
/// ```
pub fn sanitize_folder_name(name: &str) -> String {
    let cleaned = clean(name);
    if cleaned.is_empty() {
        FOLDER_PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}

/// Sanitizes a file name, cleaning the stem and keeping the extension.
///
/// # Examples
///
/// ```
/// use dirplan::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("what?.txt"), "what_.txt");
/// assert_eq!(sanitize_filename("  .pdf"), "file.pdf");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let (stem, extension) = split_name(name);
    let cleaned = clean(stem);
    let stem = if cleaned.is_empty() {
        FILE_PLACEHOLDER
    } else {
        cleaned.as_str()
    };
    format!("{stem}{}", clean_extension(extension))
}

fn clean_extension(extension: &str) -> String {
    let cleaned: String = extension
        .chars()
        .filter(|c| !INVALID_CHARS.contains(c) && *c != ' ')
        .collect();
    // A bare trailing dot is not legal on Windows.
    if cleaned == "." { String::new() } else { cleaned }
}

/// Splits a file name into stem and extension (with its dot).
///
/// Only the last dot counts, and a leading dot does not start an extension,
/// so `.bashrc` has no extension and `archive.tar.gz` splits into
/// `archive.tar` and `.gz`.
pub fn split_name(name: &str) -> (&str, &str) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(_), Some(ext)) => {
            let ext_len = ext.len() + 1;
            name.split_at(name.len() - ext_len)
        }
        _ => (name, ""),
    }
}

/// Inserts `_{n}` between stem and extension.
pub fn with_numeric_suffix(name: &str, n: usize) -> String {
    let (stem, extension) = split_name(name);
    format!("{stem}_{n}{extension}")
}
