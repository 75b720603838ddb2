//! Recursive directory scanning.
//!
//! The scanner walks a directory tree, stats every regular file and turns it
//! into a [`FileRecord`]. Problems with individual entries never abort the
//! walk; they are collected as human-readable messages next to the records.

use crate::config::{CompiledFilters, ConfigError, OrganizerConfig};
use crate::file_category::{Category, CategoryTable, normalize_extension};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Metadata for one regular file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute, canonical path.
    pub path: PathBuf,
    /// Base name.
    pub name: String,
    /// Lowercase extension with leading dot, or empty.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the platform reports one.
    pub modified: Option<DateTime<Local>>,
    /// Creation time, if the platform reports one.
    pub created: Option<DateTime<Local>>,
    pub category: Category,
}

impl FileRecord {
    /// Builds a record from a path and its metadata.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata, table: &CategoryTable) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| normalize_extension(&e.to_string_lossy()))
            .unwrap_or_default();
        let category = table.categorize(&extension);

        Self {
            path,
            name,
            extension,
            size: metadata.len(),
            modified: metadata.modified().ok().map(to_local),
            created: metadata.created().ok().map(to_local),
            category,
        }
    }
}

fn to_local(time: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(time)
}

/// Records and errors produced by one scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanOutcome {
    pub records: Vec<FileRecord>,
    pub errors: Vec<String>,
}

impl ScanOutcome {
    fn failed(error: String) -> Self {
        Self {
            records: Vec::new(),
            errors: vec![error],
        }
    }
}

/// Result of a text preview request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPreview {
    Text(String),
    Unavailable,
}

impl ContentPreview {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPreview::Text(text) => Some(text),
            ContentPreview::Unavailable => None,
        }
    }
}

impl fmt::Display for ContentPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentPreview::Text(text) => f.write_str(text),
            ContentPreview::Unavailable => f.write_str("no preview available"),
        }
    }
}

/// Walks directories and extracts file metadata.
#[derive(Debug, Clone)]
pub struct Scanner {
    table: CategoryTable,
    filters: CompiledFilters,
    preview_extensions: HashSet<String>,
    preview_max_chars: usize,
}

impl Scanner {
    /// Creates a scanner with the given category table, no filters and the
    /// default preview settings.
    pub fn new(table: CategoryTable) -> Self {
        let settings = crate::config::ScannerSettings::default();
        Self {
            table,
            filters: CompiledFilters::allow_all(),
            preview_extensions: settings.preview_extension_set(),
            preview_max_chars: settings.preview_max_chars,
        }
    }

    /// Creates a scanner from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter rules do not compile.
    pub fn from_config(config: &OrganizerConfig) -> Result<Self, ConfigError> {
        let table = config.categories.table();
        if table.is_empty() {
            warn!("no extensions configured; every file will be categorized as other");
        } else {
            debug!(extensions = table.len(), "category table ready");
        }

        Ok(Self {
            table,
            filters: CompiledFilters::compile(&config.filters)?,
            preview_extensions: config.scanner.preview_extension_set(),
            preview_max_chars: config.scanner.preview_max_chars,
        })
    }

    /// Replaces the file filters.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// The category table this scanner uses.
    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Categorizes an extension with this scanner's table.
    pub fn categorize(&self, extension: &str) -> Category {
        self.table.categorize(extension)
    }

    /// Scans `root` recursively.
    ///
    /// Never fails: an invalid root yields no records and a single error, and
    /// every entry that cannot be read adds one error and is skipped.
    pub fn scan(&self, root: &Path) -> ScanOutcome {
        let metadata = match fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return ScanOutcome::failed(format!(
                    "Directory does not exist: {}",
                    root.display()
                ));
            }
            Err(e) => {
                return ScanOutcome::failed(describe_io_error(root, &e));
            }
        };

        if !metadata.is_dir() {
            return ScanOutcome::failed(format!("Path is not a directory: {}", root.display()));
        }

        let root = match fs::canonicalize(root) {
            Ok(path) => path,
            Err(e) => return ScanOutcome::failed(describe_io_error(root, &e)),
        };

        info!(root = %root.display(), "scanning directory");
        let mut outcome = ScanOutcome::default();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(&root).to_path_buf();
                    let message = match e.io_error() {
                        Some(io_err) => describe_io_error(&path, io_err),
                        None => format!("Cannot access: {} - {}", path.display(), e),
                    };
                    warn!("{}", message);
                    outcome.errors.push(message);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if !self.filters.should_include(relative) {
                debug!(path = %relative.display(), "excluded by filters");
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    outcome.records.push(FileRecord::from_metadata(
                        entry.path().to_path_buf(),
                        &metadata,
                        &self.table,
                    ));
                }
                Err(e) => {
                    let message = match e.io_error() {
                        Some(io_err) => describe_io_error(entry.path(), io_err),
                        None => format!("Cannot access: {} - {}", entry.path().display(), e),
                    };
                    warn!("{}", message);
                    outcome.errors.push(message);
                }
            }
        }

        info!(
            files = outcome.records.len(),
            errors = outcome.errors.len(),
            "scan complete"
        );
        outcome
    }

    /// Returns up to the configured number of leading characters of a
    /// text-like file.
    ///
    /// Content is decoded as UTF-8, falling back to Latin-1. Extensions
    /// outside the preview allow-list, binary content and read failures all
    /// yield [`ContentPreview::Unavailable`].
    pub fn extract_text_preview(&self, path: &Path) -> ContentPreview {
        let extension = path
            .extension()
            .map(|e| normalize_extension(&e.to_string_lossy()))
            .unwrap_or_default();
        if !self.preview_extensions.contains(&extension) {
            return ContentPreview::Unavailable;
        }

        // A UTF-8 char is at most four bytes.
        let byte_limit = self.preview_max_chars.saturating_mul(4) as u64;
        let mut buffer = Vec::new();
        let read = File::open(path).and_then(|file| file.take(byte_limit).read_to_end(&mut buffer));
        let truncated = match read {
            Ok(count) => count as u64 == byte_limit,
            Err(e) => {
                warn!("Could not extract text from {}: {}", path.display(), e);
                return ContentPreview::Unavailable;
            }
        };

        if let Some(kind) = infer::get(&buffer)
            && !matches!(kind.matcher_type(), infer::MatcherType::Text)
        {
            debug!(path = %path.display(), mime = kind.mime_type(), "binary content, no preview");
            return ContentPreview::Unavailable;
        }

        let text = decode_text(&buffer, truncated);
        ContentPreview::Text(text.chars().take(self.preview_max_chars).collect())
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(CategoryTable::default())
    }
}

/// Decodes UTF-8, falling back to Latin-1. When the read stopped at the byte
/// limit, a multi-byte sequence cut off at the end is dropped instead.
fn decode_text(bytes: &[u8], truncated: bool) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) if truncated && e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn describe_io_error(path: &Path, error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::PermissionDenied => format!("Permission denied: {}", path.display()),
        io::ErrorKind::NotFound => format!("File not found: {}", path.display()),
        _ => format!("Cannot access: {} - {}", path.display(), error),
    }
}
