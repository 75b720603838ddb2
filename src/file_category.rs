/// File categorization by extension.
///
/// A `CategoryTable` is the single source of truth for turning an extension
/// into one of the four broad categories the scanner reports. Tables are plain
/// values built from configuration, so different tables can coexist.
///
/// # Examples
///
/// ```
/// use dirplan::file_category::{Category, CategoryTable};
///
/// let table = CategoryTable::default();
/// assert_eq!(table.categorize(".pdf"), Category::Document);
/// assert_eq!(table.categorize("JPG"), Category::Image);
/// assert_eq!(table.categorize(".xyz"), Category::Other);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Documents, spreadsheets, presentations and structured text.
    Document,
    /// Raster, vector and camera raw images.
    Image,
    /// Video containers.
    Video,
    /// Everything else.
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::Document,
        Category::Image,
        Category::Video,
        Category::Other,
    ];

    /// Returns the lowercase key for this category, also used as the folder
    /// name by type-based organization.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirplan::file_category::Category;
    ///
    /// assert_eq!(Category::Image.key(), "image");
    /// assert_eq!(Category::Other.key(), "other");
    /// ```
    pub fn key(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Image => "image",
            Category::Video => "video",
            Category::Other => "other",
        }
    }

    /// Returns the plural display label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Document => "Documents",
            Category::Image => "Images",
            Category::Video => "Videos",
            Category::Other => "Other Files",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub(crate) const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "rtf", "odt", "xls", "xlsx", "ppt", "pptx", "csv", "md", "html",
    "htm", "xml", "json",
];

pub(crate) const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "svg", "webp", "ico", "raw", "cr2", "nef",
    "arw",
];

pub(crate) const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "ogv",
];

/// Maps file extensions to categories.
///
/// Extensions are stored normalized: lowercase with a single leading dot.
/// Lookups accept either form (`"pdf"` or `".PDF"`).
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, Category>,
}

impl CategoryTable {
    /// Creates an empty table; every lookup yields `Category::Other`.
    pub fn empty() -> Self {
        Self {
            extension_map: HashMap::new(),
        }
    }

    /// Builds a table from the three extension sets.
    ///
    /// An extension listed in more than one set keeps the first category it
    /// was registered under, in document, image, video order.
    pub fn from_sets<S: AsRef<str>>(documents: &[S], images: &[S], videos: &[S]) -> Self {
        let mut table = Self::empty();
        for ext in documents {
            table.add_extension(ext.as_ref(), Category::Document);
        }
        for ext in images {
            table.add_extension(ext.as_ref(), Category::Image);
        }
        for ext in videos {
            table.add_extension(ext.as_ref(), Category::Video);
        }
        table
    }

    /// Registers an extension unless it is already mapped.
    pub fn add_extension(&mut self, ext: &str, category: Category) {
        let key = normalize_extension(ext);
        if key.is_empty() || category == Category::Other {
            return;
        }
        self.extension_map.entry(key).or_insert(category);
    }

    /// Maps an extension to its category; unknown or empty extensions are
    /// `Category::Other`.
    pub fn categorize(&self, ext: &str) -> Category {
        self.extension_map
            .get(&normalize_extension(ext))
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Number of mapped extensions.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::from_sets(
            DEFAULT_DOCUMENT_EXTENSIONS,
            DEFAULT_IMAGE_EXTENSIONS,
            DEFAULT_VIDEO_EXTENSIONS,
        )
    }
}

/// Lowercases an extension and gives it exactly one leading dot.
/// Empty input stays empty.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}
