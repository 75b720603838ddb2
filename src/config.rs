//! Organizer configuration.
//!
//! Configuration is loaded once from TOML and then passed around as an
//! immutable value: the category table, scanner settings, classifier batch
//! size and the file filter rules all come from here.
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! document = ["pdf", "docx", "txt"]
//! image = ["jpg", "png"]
//! video = ["mp4", "mkv"]
//!
//! [scanner]
//! preview_max_chars = 2000
//! preview_extensions = ["txt", "md", "csv"]
//! sample_size = 5
//!
//! [classifier]
//! batch_size = 100
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Every section is optional; missing values fall back to the defaults.

use crate::file_category::{
    CategoryTable, DEFAULT_DOCUMENT_EXTENSIONS, DEFAULT_IMAGE_EXTENSIONS,
    DEFAULT_VIDEO_EXTENSIONS, normalize_extension,
};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".dirplanrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub categories: CategorySets,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub classifier: ClassifierSettings,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Extension sets for the three named categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySets {
    #[serde(default = "default_document_extensions")]
    pub document: Vec<String>,

    #[serde(default = "default_image_extensions")]
    pub image: Vec<String>,

    #[serde(default = "default_video_extensions")]
    pub video: Vec<String>,
}

fn to_owned_list(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_document_extensions() -> Vec<String> {
    to_owned_list(DEFAULT_DOCUMENT_EXTENSIONS)
}

fn default_image_extensions() -> Vec<String> {
    to_owned_list(DEFAULT_IMAGE_EXTENSIONS)
}

fn default_video_extensions() -> Vec<String> {
    to_owned_list(DEFAULT_VIDEO_EXTENSIONS)
}

impl Default for CategorySets {
    fn default() -> Self {
        Self {
            document: default_document_extensions(),
            image: default_image_extensions(),
            video: default_video_extensions(),
        }
    }
}

impl CategorySets {
    /// Builds the lookup table used by the scanner.
    pub fn table(&self) -> CategoryTable {
        CategoryTable::from_sets(&self.document, &self.image, &self.video)
    }
}

/// Scanner tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Maximum characters returned by a text preview.
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,

    /// Extensions eligible for text previews.
    #[serde(default = "default_preview_extensions")]
    pub preview_extensions: Vec<String>,

    /// Number of sample records kept per category in type statistics.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_preview_max_chars() -> usize {
    2000
}

fn default_preview_extensions() -> Vec<String> {
    to_owned_list(&[
        "txt", "md", "csv", "json", "xml", "html", "htm", "py", "js", "java", "cpp", "c", "h",
        "css", "sql", "log", "ini", "cfg", "yaml", "yml", "toml",
    ])
}

fn default_sample_size() -> usize {
    5
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            preview_max_chars: default_preview_max_chars(),
            preview_extensions: default_preview_extensions(),
            sample_size: default_sample_size(),
        }
    }
}

impl ScannerSettings {
    /// Normalized preview allow-list.
    pub fn preview_extension_set(&self) -> HashSet<String> {
        self.preview_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

/// Classifier batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Maximum file names sent to the classifier per call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    100
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// File filter rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files starting with "." are scanned. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names (e.g. ".DS_Store").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the path relative to the scan root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl OrganizerConfig {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given
    /// 2. `.dirplanrc.toml` in the current directory
    /// 3. `~/.config/dirplan/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Fails if an explicitly given file is missing, or if any file found
    /// cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirplan")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Loads configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Filter rules with every pattern pre-compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
        .collect()
}

impl CompiledFilters {
    /// Compiles filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error for the first invalid glob or regex.
    pub fn compile(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Filters that accept every file.
    pub fn allow_all() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Checks whether a file, given by its path relative to the scan root,
    /// takes part in the scan.
    ///
    /// Include patterns win over everything; otherwise the hidden-file,
    /// file name, extension, glob and regex rules are tried in that order.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|p| p.matches_path(relative_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&normalize_extension(&ext.to_string_lossy()))
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|p| p.matches_path(relative_path))
        {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self::allow_all()
    }
}
