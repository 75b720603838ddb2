//! Classifier interface and the built-in backends.
//!
//! A classifier looks at file names and proposes clusters of related files
//! with a suggested destination folder. The planner only ever sees
//! [`ClusterSuggestion`]s, so any backend works as long as it implements
//! [`Classifier`].

use crate::file_category::{Category, CategoryTable};
use crate::scanner::FileRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One proposed group of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSuggestion {
    /// Display label.
    #[serde(default)]
    pub category: String,
    /// File names (not paths), in the classifier's order.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Raw folder name candidate, sanitized by the planner.
    #[serde(default, alias = "suggestedFolder")]
    pub suggested_folder: Option<String>,
    /// Proposed new names keyed by original file name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renames: BTreeMap<String, String>,
}

impl ClusterSuggestion {
    /// The unsanitized destination folder: the suggested folder when it is
    /// not blank, otherwise the category lowercased with spaces turned into
    /// underscores.
    pub fn folder_candidate(&self) -> String {
        match self.suggested_folder.as_deref() {
            Some(folder) if !folder.trim().is_empty() => folder.to_string(),
            _ => self.category.to_lowercase().replace(' ', "_"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("No filenames provided for analysis")]
    EmptyInput,

    #[error("Classifier returned an invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Classifier did not return any file clusters")]
    NoClusters,

    #[error("Could not read classifier response {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Proposes clusters for a batch of file names.
pub trait Classifier {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Groups `filenames` into clusters.
    ///
    /// # Errors
    ///
    /// Malformed or empty results are errors; callers fall back to
    /// [`TypeClassifier`].
    fn classify(&self, filenames: &[String]) -> Result<Vec<ClusterSuggestion>, ClassifierError>;
}

/// Groups files by their extension category. This is the fallback used
/// whenever a smarter classifier fails.
#[derive(Debug, Clone, Default)]
pub struct TypeClassifier {
    table: CategoryTable,
}

impl TypeClassifier {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    /// Builds clusters straight from scanned records, using their recorded
    /// category. `folder_prefix` is prepended to every folder.
    pub fn clusters_for_records(records: &[FileRecord], folder_prefix: &str) -> Vec<ClusterSuggestion> {
        let mut by_category: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for record in records {
            by_category
                .entry(record.category)
                .or_default()
                .push(record.name.clone());
        }
        by_category
            .into_iter()
            .map(|(category, files)| type_cluster(category, files, folder_prefix))
            .collect()
    }
}

fn type_cluster(category: Category, files: Vec<String>, folder_prefix: &str) -> ClusterSuggestion {
    ClusterSuggestion {
        category: category.label().to_string(),
        files,
        description: format!("Files organized by type: {}", category.key()),
        suggested_folder: Some(format!("{folder_prefix}{}", category.key())),
        renames: BTreeMap::new(),
    }
}

impl Classifier for TypeClassifier {
    fn name(&self) -> &str {
        "type"
    }

    fn classify(&self, filenames: &[String]) -> Result<Vec<ClusterSuggestion>, ClassifierError> {
        if filenames.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let mut by_category: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for name in filenames {
            let extension = Path::new(name)
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            by_category
                .entry(self.table.categorize(&extension))
                .or_default()
                .push(name.clone());
        }

        Ok(by_category
            .into_iter()
            .map(|(category, files)| type_cluster(category, files, ""))
            .collect())
    }
}

/// Replays a classifier response stored as JSON, e.g. one saved from an AI
/// service.
///
/// The file holds either `{"clusters": [...]}` or a bare array, optionally
/// wrapped in a markdown code fence. Each call narrows the stored clusters to
/// the requested file names.
#[derive(Debug, Clone)]
pub struct JsonFileClassifier {
    path: PathBuf,
}

impl JsonFileClassifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Classifier for JsonFileClassifier {
    fn name(&self) -> &str {
        "json-file"
    }

    fn classify(&self, filenames: &[String]) -> Result<Vec<ClusterSuggestion>, ClassifierError> {
        if filenames.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }

        let text = fs::read_to_string(&self.path).map_err(|source| ClassifierError::Io {
            path: self.path.clone(),
            source,
        })?;
        let wanted: HashSet<&str> = filenames.iter().map(String::as_str).collect();

        let clusters: Vec<ClusterSuggestion> = parse_cluster_response(&text)?
            .into_iter()
            .filter_map(|mut cluster| {
                cluster.files.retain(|f| wanted.contains(f.as_str()));
                cluster.renames.retain(|original, _| wanted.contains(original.as_str()));
                (!cluster.files.is_empty()).then_some(cluster)
            })
            .collect();

        if clusters.is_empty() {
            return Err(ClassifierError::NoClusters);
        }
        Ok(clusters)
    }
}

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("Invalid code fence pattern")
});

#[derive(Deserialize)]
#[serde(untagged)]
enum ClusterResponse {
    Wrapped { clusters: Vec<ClusterSuggestion> },
    Bare(Vec<ClusterSuggestion>),
}

/// Parses a classifier response body.
///
/// # Errors
///
/// `InvalidResponse` when the text is not one of the accepted shapes,
/// `NoClusters` when it holds no clusters.
pub fn parse_cluster_response(text: &str) -> Result<Vec<ClusterSuggestion>, ClassifierError> {
    let body = CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text.trim(), |m| m.as_str());

    let response: ClusterResponse = serde_json::from_str(body).map_err(|e| {
        let excerpt: String = body.chars().take(200).collect();
        debug!(response = %excerpt, "unparseable classifier response");
        ClassifierError::InvalidResponse(e.to_string())
    })?;

    let clusters = match response {
        ClusterResponse::Wrapped { clusters } => clusters,
        ClusterResponse::Bare(clusters) => clusters,
    };

    if clusters.is_empty() {
        return Err(ClassifierError::NoClusters);
    }
    Ok(clusters)
}

/// Clusters gathered over all batches.
#[derive(Debug, Default)]
pub struct BatchedClusters {
    pub clusters: Vec<ClusterSuggestion>,
    /// One message per batch that fell back to type-based clusters.
    pub fallbacks: Vec<String>,
}

/// Classifies records in chunks of at most `batch_size` names.
///
/// With more than one chunk, each chunk's folders get a `batch{N}_` prefix so
/// suggestions from different chunks cannot collide. A chunk whose
/// classification fails is grouped by type instead.
pub fn classify_in_batches(
    classifier: &dyn Classifier,
    records: &[FileRecord],
    batch_size: usize,
) -> BatchedClusters {
    let mut result = BatchedClusters::default();
    if records.is_empty() {
        return result;
    }

    let chunks: Vec<&[FileRecord]> = records.chunks(batch_size.max(1)).collect();
    let batched = chunks.len() > 1;
    info!(
        classifier = classifier.name(),
        files = records.len(),
        batches = chunks.len(),
        "classifying files"
    );

    for (index, chunk) in chunks.iter().enumerate() {
        let prefix = if batched {
            format!("batch{}_", index + 1)
        } else {
            String::new()
        };
        let names: Vec<String> = chunk.iter().map(|r| r.name.clone()).collect();

        match classifier.classify(&names) {
            Ok(clusters) => {
                result.clusters.extend(clusters.into_iter().map(|mut cluster| {
                    if batched {
                        cluster.suggested_folder =
                            Some(format!("{prefix}{}", cluster.folder_candidate()));
                    }
                    cluster
                }));
            }
            Err(e) => {
                let message = if batched {
                    format!("Batch {} fell back to type-based grouping: {}", index + 1, e)
                } else {
                    format!("Fell back to type-based grouping: {e}")
                };
                warn!("{}", message);
                result.fallbacks.push(message);
                result
                    .clusters
                    .extend(TypeClassifier::clusters_for_records(chunk, &prefix));
            }
        }
    }

    result
}
