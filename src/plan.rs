//! Organization plan types shared by the planner and the executor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What a file operation does to its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Move,
    Rename,
    MoveAndRename,
}

impl FileAction {
    /// Derives the action from whether the directory and the name change.
    ///
    /// An operation changing neither is still reported as a `Move`; the
    /// executor recognizes it and skips it.
    pub fn derive(changes_directory: bool, changes_name: bool) -> Self {
        match (changes_directory, changes_name) {
            (true, true) => FileAction::MoveAndRename,
            (false, true) => FileAction::Rename,
            _ => FileAction::Move,
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileAction::Move => "move",
            FileAction::Rename => "rename",
            FileAction::MoveAndRename => "move and rename",
        };
        f.write_str(label)
    }
}

/// One file to relocate and/or rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub action: FileAction,
    pub source_path: PathBuf,
    /// Sanitized folder, relative to the execution base path.
    pub destination_folder: String,
    pub original_name: String,
    pub new_name: String,
    /// Display label of the cluster that claimed the file.
    pub category: String,
    /// Set when conflict resolution appended a numeric suffix.
    pub conflict_resolved: bool,
}

impl FileOperation {
    pub fn renames(&self) -> bool {
        self.new_name != self.original_name
    }
}

/// Terminal planning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanError {
    /// The classifier produced nothing to plan from. Fall back to a
    /// type-based grouping instead of retrying.
    #[error("No valid clusters to organize")]
    NoClusters,
}

/// Folders to create and files to place.
///
/// The executor takes plans by value, so a plan runs at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPlan {
    /// Sorted and de-duplicated.
    pub folders_to_create: Vec<String>,
    pub file_operations: Vec<FileOperation>,
    pub summary: String,
    pub error: Option<PlanError>,
}

impl OrganizationPlan {
    /// A plan that records a terminal error and does nothing.
    pub fn failed(error: PlanError) -> Self {
        Self {
            folders_to_create: Vec::new(),
            file_operations: Vec::new(),
            summary: format!("No organization plan: {error}"),
            error: Some(error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folders_to_create.is_empty() && self.file_operations.is_empty()
    }

    /// Number of progress steps execution will report.
    pub fn total_steps(&self) -> usize {
        self.folders_to_create.len() + self.file_operations.len()
    }

    pub fn conflicts_resolved(&self) -> usize {
        self.file_operations
            .iter()
            .filter(|op| op.conflict_resolved)
            .count()
    }
}

/// Resolves symlinks and relative components, keeping `path` as given when
/// it cannot be resolved (for instance a folder not created yet).
pub fn resolve_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Whether `source` sits directly inside `folder`, comparing resolved paths.
pub fn is_in_folder(source: &Path, folder: &Path) -> bool {
    source
        .parent()
        .is_some_and(|parent| resolve_path(parent) == resolve_path(folder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_derivation() {
        assert_eq!(FileAction::derive(true, false), FileAction::Move);
        assert_eq!(FileAction::derive(false, true), FileAction::Rename);
        assert_eq!(FileAction::derive(true, true), FileAction::MoveAndRename);
        assert_eq!(FileAction::derive(false, false), FileAction::Move);
    }

    #[test]
    fn test_failed_plan_is_empty_with_error() {
        let plan = OrganizationPlan::failed(PlanError::NoClusters);
        assert!(plan.is_empty());
        assert_eq!(plan.error, Some(PlanError::NoClusters));
        assert_eq!(plan.total_steps(), 0);
    }

    #[test]
    fn test_plan_serializes_actions_in_snake_case() {
        let plan = OrganizationPlan {
            folders_to_create: vec!["Images".into()],
            file_operations: vec![FileOperation {
                action: FileAction::MoveAndRename,
                source_path: PathBuf::from("/data/photo.jpg"),
                destination_folder: "Images".into(),
                original_name: "photo.jpg".into(),
                new_name: "photo_1.jpg".into(),
                category: "Photos".into(),
                conflict_resolved: true,
            }],
            summary: String::new(),
            error: None,
        };

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["file_operations"][0]["action"], "move_and_rename");
        assert_eq!(json["error"], serde_json::Value::Null);
        assert_eq!(plan.conflicts_resolved(), 1);
    }
}
