//! Turns classifier clusters into a concrete, conflict-free plan.

use crate::classifier::ClusterSuggestion;
use crate::plan::{
    FileAction, FileOperation, OrganizationPlan, PlanError, is_in_folder, resolve_path,
};
use crate::sanitize::{sanitize_filename, sanitize_folder_name, with_numeric_suffix};
use crate::scanner::FileRecord;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Builds organization plans.
///
/// Planning is deterministic: the folder list is sorted and conflict
/// numbering depends only on input order.
#[derive(Debug, Clone, Default)]
pub struct OrganizationPlanner {
    base_path: Option<PathBuf>,
}

impl OrganizationPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A planner that knows where the plan will run, so it can tell a pure
    /// rename from a move when deriving actions.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: Some(resolve_path(&base_path.into())),
        }
    }

    /// Creates a plan for `records` from the classifier's `clusters`.
    ///
    /// Cluster file names are matched against records by exact name; when
    /// several records share a name, the first one in scan order is used.
    /// Unmatched names are skipped. An empty cluster list yields a plan
    /// carrying [`PlanError::NoClusters`].
    pub fn create_plan(
        &self,
        records: &[FileRecord],
        clusters: &[ClusterSuggestion],
    ) -> OrganizationPlan {
        if clusters.is_empty() {
            warn!("no clusters to plan from");
            return OrganizationPlan::failed(PlanError::NoClusters);
        }

        let destinations: Vec<String> = clusters
            .iter()
            .map(|c| sanitize_folder_name(&c.folder_candidate()))
            .collect();

        let mut folders_to_create = destinations.clone();
        folders_to_create.sort();
        folders_to_create.dedup();

        let mut by_name: HashMap<&str, &FileRecord> = HashMap::new();
        for record in records {
            by_name.entry(record.name.as_str()).or_insert(record);
        }

        let mut operations = Vec::new();
        for (cluster, folder) in clusters.iter().zip(&destinations) {
            for name in &cluster.files {
                let Some(record) = by_name.get(name.as_str()) else {
                    debug!(file = %name, cluster = %cluster.category, "no scanned file with this name");
                    continue;
                };

                let new_name = cluster
                    .renames
                    .get(name)
                    .map(|proposed| sanitize_filename(proposed))
                    .unwrap_or_else(|| name.clone());

                operations.push(FileOperation {
                    action: FileAction::Move,
                    source_path: record.path.clone(),
                    destination_folder: folder.clone(),
                    original_name: name.clone(),
                    new_name,
                    category: cluster.category.clone(),
                    conflict_resolved: false,
                });
            }
        }

        let conflicts = resolve_naming_conflicts(&mut operations);
        for operation in &mut operations {
            operation.action = self.derive_action(operation);
        }

        let summary = generate_summary(&folders_to_create, &operations);
        info!(
            folders = folders_to_create.len(),
            operations = operations.len(),
            conflicts,
            "organization plan created"
        );

        OrganizationPlan {
            folders_to_create,
            file_operations: operations,
            summary,
            error: None,
        }
    }

    fn derive_action(&self, operation: &FileOperation) -> FileAction {
        let changes_directory = match &self.base_path {
            Some(base) => !is_in_folder(
                &operation.source_path,
                &base.join(&operation.destination_folder),
            ),
            None => true,
        };
        FileAction::derive(changes_directory, operation.renames())
    }
}

/// Makes `new_name` unique within every destination folder.
///
/// The first operation claiming a name keeps it; each later one gets the
/// smallest `_N` suffix not used by any other operation in that folder, and
/// is flagged `conflict_resolved`. Already-unique plans are left untouched.
/// Returns the number of renamed operations.
pub fn resolve_naming_conflicts(operations: &mut [FileOperation]) -> usize {
    let mut all_names: HashMap<String, HashSet<String>> = HashMap::new();
    for op in operations.iter() {
        all_names
            .entry(op.destination_folder.clone())
            .or_default()
            .insert(op.new_name.clone());
    }

    let mut claimed: HashMap<String, HashSet<String>> = HashMap::new();
    let mut resolved = 0;

    for op in operations.iter_mut() {
        let seen = claimed.entry(op.destination_folder.clone()).or_default();
        if seen.insert(op.new_name.clone()) {
            continue;
        }

        let names = all_names.entry(op.destination_folder.clone()).or_default();
        let mut n = 1;
        let mut candidate = with_numeric_suffix(&op.new_name, n);
        while names.contains(&candidate) || seen.contains(&candidate) {
            n += 1;
            candidate = with_numeric_suffix(&op.new_name, n);
        }

        debug!(
            folder = %op.destination_folder,
            from = %op.new_name,
            to = %candidate,
            "resolved naming conflict"
        );
        names.insert(candidate.clone());
        seen.insert(candidate.clone());
        op.new_name = candidate;
        op.conflict_resolved = true;
        resolved += 1;
    }

    resolved
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Human-readable plan summary.
pub fn generate_summary(folders: &[String], operations: &[FileOperation]) -> String {
    let count = |action: FileAction| operations.iter().filter(|op| op.action == action).count();
    let moves = count(FileAction::Move);
    let renames = count(FileAction::Rename);
    let move_and_renames = count(FileAction::MoveAndRename);
    let conflicts = operations.iter().filter(|op| op.conflict_resolved).count();

    let mut lines = vec![
        "Organization Plan Summary:".to_string(),
        format!("  - {} to create", plural(folders.len(), "folder")),
        format!("  - {} to organize", plural(operations.len(), "file")),
    ];
    if moves > 0 {
        lines.push(format!("  - {} to move", plural(moves, "file")));
    }
    if renames > 0 {
        lines.push(format!("  - {} to rename", plural(renames, "file")));
    }
    if move_and_renames > 0 {
        lines.push(format!(
            "  - {} to move and rename",
            plural(move_and_renames, "file")
        ));
    }
    if conflicts > 0 {
        lines.push(format!(
            "  - {} resolved",
            plural(conflicts, "naming conflict")
        ));
    }
    lines.join("\n")
}
