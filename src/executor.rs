//! Plan execution: folder creation followed by file moves.
//!
//! Each step is isolated. A failing folder or file is recorded in the
//! result and the executor carries on with the next step.

use crate::plan::{
    FileAction, FileOperation, OrganizationPlan, is_in_folder, resolve_path,
};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a single step failed.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Source file not found: {name}")]
    SourceNotFound { name: String },

    #[error("Destination already exists: {name}")]
    DestinationExists { name: String },

    #[error("Permission denied: {name}")]
    PermissionDenied { name: String },

    #[error("Cannot move {name} across filesystems; copy it to the destination instead")]
    CrossDevice { name: String },

    #[error("Failed to {action} {name}: {source}")]
    Io {
        action: String,
        name: String,
        #[source]
        source: io::Error,
    },
}

impl OperationError {
    /// Maps a failure while creating `folder`. There is no source file in
    /// this phase, so only permission problems get their own variant.
    fn from_folder_io(err: io::Error, folder: &str) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => OperationError::PermissionDenied {
                name: folder.to_string(),
            },
            _ => OperationError::Io {
                action: "create folder".to_string(),
                name: folder.to_string(),
                source: err,
            },
        }
    }

    fn from_io(err: io::Error, action: &str, name: &str) -> Self {
        let name = name.to_string();
        match err.kind() {
            io::ErrorKind::PermissionDenied => OperationError::PermissionDenied { name },
            io::ErrorKind::CrossesDevices => OperationError::CrossDevice { name },
            io::ErrorKind::NotFound => OperationError::SourceNotFound { name },
            _ => OperationError::Io {
                action: action.to_string(),
                name,
                source: err,
            },
        }
    }
}

/// Outcome of running a plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    pub folders_created: usize,
    pub operations_completed: usize,
    pub operations_failed: usize,
    /// File operations only; folders are not counted.
    pub total_operations: usize,
    pub dry_run: bool,
    pub cancelled: bool,
    pub log: Vec<String>,
    pub errors: Vec<String>,
    pub success: bool,
}

impl ExecutionResult {
    fn record(&mut self, line: String) {
        debug!("{line}");
        self.log.push(line);
    }

    fn record_error(&mut self, err: &OperationError) {
        let message = err.to_string();
        warn!("{message}");
        self.log.push(format!("[ERROR] {message}"));
        self.errors.push(message);
    }
}

/// Runs organization plans against the filesystem.
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
    cancel: Option<Arc<AtomicBool>>,
}

struct Progress<'a> {
    callback: Option<&'a mut dyn FnMut(usize, usize)>,
    done: usize,
    total: usize,
}

impl Progress<'_> {
    fn step(&mut self) {
        self.done += 1;
        if let Some(callback) = self.callback.as_deref_mut() {
            callback(self.done, self.total);
        }
    }
}

impl PlanExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `flag` between steps and stops early once it is set.
    pub fn with_cancel_flag(flag: Arc<AtomicBool>) -> Self {
        Self { cancel: Some(flag) }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Executes `plan` under `base_path`.
    ///
    /// In dry-run mode nothing on disk changes; every step is still
    /// validated and logged with a `[DRY-RUN]` prefix. `on_progress` receives
    /// `(done, total)` once per folder and once per file operation.
    pub fn execute(
        &self,
        plan: OrganizationPlan,
        base_path: &Path,
        dry_run: bool,
        on_progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> ExecutionResult {
        let base_path = resolve_path(base_path);
        let base_path = base_path.as_path();
        let mut result = ExecutionResult {
            total_operations: plan.file_operations.len(),
            dry_run,
            ..ExecutionResult::default()
        };
        let mut progress = Progress {
            callback: on_progress,
            done: 0,
            total: plan.total_steps(),
        };

        info!(
            base = %base_path.display(),
            folders = plan.folders_to_create.len(),
            operations = plan.file_operations.len(),
            dry_run,
            "executing plan"
        );

        for folder in &plan.folders_to_create {
            if self.cancel_remaining(&mut result, &progress) {
                return finish(result);
            }
            self.create_folder(base_path, folder, dry_run, &mut result);
            progress.step();
        }

        for operation in &plan.file_operations {
            if self.cancel_remaining(&mut result, &progress) {
                return finish(result);
            }
            match self.apply_operation(base_path, operation, dry_run, &mut result) {
                Ok(()) => result.operations_completed += 1,
                Err(err) => {
                    result.operations_failed += 1;
                    result.record_error(&err);
                }
            }
            progress.step();
        }

        finish(result)
    }

    fn cancel_remaining(&self, result: &mut ExecutionResult, progress: &Progress<'_>) -> bool {
        if !self.is_cancelled() {
            return false;
        }
        let skipped = progress.total - progress.done;
        result.cancelled = true;
        result.record(format!("Cancelled: {skipped} remaining step(s) skipped"));
        info!(skipped, "execution cancelled");
        true
    }

    fn create_folder(
        &self,
        base_path: &Path,
        folder: &str,
        dry_run: bool,
        result: &mut ExecutionResult,
    ) {
        let path = base_path.join(folder);
        if path.is_dir() {
            result.record(format!("Folder already exists: {folder}"));
            result.folders_created += 1;
            return;
        }

        if dry_run {
            result.record(format!("[DRY-RUN] Would create folder: {folder}"));
            result.folders_created += 1;
            return;
        }

        match fs::create_dir_all(&path) {
            Ok(()) => {
                result.record(format!("Created folder: {folder}"));
                result.folders_created += 1;
            }
            Err(err) => {
                let err = OperationError::from_folder_io(err, folder);
                result.record_error(&err);
            }
        }
    }

    fn apply_operation(
        &self,
        base_path: &Path,
        operation: &FileOperation,
        dry_run: bool,
        result: &mut ExecutionResult,
    ) -> Result<(), OperationError> {
        let target_dir = base_path.join(&operation.destination_folder);
        let needs_move = !is_in_folder(&operation.source_path, &target_dir);
        let needs_rename = operation.renames();

        if !needs_move && !needs_rename {
            result.record(format!(
                "[SKIP] File already in correct location: {}",
                operation.original_name
            ));
            return Ok(());
        }

        let action = FileAction::derive(needs_move, needs_rename);
        let destination = destination_path(base_path, operation);
        let display_destination =
            Path::new(&operation.destination_folder).join(&operation.new_name);

        if !operation.source_path.exists() {
            return Err(OperationError::SourceNotFound {
                name: operation.original_name.clone(),
            });
        }
        if destination.exists() {
            return Err(OperationError::DestinationExists {
                name: display_destination.display().to_string(),
            });
        }

        if dry_run {
            result.record(format!(
                "[DRY-RUN] Would {action}: {} -> {}",
                operation.original_name,
                display_destination.display()
            ));
            return Ok(());
        }

        move_file(&operation.source_path, &destination).map_err(|err| {
            OperationError::from_io(err, &action.to_string(), &operation.original_name)
        })?;

        let verb = if needs_move { "Moved" } else { "Renamed" };
        result.record(format!(
            "{verb}: {} -> {}",
            operation.original_name,
            display_destination.display()
        ));
        Ok(())
    }
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    if let Some(parent) = destination.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    fs::rename(source, destination)
}

fn finish(mut result: ExecutionResult) -> ExecutionResult {
    result.success = result.operations_failed == 0;
    info!(
        completed = result.operations_completed,
        failed = result.operations_failed,
        folders = result.folders_created,
        cancelled = result.cancelled,
        "plan execution finished"
    );
    result
}

/// Destination of `operation` under `base_path`.
pub fn destination_path(base_path: &Path, operation: &FileOperation) -> PathBuf {
    base_path
        .join(&operation.destination_folder)
        .join(&operation.new_name)
}
