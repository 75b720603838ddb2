//! dirplan - plan and apply directory reorganizations
//!
//! Scans a directory into typed file records, summarizes them by type and
//! recency, turns classifier clusters into a conflict-free organization plan,
//! and executes that plan with dry-run support and per-operation error
//! isolation. Behavior is configurable through TOML files.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod executor;
pub mod file_category;
pub mod insights;
pub mod logging;
pub mod output;
pub mod plan;
pub mod planner;
pub mod sanitize;
pub mod scanner;

pub use classifier::{
    Classifier, ClassifierError, ClusterSuggestion, JsonFileClassifier, TypeClassifier,
    classify_in_batches,
};
pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use executor::{ExecutionResult, OperationError, PlanExecutor};
pub use file_category::{Category, CategoryTable};
pub use insights::{
    BatchKind, date_batch_suggestions, group_by_type, select_date_batch, type_statistics,
};
pub use plan::{FileAction, FileOperation, OrganizationPlan, PlanError};
pub use planner::OrganizationPlanner;
pub use scanner::{ContentPreview, FileRecord, ScanOutcome, Scanner};
