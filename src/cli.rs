//! Command-line interface for dirplan.
//!
//! Handles argument parsing and orchestration: loading configuration,
//! scanning, classifying, planning and executing. Library errors are
//! wrapped with `anyhow` context here.

use crate::classifier::{Classifier, JsonFileClassifier, TypeClassifier, classify_in_batches};
use crate::config::OrganizerConfig;
use crate::executor::PlanExecutor;
use crate::file_category::Category;
use crate::insights::{
    BatchKind, DateBatch, TypeStats, date_batch_suggestions, select_date_batch, type_statistics,
};
use crate::output::OutputFormatter;
use crate::plan::{OrganizationPlan, PlanError};
use crate::planner::OrganizationPlanner;
use crate::scanner::{ContentPreview, Scanner};
use anyhow::{Context, Result, ensure};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Plan and apply directory reorganizations.
#[derive(Debug, Parser)]
#[command(name = "dirplan", version, about)]
pub struct Cli {
    /// Configuration file (defaults to .dirplanrc.toml, then ~/.config/dirplan/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a directory and show type statistics and batch suggestions
    Scan {
        dir: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build an organization plan without touching any files
    Plan {
        dir: PathBuf,
        /// Classifier response (JSON) to plan from instead of grouping by type
        #[arg(long, value_name = "FILE")]
        clusters: Option<PathBuf>,
        /// Only plan the files of one date batch
        #[arg(long, value_enum, value_name = "KIND")]
        batch: Option<BatchKind>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a plan and execute it
    Apply {
        dir: PathBuf,
        #[arg(long, value_name = "FILE")]
        clusters: Option<PathBuf>,
        /// Only organize the files of one date batch
        #[arg(long, value_enum, value_name = "KIND")]
        batch: Option<BatchKind>,
        /// Validate and report every step without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the text preview of a single file
    Preview { file: PathBuf },
}

/// Runs the parsed command line.
///
/// Returns `Ok(false)` when the command ran but reported failures, such as
/// file operations that could not be completed.
pub fn run(cli: &Cli) -> Result<bool> {
    run_command(&cli.command, cli.config.as_deref())
}

/// Runs a single command with an optional configuration path.
pub fn run_command(command: &Command, config_path: Option<&Path>) -> Result<bool> {
    let config = OrganizerConfig::load(config_path).context("Error loading configuration")?;
    let scanner = Scanner::from_config(&config).context("Error compiling filters")?;

    match command {
        Command::Scan { dir, json } => scan_directory(&config, &scanner, dir, *json),
        Command::Plan {
            dir,
            clusters,
            batch,
            json,
        } => {
            let (plan, _) = build_plan(&config, &scanner, dir, clusters.as_deref(), *batch)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                OutputFormatter::plan(&plan);
            }
            Ok(true)
        }
        Command::Apply {
            dir,
            clusters,
            batch,
            dry_run,
        } => apply_plan(
            &config,
            &scanner,
            dir,
            clusters.as_deref(),
            *batch,
            *dry_run,
        ),
        Command::Preview { file } => {
            ensure!(file.is_file(), "Not a file: {}", file.display());
            match scanner.extract_text_preview(file) {
                ContentPreview::Text(text) => OutputFormatter::plain(&text),
                ContentPreview::Unavailable => OutputFormatter::warning("No preview available"),
            }
            Ok(true)
        }
    }
}

#[derive(Debug, Serialize)]
struct ScanReport<'a> {
    root: &'a Path,
    total_files: usize,
    total_bytes: u64,
    statistics: &'a BTreeMap<Category, TypeStats>,
    batches: &'a [DateBatch],
    errors: &'a [String],
}

fn scan_directory(
    config: &OrganizerConfig,
    scanner: &Scanner,
    dir: &Path,
    json: bool,
) -> Result<bool> {
    let outcome = scanner.scan(dir);
    let stats = type_statistics(&outcome.records, config.scanner.sample_size);
    let batches = date_batch_suggestions(&outcome.records, Local::now());

    if json {
        let report = ScanReport {
            root: dir,
            total_files: outcome.records.len(),
            total_bytes: outcome.records.iter().map(|r| r.size).sum(),
            statistics: &stats,
            batches: &batches,
            errors: &outcome.errors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        OutputFormatter::info(&format!("Scanned: {}", dir.display()));
        OutputFormatter::type_table(&stats, outcome.records.len());
        OutputFormatter::date_batches(&batches);
        if !outcome.errors.is_empty() {
            OutputFormatter::header("SCAN ERRORS");
            for error in &outcome.errors {
                OutputFormatter::warning(error);
            }
        }
    }

    // A scan that yields nothing but errors means the root itself was unusable.
    Ok(!(outcome.records.is_empty() && !outcome.errors.is_empty()))
}

/// Scans `dir`, classifies its files and plans their placement.
///
/// With a `batch`, only the files of that date batch are classified and
/// planned. Returns the plan together with the canonical base path it refers to.
fn build_plan(
    config: &OrganizerConfig,
    scanner: &Scanner,
    dir: &Path,
    clusters: Option<&Path>,
    batch: Option<BatchKind>,
) -> Result<(OrganizationPlan, PathBuf)> {
    ensure!(dir.is_dir(), "Not a directory: {}", dir.display());
    let base = dir
        .canonicalize()
        .with_context(|| format!("Error resolving {}", dir.display()))?;

    let outcome = scanner.scan(&base);
    for error in &outcome.errors {
        warn!("{error}");
    }
    let records = match batch {
        Some(kind) => {
            let selected = select_date_batch(&outcome.records, kind, Local::now());
            info!(
                "{} of {} file(s) in the {kind} batch",
                selected.len(),
                outcome.records.len()
            );
            selected
        }
        None => outcome.records,
    };

    let classifier: Box<dyn Classifier> = match clusters {
        Some(path) => {
            ensure!(path.is_file(), "Cluster file not found: {}", path.display());
            let classifier = JsonFileClassifier::new(path);
            info!("reading clusters from {}", classifier.path().display());
            Box::new(classifier)
        }
        None => Box::new(TypeClassifier::new(config.categories.table())),
    };

    let batched = classify_in_batches(classifier.as_ref(), &records, config.classifier.batch_size);
    for message in &batched.fallbacks {
        OutputFormatter::warning(message);
    }

    let planner = OrganizationPlanner::with_base_path(&base);
    let mut plan = planner.create_plan(&records, &batched.clusters);

    if plan.error == Some(PlanError::NoClusters) && !records.is_empty() {
        info!("no usable clusters, grouping files by type");
        OutputFormatter::warning("No usable clusters; grouping files by type instead");
        let fallback = TypeClassifier::clusters_for_records(&records, "");
        plan = planner.create_plan(&records, &fallback);
    }

    Ok((plan, base))
}

fn apply_plan(
    config: &OrganizerConfig,
    scanner: &Scanner,
    dir: &Path,
    clusters: Option<&Path>,
    batch: Option<BatchKind>,
    dry_run: bool,
) -> Result<bool> {
    let (plan, base) = build_plan(config, scanner, dir, clusters, batch)?;

    if plan.error.is_some() || plan.file_operations.is_empty() {
        OutputFormatter::info("Nothing to organize.");
        return Ok(true);
    }

    OutputFormatter::plain(&plan.summary);
    if dry_run {
        OutputFormatter::dry_run_notice("Validating plan without making changes");
    }

    let pb = OutputFormatter::create_progress_bar(plan.total_steps() as u64);
    let mut on_progress = |done: usize, _total: usize| pb.set_position(done as u64);
    let result = PlanExecutor::new().execute(plan, &base, dry_run, Some(&mut on_progress));
    pb.finish_and_clear();

    OutputFormatter::execution_result(&result);
    Ok(result.success)
}
