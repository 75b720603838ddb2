//! Terminal output for the CLI.
//!
//! All user-facing printing goes through [`OutputFormatter`] so styling stays
//! consistent between commands. Diagnostics go through `tracing` instead.

use crate::executor::ExecutionResult;
use crate::file_category::Category;
use crate::insights::{DateBatch, Priority, TypeStats};
use crate::plan::{FileAction, OrganizationPlan};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Styled printing helpers.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Tables for scan statistics, date batches, plans and execution results
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use dirplan::output::OutputFormatter;
    /// OutputFormatter::success("Plan executed");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar fed by the executor's progress callback.
    ///
    /// ```no_run
    /// use dirplan::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(10);
    /// pb.set_position(3);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints per-category counts, sizes and top extensions.
    pub fn type_table(stats: &BTreeMap<Category, TypeStats>, total_files: usize) {
        Self::header("FILE TYPES");

        let width = stats
            .keys()
            .map(|c| c.label().len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {:>6} | {:>10} | {}",
            "Category".bold(),
            "Files".bold(),
            "Size".bold(),
            "Top extensions".bold(),
        );
        println!("{}", "-".repeat(width + 45));

        for (category, entry) in stats {
            let extensions = entry
                .top_extensions
                .iter()
                .map(|(ext, count)| format!("{ext} ({count})"))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "{:<width$} | {:>6} | {:>7.2} MB | {}",
                category.label(),
                entry.count.to_string().green(),
                entry.total_megabytes(),
                extensions,
            );
        }

        println!("{}", "-".repeat(width + 45));
        println!(
            "{:<width$} | {:>6} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
        );
    }

    pub fn date_batches(batches: &[DateBatch]) {
        Self::header("SUGGESTED BATCHES");
        if batches.is_empty() {
            Self::plain("  (no files)");
            return;
        }
        for batch in batches {
            let priority = match batch.priority {
                Priority::High => batch.priority.to_string().red(),
                Priority::Medium => batch.priority.to_string().yellow(),
                Priority::Low => batch.priority.to_string().normal(),
            };
            println!(
                "  [{}] {} - {} file(s)",
                priority,
                batch.title.bold(),
                batch.file_count
            );
            println!(
                "      {} {}",
                batch.description.dimmed(),
                format!("(--batch {})", batch.kind).dimmed()
            );
        }
    }

    /// Prints a plan: its summary followed by one line per operation.
    pub fn plan(plan: &OrganizationPlan) {
        Self::header("PLAN");
        if let Some(error) = &plan.error {
            Self::warning(&error.to_string());
            return;
        }
        if plan.is_empty() {
            Self::info("Nothing to organize.");
            return;
        }
        Self::plain(&plan.summary);

        if !plan.folders_to_create.is_empty() {
            Self::header("Folders");
            for folder in &plan.folders_to_create {
                println!("  {}/", folder.cyan());
            }
        }

        if !plan.file_operations.is_empty() {
            Self::header("Operations");
        }
        for op in &plan.file_operations {
            let target = format!("{}/{}", op.destination_folder, op.new_name);
            let marker = if op.conflict_resolved {
                " (renamed to avoid conflict)".yellow().to_string()
            } else {
                String::new()
            };
            let action = match op.action {
                FileAction::Move => "move".normal(),
                FileAction::Rename => "rename".cyan(),
                FileAction::MoveAndRename => "move+rename".magenta(),
            };
            println!("  {:<11} {} -> {}{}", action, op.original_name, target, marker);
        }
    }

    /// Prints the execution log, errors and totals.
    pub fn execution_result(result: &ExecutionResult) {
        Self::header("LOG");
        for line in &result.log {
            if line.starts_with("[ERROR]") {
                println!("  {}", line.red());
            } else if line.starts_with("[DRY-RUN]") {
                println!("  {}", line.yellow());
            } else if line.starts_with("[SKIP]") {
                println!("  {}", line.dimmed());
            } else {
                println!("  {}", line);
            }
        }

        Self::header("SUMMARY");
        println!("  Folders:    {}", result.folders_created);
        println!(
            "  Operations: {}/{} completed, {} failed",
            result.operations_completed.to_string().green(),
            result.total_operations,
            result.operations_failed.to_string().red()
        );

        if result.cancelled {
            Self::warning("Execution was cancelled before all steps ran");
        }
        if result.dry_run {
            Self::dry_run_notice("No changes were made");
        }
        if result.success {
            Self::success("All operations completed");
        } else {
            for error in &result.errors {
                Self::error(error);
            }
        }
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
