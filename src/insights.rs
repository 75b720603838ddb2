//! Summaries computed over scanned records: grouping by category, per-category
//! statistics and recency-based batch suggestions.

use crate::file_category::Category;
use crate::scanner::FileRecord;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

/// Files modified at most this many days ago are "recent".
pub const RECENT_WINDOW_DAYS: i64 = 30;
/// A recent batch with this many files or more drops to medium priority.
pub const RECENT_HIGH_PRIORITY_LIMIT: usize = 100;
/// An older batch above this size is flagged as a large collection.
pub const LARGE_COLLECTION_THRESHOLD: usize = 200;

/// Partitions records into the four category buckets.
///
/// All four keys are always present.
pub fn group_by_type(records: &[FileRecord]) -> BTreeMap<Category, Vec<FileRecord>> {
    let mut grouped: BTreeMap<Category, Vec<FileRecord>> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();

    for record in records {
        grouped.entry(record.category).or_default().push(record.clone());
    }

    grouped
}

/// Aggregate numbers for one category.
#[derive(Debug, Clone, Serialize)]
pub struct TypeStats {
    pub count: usize,
    pub total_bytes: u64,
    /// Up to three `(extension, count)` pairs, most frequent first.
    pub top_extensions: Vec<(String, usize)>,
    pub samples: Vec<FileRecord>,
}

impl TypeStats {
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Per-category statistics for every non-empty category.
///
/// Extension ties are broken by first-seen order; files without an extension
/// are reported as `"no extension"`. `sample_size` bounds the sample records.
pub fn type_statistics(
    records: &[FileRecord],
    sample_size: usize,
) -> BTreeMap<Category, TypeStats> {
    let mut stats = BTreeMap::new();

    for (category, bucket) in group_by_type(records) {
        if bucket.is_empty() {
            continue;
        }

        let mut extension_counts: Vec<(String, usize)> = Vec::new();
        for record in &bucket {
            let ext = if record.extension.is_empty() {
                "no extension"
            } else {
                record.extension.as_str()
            };
            match extension_counts.iter_mut().find(|(e, _)| e == ext) {
                Some((_, count)) => *count += 1,
                None => extension_counts.push((ext.to_string(), 1)),
            }
        }
        // Stable sort keeps first-seen order among equal counts.
        extension_counts.sort_by(|a, b| b.1.cmp(&a.1));
        extension_counts.truncate(3);

        stats.insert(
            category,
            TypeStats {
                count: bucket.len(),
                total_bytes: bucket.iter().map(|r| r.size).sum(),
                top_extensions: extension_counts,
                samples: bucket.iter().take(sample_size).cloned().collect(),
            },
        );
    }

    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(label)
    }
}

/// Which recency view a batch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BatchKind {
    /// Modified within the last 30 days
    Recent,
    /// Modified in the current calendar month
    ThisMonth,
    /// Modified in the previous calendar month
    LastMonth,
    /// Everything else, including files without a modification time
    Older,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BatchKind::Recent => "recent",
            BatchKind::ThisMonth => "this-month",
            BatchKind::LastMonth => "last-month",
            BatchKind::Older => "older",
        };
        f.write_str(label)
    }
}

/// A suggested subset of files to process together.
#[derive(Debug, Clone, Serialize)]
pub struct DateBatch {
    pub kind: BatchKind,
    pub title: String,
    pub description: String,
    pub file_count: usize,
    pub files: Vec<FileRecord>,
    pub priority: Priority,
}

impl DateBatch {
    fn new(
        kind: BatchKind,
        title: String,
        description: String,
        files: Vec<FileRecord>,
        priority: Priority,
    ) -> Self {
        Self {
            kind,
            title,
            description,
            file_count: files.len(),
            files,
            priority,
        }
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

fn same_members(a: &[FileRecord], b: &[FileRecord]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let paths: HashSet<&Path> = a.iter().map(|r| r.path.as_path()).collect();
    b.iter().all(|r| paths.contains(r.path.as_path()))
}

/// Records split into the four recency views. "Recent" overlaps the
/// calendar months; "older" holds what no other view claims.
struct DatePartition {
    recent: Vec<FileRecord>,
    this_month: Vec<FileRecord>,
    last_month: Vec<FileRecord>,
    older: Vec<FileRecord>,
}

impl DatePartition {
    fn new(records: &[FileRecord], now: DateTime<Local>) -> Self {
        let this_month = (now.year(), now.month());
        let last_month = previous_month(now.year(), now.month());
        let mut partition = DatePartition {
            recent: Vec::new(),
            this_month: Vec::new(),
            last_month: Vec::new(),
            older: Vec::new(),
        };

        for record in records {
            let Some(modified) = record.modified else {
                partition.older.push(record.clone());
                continue;
            };

            let is_recent = (now - modified).num_days() <= RECENT_WINDOW_DAYS;
            if is_recent {
                partition.recent.push(record.clone());
            }

            let month = (modified.year(), modified.month());
            if month == this_month {
                partition.this_month.push(record.clone());
            } else if month == last_month {
                partition.last_month.push(record.clone());
            } else if !is_recent {
                partition.older.push(record.clone());
            }
        }
        partition
    }

    fn take(self, kind: BatchKind) -> Vec<FileRecord> {
        match kind {
            BatchKind::Recent => self.recent,
            BatchKind::ThisMonth => self.this_month,
            BatchKind::LastMonth => self.last_month,
            BatchKind::Older => self.older,
        }
    }
}

/// The records belonging to one recency view, in input order.
///
/// Unlike [`date_batch_suggestions`], this never drops a view, so selecting
/// "this month" works even when it matches the recent files exactly.
pub fn select_date_batch(
    records: &[FileRecord],
    kind: BatchKind,
    now: DateTime<Local>,
) -> Vec<FileRecord> {
    DatePartition::new(records, now).take(kind)
}

/// Suggests recency-based batches relative to `now`.
///
/// "Recent" is a rolling window and overlaps the calendar-aligned "this
/// month"; "last month" wraps across the year boundary. Records without a
/// modification time land in "older". Empty batches are dropped, as is "this
/// month" when it holds exactly the recent files. The result is ordered by
/// priority, then by descending file count.
pub fn date_batch_suggestions(records: &[FileRecord], now: DateTime<Local>) -> Vec<DateBatch> {
    let this_month = (now.year(), now.month());
    let last_month = previous_month(now.year(), now.month());
    let DatePartition {
        recent,
        this_month: current,
        last_month: previous,
        older,
    } = DatePartition::new(records, now);

    let mut batches = Vec::new();

    if !recent.is_empty() {
        let priority = if recent.len() < RECENT_HIGH_PRIORITY_LIMIT {
            Priority::High
        } else {
            Priority::Medium
        };
        batches.push(DateBatch::new(
            BatchKind::Recent,
            format!("Recent files (last {RECENT_WINDOW_DAYS} days)"),
            format!("{} files to organize", recent.len()),
            recent.clone(),
            priority,
        ));
    }

    if !current.is_empty() && !same_members(&current, &recent) {
        batches.push(DateBatch::new(
            BatchKind::ThisMonth,
            format!("This month ({})", month_label(this_month.0, this_month.1)),
            format!("{} files from current month", current.len()),
            current,
            Priority::Medium,
        ));
    }

    if !previous.is_empty() {
        batches.push(DateBatch::new(
            BatchKind::LastMonth,
            format!("Last month ({})", month_label(last_month.0, last_month.1)),
            format!("{} files from previous month", previous.len()),
            previous,
            Priority::Medium,
        ));
    }

    if older.len() > LARGE_COLLECTION_THRESHOLD {
        batches.push(DateBatch::new(
            BatchKind::Older,
            "Older files (large collection)".to_string(),
            format!(
                "{} files - large collection, process in smaller batches",
                older.len()
            ),
            older,
            Priority::Low,
        ));
    } else if !older.is_empty() {
        batches.push(DateBatch::new(
            BatchKind::Older,
            "Older files".to_string(),
            format!("{} files older than {RECENT_WINDOW_DAYS} days", older.len()),
            older,
            Priority::Low,
        ));
    }

    batches.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.file_count.cmp(&a.file_count))
    });
    batches
}
