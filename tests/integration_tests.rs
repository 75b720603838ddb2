use chrono::Local;
use dirplan::classifier::{
    ClusterSuggestion, JsonFileClassifier, TypeClassifier, classify_in_batches,
};
use dirplan::cli::{Command, run_command};
use dirplan::config::OrganizerConfig;
use dirplan::executor::PlanExecutor;
use dirplan::file_category::Category;
use dirplan::insights::{BatchKind, Priority, date_batch_suggestions, type_statistics};
use dirplan::plan::{FileAction, OrganizationPlan, PlanError};
use dirplan::planner::OrganizationPlanner;
use dirplan::scanner::{ContentPreview, Scanner};
/// Integration tests for dirplan
///
/// These tests run the scan -> classify -> plan -> execute pipeline against
/// real temporary directories.
///
/// Test categories:
/// 1. Scanning and filtering
/// 2. Type statistics and date batches
/// 3. Planning
/// 4. Execution and dry-run
/// 5. Classifier responses
/// 6. Text previews
/// 7. Command-line workflows
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory with helpers for building file trees.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    /// Canonical path of the test directory, matching what the scanner reports.
    fn path(&self) -> PathBuf {
        self.temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory")
    }

    /// Create a file (and any missing parent directories) with content.
    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content).expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    /// Backdate a file's modification time by `days`.
    fn age_file(&self, name: &str, days: u64) {
        let file = File::options()
            .write(true)
            .open(self.path().join(name))
            .expect("Failed to open file");
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60))
            .expect("Failed to set modification time");
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir_all(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn create_files(&self, files: &[(&str, &[u8])]) {
        for (name, content) in files {
            self.create_file(name, content);
        }
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Count directories in the test directory (non-recursive).
    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|e| e.path().is_dir())
            .count()
    }

    /// All files below the test directory, relative and sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let root = self.path();
        let mut files = Vec::new();
        Self::walk_dir(&root, &mut files);
        let mut relative: Vec<PathBuf> = files
            .into_iter()
            .map(|p| p.strip_prefix(&root).map(Path::to_path_buf).unwrap_or(p))
            .collect();
        relative.sort();
        relative
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }

    /// Scan, group by type and plan, the default pipeline.
    fn type_plan(&self) -> OrganizationPlan {
        let scanner = Scanner::default();
        let outcome = scanner.scan(&self.path());
        let clusters = TypeClassifier::clusters_for_records(&outcome.records, "");
        OrganizationPlanner::with_base_path(self.path()).create_plan(&outcome.records, &clusters)
    }
}

fn cluster(category: &str, folder: &str, files: &[&str]) -> ClusterSuggestion {
    ClusterSuggestion {
        category: category.to_string(),
        files: files.iter().map(|f| f.to_string()).collect(),
        description: String::new(),
        suggested_folder: Some(folder.to_string()),
        renames: BTreeMap::new(),
    }
}

// ============================================================================
// Test Data
// ============================================================================

/// PNG file header (minimal, just enough to be detected as PNG)
const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 image
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, // bit depth, color
    0xDE,
];

/// JPEG file header (minimal)
const JPEG_HEADER: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, // JPEG SOI and APP0 marker
    0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, // JFIF signature
    0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
];

/// PDF file header (minimal)
const PDF_HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

// ============================================================================
// Test Suite 1: Scanning and Filtering
// ============================================================================

#[test]
fn test_scan_empty_directory() {
    let fixture = TestFixture::new();

    let outcome = Scanner::default().scan(&fixture.path());

    assert!(outcome.records.is_empty());
    assert!(outcome.errors.is_empty());
}

#[test]
fn test_scan_is_recursive_and_skips_directories() {
    let fixture = TestFixture::new();
    fixture.create_text_file("top.txt", "top");
    fixture.create_text_file("a/b/deep.md", "deep");
    fixture.create_subdir("empty");

    let outcome = Scanner::default().scan(&fixture.path());
    let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(names.len(), 2);
    assert!(names.contains(&"top.txt"));
    assert!(names.contains(&"deep.md"));
    assert!(outcome.errors.is_empty());
}

#[test]
fn test_scan_records_metadata() {
    let fixture = TestFixture::new();
    fixture.create_file("Photo.JPG", JPEG_HEADER);

    let outcome = Scanner::default().scan(&fixture.path());
    let record = &outcome.records[0];

    assert_eq!(record.name, "Photo.JPG");
    assert_eq!(record.extension, ".jpg");
    assert_eq!(record.size, JPEG_HEADER.len() as u64);
    assert_eq!(record.category, Category::Image);
    assert!(record.modified.is_some());
    assert_eq!(record.path, fixture.path().join("Photo.JPG"));
}

#[test]
fn test_scan_missing_directory_reports_error() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("nope");

    let outcome = Scanner::default().scan(&missing);

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Directory does not exist"));
}

#[test]
fn test_scan_file_as_root_reports_error() {
    let fixture = TestFixture::new();
    fixture.create_text_file("file.txt", "x");

    let outcome = Scanner::default().scan(&fixture.path().join("file.txt"));

    assert!(outcome.records.is_empty());
    assert!(outcome.errors[0].starts_with("Path is not a directory"));
}

#[test]
fn test_scan_hidden_files_included_by_default() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".env", "SECRET=1");
    fixture.create_text_file("visible.txt", "x");

    let outcome = Scanner::default().scan(&fixture.path());
    assert_eq!(outcome.records.len(), 2);
}

#[test]
fn test_scan_with_config_filters() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        (".hidden.txt", b"h"),
        ("keep.txt", b"k"),
        ("drop.log", b"l"),
        ("Thumbs.db", b"t"),
        ("cache/blob.bin", b"b"),
        ("important.log", b"i"),
    ]);

    let config = OrganizerConfig::from_toml(
        r#"
        [filters]
        enable_hidden_files = false

        [filters.exclude]
        filenames = ["Thumbs.db"]
        extensions = ["log"]
        patterns = ["cache/**"]

        [filters.include]
        patterns = ["important.*"]
        "#,
    )
    .unwrap();
    let scanner = Scanner::from_config(&config).unwrap();

    let outcome = scanner.scan(&fixture.path());
    let mut names: Vec<_> = outcome.records.iter().map(|r| r.name.clone()).collect();
    names.sort();

    assert_eq!(names, vec!["important.log", "keep.txt"]);
}

#[test]
fn test_custom_categories_from_config() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.org", "* heading");

    let config = OrganizerConfig::from_toml(
        r#"
        [categories]
        document = ["org"]
        "#,
    )
    .unwrap();
    let scanner = Scanner::from_config(&config).unwrap();

    let outcome = scanner.scan(&fixture.path());
    assert_eq!(outcome.records[0].category, Category::Document);
}

// ============================================================================
// Test Suite 2: Type Statistics and Date Batches
// ============================================================================

#[test]
fn test_four_buckets_of_one() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("report.txt", b"report body"),
        ("photo.jpg", JPEG_HEADER),
        ("clip.mp4", b"0000"),
        ("notes.xyz", b"??"),
    ]);

    let outcome = Scanner::default().scan(&fixture.path());
    let stats = type_statistics(&outcome.records, 5);

    assert_eq!(stats.len(), 4);
    for category in Category::ALL {
        assert_eq!(stats[&category].count, 1, "{category} should hold one file");
    }

    let total: u64 = stats.values().map(|s| s.total_bytes).sum();
    let expected: u64 = outcome.records.iter().map(|r| r.size).sum();
    assert_eq!(total, expected);
    assert_eq!(stats[&Category::Other].top_extensions, vec![(".xyz".to_string(), 1)]);
}

#[test]
fn test_fresh_files_form_single_recent_batch() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.png", PNG_HEADER)]);

    let outcome = Scanner::default().scan(&fixture.path());
    let batches = date_batch_suggestions(&outcome.records, Local::now());

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].title, "Recent files (last 30 days)");
    assert_eq!(batches[0].priority, Priority::High);
    assert_eq!(batches[0].file_count, 3);
}

// ============================================================================
// Test Suite 3: Planning
// ============================================================================

#[test]
fn test_type_plan_groups_by_category() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("report.pdf", PDF_HEADER),
        ("image.png", PNG_HEADER),
        ("movie.mkv", b"mkv"),
        ("archive.zip", b"PK"),
    ]);

    let plan = fixture.type_plan();

    assert_eq!(plan.error, None);
    assert_eq!(
        plan.folders_to_create,
        vec!["document", "image", "other", "video"]
    );
    assert_eq!(plan.file_operations.len(), 4);
    assert!(
        plan.file_operations
            .iter()
            .all(|op| op.action == FileAction::Move)
    );
}

#[test]
fn test_no_clusters_is_reported_in_plan() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let outcome = Scanner::default().scan(&fixture.path());
    let plan = OrganizationPlanner::new().create_plan(&outcome.records, &[]);

    assert_eq!(plan.error, Some(PlanError::NoClusters));
    assert!(plan.is_empty());
}

#[test]
fn test_duplicate_names_from_subfolders_get_suffixes() {
    let fixture = TestFixture::new();
    fixture.create_file("trip/photo.jpg", JPEG_HEADER);
    fixture.create_file("party/photo.jpg", JPEG_HEADER);

    let outcome = Scanner::default().scan(&fixture.path());
    let clusters = vec![
        cluster("Trip", "Images", &["photo.jpg"]),
        cluster("Party", "Images", &["photo.jpg"]),
    ];
    let plan = OrganizationPlanner::with_base_path(fixture.path())
        .create_plan(&outcome.records, &clusters);

    let names: Vec<_> = plan
        .file_operations
        .iter()
        .map(|op| (op.new_name.as_str(), op.conflict_resolved))
        .collect();
    assert_eq!(names, vec![("photo.jpg", false), ("photo_1.jpg", true)]);
    assert_eq!(plan.conflicts_resolved(), 1);
}

// ============================================================================
// Test Suite 4: Execution and Dry-Run
// ============================================================================

#[test]
fn test_execute_type_plan() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("report.pdf", PDF_HEADER),
        ("image.png", PNG_HEADER),
        ("notes.txt", b"notes"),
    ]);

    let plan = fixture.type_plan();
    let result = PlanExecutor::new().execute(plan, &fixture.path(), false, None);

    assert!(result.success);
    assert_eq!(result.folders_created, 2);
    assert_eq!(result.operations_completed, 3);
    fixture.assert_file_exists("document/report.pdf");
    fixture.assert_file_exists("document/notes.txt");
    fixture.assert_file_exists("image/image.png");
    fixture.assert_file_not_exists("report.pdf");
    assert_eq!(fixture.count_dirs(), 2);
}

#[test]
fn test_dry_run_never_modifies_filesystem() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("report.pdf", PDF_HEADER),
        ("image.png", PNG_HEADER),
        ("nested/clip.mp4", b"mp4"),
    ]);
    let before = fixture.list_files_recursive();

    let plan = fixture.type_plan();
    let result = PlanExecutor::new().execute(plan, &fixture.path(), true, None);

    assert!(result.success);
    assert!(result.dry_run);
    assert_eq!(result.operations_completed, 3);
    assert_eq!(fixture.list_files_recursive(), before);
    assert_eq!(fixture.count_dirs(), 1);
    assert!(result.log.iter().all(|line| line.starts_with("[DRY-RUN]")));
}

#[test]
fn test_existing_folders_are_reported() {
    let fixture = TestFixture::new();
    fixture.create_subdir("document");
    fixture.create_text_file("a.txt", "a");

    let plan = fixture.type_plan();
    let result = PlanExecutor::new().execute(plan, &fixture.path(), false, None);

    assert_eq!(result.folders_created, 1);
    assert!(
        result
            .log
            .contains(&"Folder already exists: document".to_string())
    );
    fixture.assert_file_exists("document/a.txt");
}

#[test]
fn test_deleted_source_fails_one_of_five() {
    let fixture = TestFixture::new();
    for i in 1..=5 {
        fixture.create_text_file(&format!("file{i}.txt"), "content");
    }

    let plan = fixture.type_plan();
    fs::remove_file(fixture.path().join("file3.txt")).unwrap();
    let result = PlanExecutor::new().execute(plan, &fixture.path(), false, None);

    assert_eq!(result.total_operations, 5);
    assert_eq!(result.operations_completed, 4);
    assert_eq!(result.operations_failed, 1);
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("file3.txt"));
    fixture.assert_file_exists("document/file5.txt");
}

#[test]
fn test_same_name_in_two_clusters_uses_first_scanned_file() {
    let fixture = TestFixture::new();
    fixture.create_file("trip/photo.jpg", b"trip");
    fixture.create_file("party/photo.jpg", b"party");

    let outcome = Scanner::default().scan(&fixture.path());
    let clusters = vec![
        cluster("Trip", "Images", &["photo.jpg"]),
        cluster("Party", "Images", &["photo.jpg"]),
    ];
    let plan = OrganizationPlanner::with_base_path(fixture.path())
        .create_plan(&outcome.records, &clusters);
    let result = PlanExecutor::new().execute(plan, &fixture.path(), false, None);

    // Names match the first scanned record, so the second operation finds
    // its source already moved.
    assert_eq!(result.operations_completed, 1);
    assert_eq!(result.operations_failed, 1);
    fixture.assert_file_exists("Images/photo.jpg");
}

#[test]
fn test_organize_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.txt", b"a"), ("b.png", PNG_HEADER)]);

    let first = PlanExecutor::new().execute(fixture.type_plan(), &fixture.path(), false, None);
    assert!(first.success);
    let after_first = fixture.list_files_recursive();

    let second = PlanExecutor::new().execute(fixture.type_plan(), &fixture.path(), false, None);
    assert!(second.success);
    assert_eq!(fixture.list_files_recursive(), after_first);
    assert!(
        second
            .log
            .iter()
            .any(|l| l == "[SKIP] File already in correct location: a.txt")
    );
}

#[cfg(unix)]
#[test]
fn test_organize_through_symlinked_base_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("real/a.txt", b"a"), ("real/b.png", PNG_HEADER)]);
    let link = fixture.path().join("link");
    std::os::unix::fs::symlink(fixture.path().join("real"), &link).unwrap();

    let plan_through_link = || {
        let outcome = Scanner::default().scan(&link);
        let clusters = TypeClassifier::clusters_for_records(&outcome.records, "");
        OrganizationPlanner::with_base_path(&link).create_plan(&outcome.records, &clusters)
    };

    let first = PlanExecutor::new().execute(plan_through_link(), &link, false, None);
    assert!(first.success);
    fixture.assert_file_exists("real/document/a.txt");
    fixture.assert_file_exists("real/image/b.png");

    let second = PlanExecutor::new().execute(plan_through_link(), &link, false, None);
    assert!(second.success);
    assert!(second.errors.is_empty());
    let skipped = second
        .log
        .iter()
        .filter(|l| l.starts_with("[SKIP] File already in correct location"))
        .count();
    assert_eq!(skipped, 2);
}

#[test]
fn test_execution_preserves_content() {
    let fixture = TestFixture::new();
    fixture.create_text_file("letter.txt", "Dear reader,\nhello.");

    PlanExecutor::new().execute(fixture.type_plan(), &fixture.path(), false, None);

    let content = fs::read_to_string(fixture.path().join("document/letter.txt")).unwrap();
    assert_eq!(content, "Dear reader,\nhello.");
}

#[test]
fn test_progress_covers_folders_and_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.txt", b"a"), ("b.png", PNG_HEADER), ("c.png", PNG_HEADER)]);

    let plan = fixture.type_plan();
    let total = plan.total_steps();
    let mut seen = Vec::new();
    let mut on_progress = |done: usize, of: usize| seen.push((done, of));
    PlanExecutor::new().execute(plan, &fixture.path(), false, Some(&mut on_progress));

    assert_eq!(total, 5);
    assert_eq!(seen.len(), 5);
    assert_eq!(seen.last(), Some(&(5, 5)));
    assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
}

// ============================================================================
// Test Suite 5: Classifier Responses
// ============================================================================

#[test]
fn test_json_classifier_with_renames() {
    let fixture = TestFixture::new();
    let response_dir = TempDir::new().unwrap();
    fixture.create_file("scan001.pdf", PDF_HEADER);
    fixture.create_file("IMG_0001.jpg", JPEG_HEADER);
    let response = response_dir.path().join("clusters.json");
    fs::write(
        &response,
        r#"```json
{
  "clusters": [
    {
      "category": "Invoices",
      "files": ["scan001.pdf", "missing.pdf"],
      "description": "Scanned invoices",
      "suggestedFolder": "Finance/Invoices",
      "renames": {"scan001.pdf": "invoice-acme.pdf"}
    },
    {
      "category": "Holiday Photos",
      "files": ["IMG_0001.jpg"],
      "description": "Beach trip"
    }
  ]
}
```"#,
    )
    .unwrap();

    let outcome = Scanner::default().scan(&fixture.path());
    let batched = classify_in_batches(&JsonFileClassifier::new(&response), &outcome.records, 100);
    assert!(batched.fallbacks.is_empty());

    let plan = OrganizationPlanner::with_base_path(fixture.path())
        .create_plan(&outcome.records, &batched.clusters);
    assert_eq!(plan.folders_to_create, vec!["Finance_Invoices", "holiday_photos"]);

    let result = PlanExecutor::new().execute(plan, &fixture.path(), false, None);
    assert!(result.success);
    fixture.assert_file_exists("Finance_Invoices/invoice-acme.pdf");
    fixture.assert_file_exists("holiday_photos/IMG_0001.jpg");
}

#[test]
fn test_invalid_response_falls_back_to_types() {
    let fixture = TestFixture::new();
    let response_dir = TempDir::new().unwrap();
    fixture.create_text_file("a.txt", "a");
    let response = response_dir.path().join("broken.json");
    fs::write(&response, "this is not json").unwrap();

    let outcome = Scanner::default().scan(&fixture.path());
    let batched = classify_in_batches(&JsonFileClassifier::new(&response), &outcome.records, 100);

    assert_eq!(batched.fallbacks.len(), 1);
    assert_eq!(batched.clusters.len(), 1);
    assert_eq!(batched.clusters[0].folder_candidate(), "document");
}

#[test]
fn test_batches_get_prefixed_folders() {
    let fixture = TestFixture::new();
    for i in 0..5 {
        fixture.create_text_file(&format!("doc{i}.txt"), "x");
    }

    let outcome = Scanner::default().scan(&fixture.path());
    let classifier = TypeClassifier::default();
    let batched = classify_in_batches(&classifier, &outcome.records, 2);
    let plan = OrganizationPlanner::new().create_plan(&outcome.records, &batched.clusters);

    assert_eq!(
        plan.folders_to_create,
        vec!["batch1_document", "batch2_document", "batch3_document"]
    );
    assert_eq!(plan.file_operations.len(), 5);
}

// ============================================================================
// Test Suite 6: Text Previews
// ============================================================================

#[test]
fn test_preview_of_text_file() {
    let fixture = TestFixture::new();
    fixture.create_text_file("readme.md", "# Title\nBody text");

    let preview = Scanner::default().extract_text_preview(&fixture.path().join("readme.md"));
    assert_eq!(preview, ContentPreview::Text("# Title\nBody text".to_string()));
}

#[test]
fn test_preview_truncates_long_text() {
    let fixture = TestFixture::new();
    fixture.create_text_file("long.txt", &"é".repeat(5000));

    let preview = Scanner::default().extract_text_preview(&fixture.path().join("long.txt"));
    let text = preview.as_text().expect("text preview");
    assert_eq!(text.chars().count(), 2000);
    assert!(text.chars().all(|c| c == 'é'));
}

#[test]
fn test_preview_unavailable_for_binary_and_unlisted() {
    let fixture = TestFixture::new();
    fixture.create_file("image.png", PNG_HEADER);
    fixture.create_file("fake.txt", PNG_HEADER);

    let scanner = Scanner::default();
    assert_eq!(
        scanner.extract_text_preview(&fixture.path().join("image.png")),
        ContentPreview::Unavailable
    );
    assert_eq!(
        scanner.extract_text_preview(&fixture.path().join("fake.txt")),
        ContentPreview::Unavailable
    );
    assert_eq!(
        scanner.extract_text_preview(&fixture.path().join("missing.txt")),
        ContentPreview::Unavailable
    );
}

#[test]
fn test_preview_latin1_fallback() {
    let fixture = TestFixture::new();
    fixture.create_file("legacy.txt", b"caf\xE9");

    let preview = Scanner::default().extract_text_preview(&fixture.path().join("legacy.txt"));
    assert_eq!(preview.as_text(), Some("café"));
}

// ============================================================================
// Test Suite 7: Command-line Workflows
// ============================================================================

#[test]
fn test_cli_scan_succeeds() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let ok = run_command(
        &Command::Scan {
            dir: fixture.path(),
            json: true,
        },
        None,
    )
    .unwrap();
    assert!(ok);
}

#[test]
fn test_cli_scan_of_missing_directory_reports_failure() {
    let fixture = TestFixture::new();

    let ok = run_command(
        &Command::Scan {
            dir: fixture.path().join("missing"),
            json: false,
        },
        None,
    )
    .unwrap();
    assert!(!ok);
}

#[test]
fn test_cli_plan_does_not_touch_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    let before = fixture.list_files_recursive();

    run_command(
        &Command::Plan {
            dir: fixture.path(),
            clusters: None,
            batch: None,
            json: true,
        },
        None,
    )
    .unwrap();

    assert_eq!(fixture.list_files_recursive(), before);
}

#[test]
fn test_cli_apply_dry_run_then_apply() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.txt", b"a"), ("b.png", PNG_HEADER)]);

    let dry = run_command(
        &Command::Apply {
            dir: fixture.path(),
            clusters: None,
            batch: None,
            dry_run: true,
        },
        None,
    )
    .unwrap();
    assert!(dry);
    fixture.assert_file_exists("a.txt");

    let applied = run_command(
        &Command::Apply {
            dir: fixture.path(),
            clusters: None,
            batch: None,
            dry_run: false,
        },
        None,
    )
    .unwrap();
    assert!(applied);
    fixture.assert_dir_exists("document");
    fixture.assert_file_exists("image/b.png");
}

#[test]
fn test_cli_apply_only_moves_selected_batch() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("old.txt", b"o"), ("new.txt", b"n")]);
    fixture.age_file("old.txt", 120);

    let ok = run_command(
        &Command::Apply {
            dir: fixture.path(),
            clusters: None,
            batch: Some(BatchKind::Older),
            dry_run: false,
        },
        None,
    )
    .unwrap();

    assert!(ok);
    fixture.assert_file_exists("document/old.txt");
    fixture.assert_file_exists("new.txt");
    fixture.assert_file_not_exists("document/new.txt");

    let recent = run_command(
        &Command::Apply {
            dir: fixture.path(),
            clusters: None,
            batch: Some(BatchKind::Recent),
            dry_run: false,
        },
        None,
    )
    .unwrap();

    assert!(recent);
    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            PathBuf::from("document/new.txt"),
            PathBuf::from("document/old.txt")
        ]
    );
}

#[test]
fn test_cli_apply_respects_config_file() {
    let fixture = TestFixture::new();
    let config_dir = TempDir::new().unwrap();
    fixture.create_files(&[("keep.txt", b"k"), ("skip.log", b"s")]);
    let config_path = config_dir.path().join("dirplan.toml");
    fs::write(
        &config_path,
        r#"
        [filters.exclude]
        extensions = ["log"]
        "#,
    )
    .unwrap();

    run_command(
        &Command::Apply {
            dir: fixture.path(),
            clusters: None,
            batch: None,
            dry_run: false,
        },
        Some(&config_path),
    )
    .unwrap();

    fixture.assert_file_exists("document/keep.txt");
    fixture.assert_file_exists("skip.log");
}

#[test]
fn test_cli_errors_on_missing_config_or_clusters() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let missing_config = run_command(
        &Command::Scan {
            dir: fixture.path(),
            json: false,
        },
        Some(&fixture.path().join("nope.toml")),
    );
    assert!(missing_config.is_err());

    let missing_clusters = run_command(
        &Command::Plan {
            dir: fixture.path(),
            clusters: Some(fixture.path().join("nope.json")),
            batch: None,
            json: false,
        },
        None,
    );
    assert!(missing_clusters.is_err());
}

#[test]
fn test_cli_preview() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "hello");

    assert!(
        run_command(
            &Command::Preview {
                file: fixture.path().join("notes.txt"),
            },
            None,
        )
        .unwrap()
    );
    assert!(
        run_command(
            &Command::Preview {
                file: fixture.path().join("absent.txt"),
            },
            None,
        )
        .is_err()
    );
}
