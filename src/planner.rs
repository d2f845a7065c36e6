//! Scanning and destination planning.
//!
//! Walks the target directory once, classifies every eligible file and
//! computes where it belongs: `<root>/<Category>/<YYYY>/<Month>`. Nothing
//! on disk is touched here.

use crate::config::CompiledFilters;
use crate::file_category::{Category, FileMapper};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Directory (inside the target) holding archive bundles.
pub const ARCHIVE_DIR_NAME: &str = "ShadowArchives";
/// Report file written inside the target.
pub const REPORT_FILENAME: &str = "shadow_report.txt";
/// Snapshot taken before any change.
pub const SNAPSHOT_BEFORE: &str = "shadow_before.txt";
/// Snapshot taken after all changes.
pub const SNAPSHOT_AFTER: &str = "shadow_after.txt";

/// Path components owned by the tool itself, never planned for a move.
pub const RESERVED_NAMES: [&str; 5] = [
    ARCHIVE_DIR_NAME,
    ".git",
    SNAPSHOT_BEFORE,
    SNAPSHOT_AFTER,
    REPORT_FILENAME,
];

/// Returns true if `path` lies in one of the tool's own output areas.
///
/// Only the components below `root` are inspected, so a target that itself
/// lives under e.g. a `.git` directory is still organized normally.
///
/// # Examples
///
/// ```
/// use shadowtidy::planner::is_reserved;
/// use std::path::Path;
///
/// let root = Path::new("/data/inbox");
/// assert!(is_reserved(root, Path::new("/data/inbox/ShadowArchives/2025/a.zip")));
/// assert!(is_reserved(root, Path::new("/data/inbox/shadow_report.txt")));
/// assert!(!is_reserved(root, Path::new("/data/inbox/notes/shadow_reports.txt")));
/// ```
pub fn is_reserved(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| RESERVED_NAMES.contains(&name)),
        _ => false,
    })
}

/// Lowercase extension of `path` without the dot; empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Whole days elapsed between `modified` and `now` (never negative).
pub fn age_in_days(modified: SystemTime, now: SystemTime) -> i64 {
    match now.duration_since(modified) {
        Ok(elapsed) => (elapsed.as_secs() / 86_400) as i64,
        Err(_) => 0,
    }
}

/// Computes `<root>/<Category>/<YYYY>/<Month>` from the modification time.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use shadowtidy::file_category::Category;
/// use shadowtidy::planner::destination_dir;
/// use std::path::Path;
///
/// let modified = Local.with_ymd_and_hms(2023, 7, 14, 12, 0, 0).unwrap();
/// let dest = destination_dir(Path::new("/data"), Category::Pictures, &modified);
/// assert_eq!(dest, Path::new("/data/Pictures/2023/July"));
/// ```
pub fn destination_dir(root: &Path, category: Category, modified: &DateTime<Local>) -> PathBuf {
    root.join(category.dir_name())
        .join(modified.format("%Y").to_string())
        .join(modified.format("%B").to_string())
}

/// A file found during the scan, with everything decided about it.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute source path.
    pub source: PathBuf,
    /// Lowercase extension without the dot.
    pub extension: String,
    /// Last modification time.
    pub modified: SystemTime,
    /// Category from the extension table.
    pub category: Category,
    /// Directory the file belongs in.
    pub dest_dir: PathBuf,
    /// Age in whole days at scan time.
    pub age_days: i64,
    /// Whether the file is old enough to be archived this run.
    pub archive_eligible: bool,
    /// Whether the file already sits at (or below) its destination.
    pub already_organized: bool,
}

impl FileRecord {
    /// The source file name, lossily converted for display.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Inputs shared by every planning decision in a run.
pub struct Planner<'a> {
    root: &'a Path,
    mapper: &'a FileMapper,
    filters: &'a CompiledFilters,
    archive_days: i64,
    now: SystemTime,
}

impl<'a> Planner<'a> {
    pub fn new(
        root: &'a Path,
        mapper: &'a FileMapper,
        filters: &'a CompiledFilters,
        archive_days: i64,
        now: SystemTime,
    ) -> Self {
        Self {
            root,
            mapper,
            filters,
            archive_days,
            now,
        }
    }

    /// Builds the record for one file.
    pub fn plan_file(&self, source: &Path, modified: SystemTime) -> FileRecord {
        let extension = extension_of(source);
        let category = self.mapper.categorize(&extension);
        let local: DateTime<Local> = modified.into();
        let dest_dir = destination_dir(self.root, category, &local);
        let age_days = age_in_days(modified, self.now);
        let already_organized = source.parent().is_some_and(|parent| parent.starts_with(&dest_dir));

        FileRecord {
            source: source.to_path_buf(),
            extension,
            modified,
            category,
            dest_dir,
            age_days,
            archive_eligible: self.archive_days > 0 && age_days >= self.archive_days,
            already_organized,
        }
    }

    /// Whether a path found by the walk should be planned at all.
    fn is_candidate(&self, path: &Path) -> bool {
        if is_reserved(self.root, path) {
            return false;
        }
        let relative = path.strip_prefix(self.root).unwrap_or(path);
        self.filters.should_include(relative)
    }

    /// Walks the root and plans every candidate file.
    ///
    /// Entries that cannot be read are logged and skipped.
    pub fn scan(&self) -> MovePlan {
        let mut plan = MovePlan::default();

        let walker = WalkDir::new(self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_reserved(self.root, entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_candidate(entry.path()) {
                continue;
            }

            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => modified,
                Ok(Err(e)) => {
                    log::warn!("no modification time for {}: {}", entry.path().display(), e);
                    continue;
                }
                Err(e) => {
                    log::warn!("cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let record = self.plan_file(entry.path(), modified);
            log::debug!(
                "planned {} -> {} (age {} days{})",
                record.source.display(),
                record.dest_dir.display(),
                record.age_days,
                if record.already_organized {
                    ", already organized"
                } else {
                    ""
                }
            );
            plan.insert(record);
        }

        plan
    }
}

/// Every file found in one run, keyed by source path.
#[derive(Debug, Default)]
pub struct MovePlan {
    records: BTreeMap<PathBuf, FileRecord>,
}

impl MovePlan {
    /// Adds a record; a source path already present is replaced.
    pub fn insert(&mut self, record: FileRecord) {
        self.records.insert(record.source.clone(), record);
    }

    /// All records in source-path order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Records that still need to be moved.
    pub fn pending(&self) -> impl Iterator<Item = &FileRecord> {
        self.records().filter(|record| !record.already_organized)
    }

    /// Number of records that still need to be moved.
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Number of records already at their destination.
    pub fn organized_count(&self) -> usize {
        self.records.len() - self.pending_count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const DAY: u64 = 86_400;

    fn planner_for<'a>(
        root: &'a Path,
        mapper: &'a FileMapper,
        filters: &'a CompiledFilters,
        archive_days: i64,
    ) -> Planner<'a> {
        Planner::new(root, mapper, filters, archive_days, SystemTime::now())
    }

    #[test]
    fn test_reserved_names() {
        let root = Path::new("/target");
        assert!(is_reserved(root, Path::new("/target/.git/config")));
        assert!(is_reserved(root, Path::new("/target/shadow_before.txt")));
        assert!(is_reserved(root, Path::new("/target/shadow_after.txt")));
        assert!(is_reserved(root, Path::new("/target/ShadowArchives")));
        assert!(!is_reserved(root, Path::new("/target/ShadowArchives2/a.txt")));
        assert!(!is_reserved(root, Path::new("/target/docs/report.txt")));
    }

    #[test]
    fn test_reserved_ignores_components_above_root() {
        let root = Path::new("/home/me/.git/inbox");
        assert!(!is_reserved(root, Path::new("/home/me/.git/inbox/a.txt")));
    }

    #[test]
    fn test_age_in_days() {
        let now = SystemTime::now();
        assert_eq!(age_in_days(now, now), 0);
        assert_eq!(age_in_days(now - Duration::from_secs(DAY - 1), now), 0);
        assert_eq!(age_in_days(now - Duration::from_secs(400 * DAY), now), 400);
        assert_eq!(age_in_days(now + Duration::from_secs(DAY), now), 0);
    }

    #[test]
    fn test_destination_uses_modification_time() {
        let root = Path::new("/data");
        let modified = Local.with_ymd_and_hms(2021, 12, 3, 8, 30, 0).unwrap();
        assert_eq!(
            destination_dir(root, Category::Documents, &modified),
            Path::new("/data/Documents/2021/December")
        );
    }

    #[test]
    fn test_plan_file_marks_archive_eligibility() {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let root = Path::new("/data");
        let now = SystemTime::now();
        let planner = Planner::new(root, &mapper, &filters, 365, now);

        let fresh = planner.plan_file(Path::new("/data/photo.JPG"), now);
        assert_eq!(fresh.category, Category::Pictures);
        assert_eq!(fresh.extension, "jpg");
        assert!(!fresh.archive_eligible);

        let stale = planner.plan_file(
            Path::new("/data/notes.txt"),
            now - Duration::from_secs(365 * DAY),
        );
        assert_eq!(stale.age_days, 365);
        assert!(stale.archive_eligible);
    }

    #[test]
    fn test_zero_threshold_disables_archiving() {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let now = SystemTime::now();
        let old = now - Duration::from_secs(5000 * DAY);

        for threshold in [0, -3] {
            let planner = Planner::new(Path::new("/data"), &mapper, &filters, threshold, now);
            assert!(!planner.plan_file(Path::new("/data/a.txt"), old).archive_eligible);
        }
    }

    #[test]
    fn test_plan_file_detects_already_organized() {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let root = Path::new("/data");
        let planner = planner_for(root, &mapper, &filters, 0);

        let modified = SystemTime::now();
        let local: DateTime<Local> = modified.into();
        let dest = destination_dir(root, Category::Music, &local);

        let in_place = planner.plan_file(&dest.join("song.mp3"), modified);
        assert!(in_place.already_organized);

        let loose = planner.plan_file(Path::new("/data/song.mp3"), modified);
        assert!(!loose.already_organized);
    }

    #[test]
    fn test_scan_skips_reserved_and_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("photo.jpg"), "img").expect("Failed to write file");
        fs::write(root.join(REPORT_FILENAME), "old report").expect("Failed to write file");
        fs::create_dir_all(root.join(ARCHIVE_DIR_NAME).join("2024")).expect("Failed to mkdir");
        fs::write(root.join(ARCHIVE_DIR_NAME).join("2024").join("a.zip"), "zip")
            .expect("Failed to write file");
        fs::create_dir(root.join("nested")).expect("Failed to mkdir");
        fs::write(root.join("nested").join("song.mp3"), "mp3").expect("Failed to write file");

        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let plan = planner_for(root, &mapper, &filters, 0).scan();

        let names: Vec<String> = plan.records().map(|r| r.file_name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"photo.jpg".to_string()));
        assert!(names.contains(&"song.mp3".to_string()));
        assert_eq!(plan.pending_count(), 2);
    }

    #[test]
    fn test_scan_applies_filters() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("keep.txt"), "a").expect("Failed to write file");
        fs::write(root.join("scratch.tmp"), "b").expect("Failed to write file");

        let config = crate::config::ShadowConfig::parse(
            r#"
            [filters.exclude]
            extensions = ["tmp"]
            "#,
        )
        .expect("config should parse");
        let filters = config.compile_filters().expect("filters should compile");
        let mapper = FileMapper::default();

        let plan = planner_for(root, &mapper, &filters, 0).scan();
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan.records().next().map(|r| r.file_name()),
            Some("keep.txt".to_string())
        );
    }
}
