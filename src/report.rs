//! Directory snapshots and the end-of-run report.

use crate::output::OutputFormatter;
use crate::planner::{REPORT_FILENAME, SNAPSHOT_AFTER, SNAPSHOT_BEFORE};
use chrono::{DateTime, Local};
use colored::*;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Snapshot stops once it grows beyond this many lines.
pub const SNAPSHOT_MAX_LINES: usize = 1000;
/// Files listed per directory in a snapshot.
pub const SNAPSHOT_MAX_FILES_PER_DIR: usize = 200;
/// Characters of each snapshot kept in the report.
pub const REPORT_SNAPSHOT_CHARS: usize = 3000;

const TRUNCATED_MARKER: &str = "  ... (snapshot truncated)";

/// Renders an ASCII tree of `root`, depth first.
///
/// Each directory is listed with its files (sorted, capped per directory)
/// followed by its subdirectories (sorted). Unreadable directories are shown
/// without children.
pub fn snapshot_tree(root: &Path) -> String {
    let mut lines = Vec::new();
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());

    let complete = walk_snapshot(root, &root_name, 0, &mut lines);
    if !complete {
        lines.push(TRUNCATED_MARKER.to_string());
    }
    lines.join("\n")
}

/// Appends `dir` and everything under it; returns false once the line cap is hit.
fn walk_snapshot(dir: &Path, display: &str, depth: usize, lines: &mut Vec<String>) -> bool {
    let indent = "  ".repeat(depth);
    lines.push(format!("{}{}/", indent, display));

    let (mut files, mut subdirs) = (Vec::new(), Vec::new());
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                match entry.file_type() {
                    Ok(kind) if kind.is_dir() => subdirs.push((name, entry.path())),
                    Ok(_) => files.push(name),
                    Err(_) => continue,
                }
            }
        }
        Err(e) => log::debug!("snapshot cannot read {}: {}", dir.display(), e),
    }
    files.sort();
    subdirs.sort();

    for name in files.iter().take(SNAPSHOT_MAX_FILES_PER_DIR) {
        lines.push(format!("{}  └─ {}", indent, name));
    }
    if files.len() > SNAPSHOT_MAX_FILES_PER_DIR {
        lines.push(format!(
            "{}  └─ ... ({} more files)",
            indent,
            files.len() - SNAPSHOT_MAX_FILES_PER_DIR
        ));
    }

    if lines.len() > SNAPSHOT_MAX_LINES {
        return false;
    }

    for (name, path) in &subdirs {
        if !walk_snapshot(path, name, depth + 1, lines) {
            return false;
        }
    }
    true
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Counters and snapshots describing one run.
#[derive(Debug, Clone)]
pub struct Report {
    pub root: PathBuf,
    pub started_at: DateTime<Local>,
    pub dry_run: bool,
    /// Files moved (or, in preview, that would be moved).
    pub moved: usize,
    /// Files whose final name differs from the original.
    pub renamed: usize,
    /// Files stored in the archive bundle.
    pub archived: usize,
    /// Bundles written (0 or 1).
    pub archives_made: usize,
    /// Files already at their destination.
    pub already_organized: usize,
    /// Per-file failures (moves and post-archive deletes).
    pub failures: Vec<(PathBuf, String)>,
    /// Moved files per category name.
    pub category_counts: BTreeMap<String, usize>,
    /// Path of the bundle, if one was written.
    pub bundle_path: Option<PathBuf>,
    pub before_snapshot: String,
    /// Omitted in preview mode.
    pub after_snapshot: Option<String>,
}

impl Report {
    pub fn new(root: &Path, started_at: DateTime<Local>, dry_run: bool, before_snapshot: String) -> Self {
        Self {
            root: root.to_path_buf(),
            started_at,
            dry_run,
            moved: 0,
            renamed: 0,
            archived: 0,
            archives_made: 0,
            already_organized: 0,
            failures: Vec::new(),
            category_counts: BTreeMap::new(),
            bundle_path: None,
            before_snapshot,
            after_snapshot: None,
        }
    }

    /// Plain-text report body as persisted to `shadow_report.txt`.
    pub fn render(&self) -> String {
        let rule = "-".repeat(40);
        let mut lines = vec![
            "shadowtidy report".to_string(),
            format!("Path: {}", self.root.display()),
            format!("Time: {}", self.started_at.to_rfc3339()),
            format!("Dry run: {}", self.dry_run),
            format!("Files touched (moved): {}", self.moved),
            format!("Files renamed: {}", self.renamed),
            format!("Files archived: {}", self.archived),
            format!("Archives made: {}", self.archives_made),
            format!("Already organized: {}", self.already_organized),
            format!("Failures: {}", self.failures.len()),
        ];

        if let Some(bundle) = &self.bundle_path {
            lines.push(format!("Archive: {}", self.relative(bundle).display()));
        }
        for (path, reason) in &self.failures {
            lines.push(format!("  ! {}: {}", self.relative(path).display(), reason));
        }

        lines.push(String::new());
        lines.push("Before snapshot:".to_string());
        lines.push(rule.clone());
        lines.push(truncate_chars(&self.before_snapshot, REPORT_SNAPSHOT_CHARS).to_string());

        if let Some(after) = &self.after_snapshot {
            lines.push(String::new());
            lines.push("After snapshot:".to_string());
            lines.push(rule);
            lines.push(truncate_chars(after, REPORT_SNAPSHOT_CHARS).to_string());
        }

        lines.join("\n")
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Prints the console summary.
    pub fn print(&self, output: &OutputFormatter) {
        let rule = "=".repeat(36);
        if self.dry_run {
            println!("\n{}", rule.dimmed());
            println!("{}", "Report (dry run)".magenta().dimmed());
        } else {
            println!("\n{}", rule.magenta());
            println!("{}", "Report".magenta().bold());
        }
        println!("{}", rule.magenta());
        output.info(&format!(
            "Files moved: {}  |  Renamed: {}  |  Archived: {}  |  Archives: {}",
            self.moved, self.renamed, self.archived, self.archives_made
        ));

        if !self.category_counts.is_empty() {
            output.summary_table(&self.category_counts, self.moved);
        }

        if self.already_organized > 0 {
            output.plain(&format!(
                "{} already in place, left untouched.",
                self.already_organized
            ));
        }

        if !self.failures.is_empty() {
            output.warning(&format!(
                "{} file operation(s) failed and were skipped:",
                self.failures.len()
            ));
            for (path, reason) in &self.failures {
                output.error(&format!("{}: {}", self.relative(path).display(), reason));
            }
        }
    }

    /// Writes the report to `shadow_report.txt` inside the root.
    pub fn save(&self) -> io::Result<PathBuf> {
        let path = self.root.join(REPORT_FILENAME);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}

/// Writes a snapshot file (`shadow_before.txt` or `shadow_after.txt`).
pub fn save_snapshot(root: &Path, which: SnapshotKind, snapshot: &str) -> io::Result<PathBuf> {
    let path = root.join(which.file_name());
    fs::write(&path, snapshot)?;
    Ok(path)
}

/// Which of the two snapshots is being persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Before,
    After,
}

impl SnapshotKind {
    pub fn file_name(self) -> &'static str {
        match self {
            SnapshotKind::Before => SNAPSHOT_BEFORE,
            SnapshotKind::After => SNAPSHOT_AFTER,
        }
    }
}
