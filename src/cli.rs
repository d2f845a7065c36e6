//! Command-line interface module for shadowtidy.
//!
//! This module handles:
//! - Argument parsing (clap)
//! - The safety interlock and confirmation prompt
//! - Orchestrating a run: snapshot, plan, move, archive, report

use crate::archiver::{ArchiveError, Archiver};
use crate::config::{ConfigError, ShadowConfig};
use crate::file_organizer::Mover;
use crate::naming;
use crate::output::{BannerStyle, OutputFormatter};
use crate::planner::{ARCHIVE_DIR_NAME, Planner};
use crate::report::{self, Report, SnapshotKind};
use crate::safety::{self, SafetyError};
use chrono::Local;
use clap::{Parser, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Organize a folder into Category/Year/Month, rename by pattern and archive stale files.
#[derive(Debug, Parser)]
#[command(name = "shadowtidy", version, about)]
pub struct Cli {
    /// Folder to tidy.
    pub path: PathBuf,

    /// Optional presentation mode.
    #[arg(value_enum)]
    pub mode: Option<Mode>,

    /// Show what would be done without changing anything.
    #[arg(long, visible_alias = "preview")]
    pub dry_run: bool,

    /// Archive files at least N days old (0 disables archiving).
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub archive_days: Option<i64>,

    /// Rename pattern, e.g. '{name}_{ts}.{ext}' or 'ProjectA_{ts}.{ext}'.
    #[arg(long, value_name = "TEMPLATE")]
    pub pattern: Option<String>,

    /// Print rule-based folder suggestions.
    #[arg(long, visible_alias = "suggest")]
    pub ai: bool,

    /// Configuration file (defaults to .shadowtidyrc.toml or the user config).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Positional presentation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Magical banner text; behaves exactly like a normal run.
    Cast,
}

/// Fatal errors that stop a run before anything is changed.
#[derive(Debug, Error)]
pub enum RunError {
    /// The target failed the safety checks.
    #[error(transparent)]
    Unsafe(#[from] SafetyError),
    /// The configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The user did not confirm the run.
    #[error("Aborted by user.")]
    Declined,
    /// The confirmation prompt could not be read.
    #[error("Could not read confirmation: {0}")]
    Prompt(#[source] io::Error),
}

/// Fully resolved options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub archive_days: i64,
    pub pattern: Option<String>,
    pub suggestions: bool,
    pub banner: BannerStyle,
}

impl RunOptions {
    /// Merges command-line values over configuration values.
    pub fn resolve(cli: &Cli, config: &ShadowConfig) -> Self {
        Self {
            dry_run: cli.dry_run,
            archive_days: cli.archive_days.unwrap_or(config.organize.archive_days),
            pattern: cli
                .pattern
                .clone()
                .or_else(|| config.organize.pattern.clone()),
            suggestions: cli.ai,
            banner: match cli.mode {
                Some(Mode::Cast) => BannerStyle::Cast,
                None => BannerStyle::Standard,
            },
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            archive_days: crate::config::DEFAULT_ARCHIVE_DAYS,
            pattern: None,
            suggestions: false,
            banner: BannerStyle::Standard,
        }
    }
}

/// Entry point used by `main`: checks, confirms, then runs.
///
/// `confirm` is called with the canonical target before a mutating run and
/// must return `Ok(true)` for the run to proceed.
pub fn run_cli<F>(cli: &Cli, confirm: F) -> Result<Report, RunError>
where
    F: FnOnce(&Path) -> io::Result<bool>,
{
    let root = safety::check_target(&cli.path, safety::home_dir().as_deref())?;

    let config = ShadowConfig::load(cli.config.as_deref())?;
    let options = RunOptions::resolve(cli, &config);

    if !options.dry_run {
        let confirmed = confirm(&root).map_err(RunError::Prompt)?;
        if !confirmed {
            return Err(RunError::Declined);
        }
    }

    run_with_options(&root, &options, &config)
}

/// Runs the organize pipeline on an already validated directory.
///
/// Per-file problems are reported in the returned [`Report`]; only
/// configuration and path problems are errors.
///
/// # Examples
///
/// ```no_run
/// use shadowtidy::cli::{RunOptions, run_with_options};
/// use shadowtidy::config::ShadowConfig;
/// use std::path::Path;
///
/// let options = RunOptions { dry_run: true, ..Default::default() };
/// let report = run_with_options(Path::new("/data/inbox"), &options, &ShadowConfig::default());
/// match report {
///     Ok(report) => println!("{} files would move", report.moved),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_with_options(
    root: &Path,
    options: &RunOptions,
    config: &ShadowConfig,
) -> Result<Report, RunError> {
    if !root.exists() {
        return Err(SafetyError::NotFound(root.to_path_buf()).into());
    }
    if !root.is_dir() {
        return Err(SafetyError::NotADirectory(root.to_path_buf()).into());
    }

    let mapper = config.file_mapper()?;
    let filters = config.compile_filters()?;
    let output = OutputFormatter::new(options.banner);

    let started_at = Local::now();
    let timestamp = naming::format_timestamp(&started_at);

    let before_snapshot = report::snapshot_tree(root);
    if !options.dry_run
        && let Err(e) = report::save_snapshot(root, SnapshotKind::Before, &before_snapshot)
    {
        log::warn!("could not save before snapshot: {}", e);
        output.warning(&format!("Could not save snapshot: {}", e));
    }

    output.banner();
    if options.dry_run {
        output.dry_run_notice(&format!("Analyzing contents of: {}", root.display()));
    } else {
        output.info(&format!("Organizing contents of: {}", root.display()));
    }

    let planner = Planner::new(
        root,
        &mapper,
        &filters,
        options.archive_days,
        SystemTime::now(),
    );
    let plan = planner.scan();
    log::info!(
        "scan found {} files, {} to move",
        plan.len(),
        plan.pending_count()
    );

    let mut report = Report::new(root, started_at, options.dry_run, before_snapshot);
    report.already_organized = plan.organized_count();

    if plan.pending_count() == 0 {
        output.plain("Nothing to move: every file is already in place.");
    }

    let mover = Mover::new(
        root,
        options.pattern.as_deref(),
        &timestamp,
        options.dry_run,
        &output,
    );
    let outcome = mover.execute(&plan);

    report.moved = outcome.moved;
    report.renamed = outcome.renamed;
    report.category_counts = outcome.category_counts;
    report.failures = outcome.failures;

    if options.archive_days > 0 && !outcome.archive_candidates.is_empty() {
        let year = started_at.format("%Y").to_string();
        let candidates = outcome.archive_candidates;

        if options.dry_run {
            output.dry_run_notice(&format!(
                "Would create archive with {} files in {}",
                candidates.len(),
                Path::new(ARCHIVE_DIR_NAME).join(&year).display()
            ));
            report.archived = candidates.len();
        } else {
            let archiver = Archiver::new(root, year, timestamp.as_str());
            archive_candidates(&archiver, &candidates, &mut report, &output);
        }
    }

    if !options.dry_run {
        let after_snapshot = report::snapshot_tree(root);
        if let Err(e) = report::save_snapshot(root, SnapshotKind::After, &after_snapshot) {
            log::warn!("could not save after snapshot: {}", e);
            output.warning(&format!("Could not save snapshot: {}", e));
        }
        report.after_snapshot = Some(after_snapshot);
    }

    report.print(&output);
    if options.suggestions {
        output.suggestions();
    }

    if options.dry_run {
        output.dry_run_notice("No files were modified.");
    } else {
        match report.save() {
            Ok(path) => output.archive(&format!("Saved report: {}", path.display())),
            Err(e) => {
                log::warn!("could not save report: {}", e);
                output.warning(&format!("Could not save report: {}", e));
            }
        }
    }

    output.success(output.farewell());
    Ok(report)
}

fn archive_candidates(
    archiver: &Archiver<'_>,
    candidates: &[PathBuf],
    report: &mut Report,
    output: &OutputFormatter,
) {
    match archiver.archive(candidates) {
        Ok(Some(archived)) => {
            output.archive(&format!(
                "Archive created: {} ({} files)",
                archived
                    .bundle_path
                    .strip_prefix(&report.root)
                    .unwrap_or(&archived.bundle_path)
                    .display(),
                archived.archived.len()
            ));
            log::info!(
                "removed {} of {} archived originals",
                archived.removed_count(),
                archived.archived.len()
            );
            report.archived = archived.archived.len();
            report.archives_made = 1;
            report.bundle_path = Some(archived.bundle_path);
            report.failures.extend(
                archived
                    .failed_deletes
                    .into_iter()
                    .map(|(path, reason)| (path, format!("archived but not deleted: {}", reason))),
            );
        }
        Ok(None) => {}
        Err(e) => report_archive_failure(e, output),
    }
}

fn report_archive_failure(error: ArchiveError, output: &OutputFormatter) {
    log::warn!("{}", error);
    output.warning(&format!(
        "Archive not created, originals kept in place: {}",
        error
    ));
}
