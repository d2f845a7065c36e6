/// File relocation: moving planned files into their category/year/month folders.
///
/// A failure on one file is recorded and the loop carries on with the rest;
/// there is no rollback of moves that already happened.
use crate::naming;
use crate::output::OutputFormatter;
use crate::planner::{FileRecord, MovePlan};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while moving a single file.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {error}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        error: io::Error,
    },
    /// The source path has no file name component.
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Low-level file moves.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves `source` into `dest_dir` under `file_name`, creating the directory.
    ///
    /// A plain rename is tried first; if source and destination are on
    /// different filesystems the file is copied (keeping its modification
    /// time) and the source removed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use shadowtidy::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let moved = FileOrganizer::move_file(
    ///     Path::new("/data/photo.jpg"),
    ///     Path::new("/data/Pictures/2025/March"),
    ///     "photo.jpg".as_ref(),
    /// );
    /// match moved {
    ///     Ok(path) => println!("Moved to {}", path.display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn move_file(source: &Path, dest_dir: &Path, file_name: &OsStr) -> OrganizeResult<PathBuf> {
        fs::create_dir_all(dest_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let destination = dest_dir.join(file_name);
        let move_failure = |e: io::Error| OrganizeError::FileMoveFailure {
            from: source.to_path_buf(),
            to: destination.clone(),
            error: e,
        };

        match fs::rename(source, &destination) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                log::debug!(
                    "rename across devices, copying {} instead",
                    source.display()
                );
                Self::copy_then_remove(source, &destination).map_err(move_failure)?;
            }
            Err(e) => return Err(move_failure(e)),
        }

        Ok(destination)
    }

    fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
        let modified = fs::metadata(source)?.modified()?;
        fs::copy(source, destination)?;
        fs::File::options()
            .write(true)
            .open(destination)?
            .set_modified(modified)?;
        fs::remove_file(source)
    }
}

/// What the move loop did (or, in preview, would do).
#[derive(Debug, Default)]
pub struct MoveOutcome {
    /// Files moved.
    pub moved: usize,
    /// Moved files whose name changed.
    pub renamed: usize,
    /// Moved files per category name.
    pub category_counts: BTreeMap<String, usize>,
    /// Files that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// New locations of moved files that are old enough to archive.
    pub archive_candidates: Vec<PathBuf>,
}

/// Drives the per-file loop over a [`MovePlan`].
pub struct Mover<'a> {
    root: &'a Path,
    pattern: Option<&'a str>,
    timestamp: &'a str,
    dry_run: bool,
    output: &'a OutputFormatter,
}

impl<'a> Mover<'a> {
    pub fn new(
        root: &'a Path,
        pattern: Option<&'a str>,
        timestamp: &'a str,
        dry_run: bool,
        output: &'a OutputFormatter,
    ) -> Self {
        Self {
            root,
            pattern,
            timestamp,
            dry_run,
            output,
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.root).unwrap_or(path)
    }

    /// Moves (or previews) every pending record in the plan.
    pub fn execute(&self, plan: &MovePlan) -> MoveOutcome {
        let mut outcome = MoveOutcome::default();
        // Names handed out during a preview, per destination directory.
        let mut claimed: HashMap<PathBuf, HashSet<OsString>> = HashMap::new();
        let pb = self.output.create_progress_bar(plan.pending_count() as u64);

        for record in plan.pending() {
            pb.set_message(record.file_name());
            self.process(record, &mut outcome, &mut claimed, &pb);
            pb.inc(1);
        }

        pb.finish_and_clear();
        outcome
    }

    fn process(
        &self,
        record: &FileRecord,
        outcome: &mut MoveOutcome,
        claimed: &mut HashMap<PathBuf, HashSet<OsString>>,
        pb: &indicatif::ProgressBar,
    ) {
        let Some(original) = record.source.file_name() else {
            let error = OrganizeError::NoFileName(record.source.clone());
            outcome.failures.push((record.source.clone(), error.to_string()));
            return;
        };
        let shown = original.to_string_lossy();

        let claimed_here = claimed.entry(record.dest_dir.clone()).or_default();
        let final_name =
            naming::destination_name(original, self.pattern, self.timestamp, |name| {
                claimed_here.contains(name) || record.dest_dir.join(name).exists()
            });
        let destination = record.dest_dir.join(&final_name);

        if self.dry_run {
            pb.suspend(|| {
                self.output.dry_run_notice(&format!(
                    "{} -> {}",
                    shown,
                    self.relative(&destination).display()
                ));
                if record.archive_eligible {
                    self.output.dry_run_notice(&format!(
                        "    (would archive, age {} days)",
                        record.age_days
                    ));
                }
            });
            self.tally(record, original, &final_name, outcome);
            claimed_here.insert(final_name);
            if record.archive_eligible {
                outcome.archive_candidates.push(destination);
            }
            return;
        }

        match FileOrganizer::move_file(&record.source, &record.dest_dir, &final_name) {
            Ok(moved_to) => {
                log::debug!("moved {} -> {}", record.source.display(), moved_to.display());
                pb.suspend(|| {
                    self.output.success(&format!(
                        "Moved: {} -> {}",
                        shown,
                        self.relative(&moved_to).display()
                    ))
                });
                self.tally(record, original, &final_name, outcome);
                if record.archive_eligible {
                    outcome.archive_candidates.push(moved_to);
                }
            }
            Err(e) => {
                log::warn!("{}", e);
                pb.suspend(|| {
                    self.output
                        .warning(&format!("Failed moving {}: {}", shown, e))
                });
                outcome.failures.push((record.source.clone(), e.to_string()));
            }
        }
    }

    fn tally(&self, record: &FileRecord, original: &OsStr, final_name: &OsStr, outcome: &mut MoveOutcome) {
        outcome.moved += 1;
        if original != final_name {
            outcome.renamed += 1;
        }
        *outcome
            .category_counts
            .entry(record.category.dir_name().to_string())
            .or_insert(0) += 1;
    }
}
