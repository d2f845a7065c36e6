/// Archiving of stale files into a dated zip bundle.
///
/// One bundle is produced per run. The bundle is written under a temporary
/// name and only renamed into place once it is complete; originals are
/// deleted only after that rename succeeded.
use crate::naming;
use crate::planner::ARCHIVE_DIR_NAME;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Errors that abort bundle creation. No original is removed when one occurs.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive directory could not be created.
    #[error("Failed to create archive directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// A member file could not be read or appended.
    #[error("Failed to add {} to archive: {source}", path.display())]
    AddFailed { path: PathBuf, source: io::Error },
    /// The zip container itself could not be written.
    #[error("Failed to write archive {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    /// The finished bundle could not be moved into its final place.
    #[error("Failed to finalize archive {}: {source}", path.display())]
    FinalizeFailed { path: PathBuf, source: io::Error },
}

/// Result of a successful archive run.
#[derive(Debug)]
pub struct ArchiveOutcome {
    /// Path of the written bundle.
    pub bundle_path: PathBuf,
    /// Files stored in the bundle.
    pub archived: Vec<PathBuf>,
    /// Originals that were archived but could not be deleted afterwards.
    pub failed_deletes: Vec<(PathBuf, String)>,
}

impl ArchiveOutcome {
    /// Originals actually removed from disk.
    pub fn removed_count(&self) -> usize {
        self.archived.len() - self.failed_deletes.len()
    }
}

/// Writes archive bundles below `<root>/ShadowArchives/<year>/`.
pub struct Archiver<'a> {
    root: &'a Path,
    year: String,
    timestamp: String,
}

impl<'a> Archiver<'a> {
    /// Creates an archiver for `root`; `year` and `timestamp` name the bundle.
    pub fn new(root: &'a Path, year: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            root,
            year: year.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Directory the bundle goes into.
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR_NAME).join(&self.year)
    }

    fn bundle_file_name(&self) -> String {
        format!("shadow_archive_{}.zip", self.timestamp)
    }

    /// Preferred path of this run's bundle; a `_N` suffix is added if it is taken.
    pub fn bundle_path(&self) -> PathBuf {
        self.archive_dir().join(self.bundle_file_name())
    }

    /// Name of `file` inside the bundle: relative to the root, `/`-separated.
    fn entry_name(&self, file: &Path) -> String {
        let relative = file.strip_prefix(self.root).unwrap_or(file);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Bundles `files` and then deletes them.
    ///
    /// Returns `Ok(None)` when `files` is empty. On error, no original has
    /// been touched and no partial bundle is left behind.
    pub fn archive(&self, files: &[PathBuf]) -> Result<Option<ArchiveOutcome>, ArchiveError> {
        if files.is_empty() {
            return Ok(None);
        }

        let bundle_path = self.write_bundle(files)?;
        log::info!(
            "archived {} files into {}",
            files.len(),
            bundle_path.display()
        );

        let failed_deletes = Self::remove_originals(files);

        Ok(Some(ArchiveOutcome {
            bundle_path,
            archived: files.to_vec(),
            failed_deletes,
        }))
    }

    /// Writes the bundle completely, or not at all.
    pub fn write_bundle(&self, files: &[PathBuf]) -> Result<PathBuf, ArchiveError> {
        let archive_dir = self.archive_dir();
        fs::create_dir_all(&archive_dir).map_err(|e| ArchiveError::DirectoryCreationFailed {
            path: archive_dir.clone(),
            source: e,
        })?;

        let bundle_name = naming::resolve_collision(&archive_dir, &self.bundle_file_name());
        let bundle_path = archive_dir.join(bundle_name);
        let partial_path = bundle_path.with_extension("zip.partial");

        let result = self
            .write_zip(&partial_path, files)
            .and_then(|()| {
                fs::rename(&partial_path, &bundle_path).map_err(|e| {
                    ArchiveError::FinalizeFailed {
                        path: bundle_path.clone(),
                        source: e,
                    }
                })
            });

        if let Err(e) = result {
            if partial_path.exists()
                && let Err(cleanup) = fs::remove_file(&partial_path)
            {
                log::warn!(
                    "could not remove partial archive {}: {}",
                    partial_path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        Ok(bundle_path)
    }

    fn write_zip(&self, path: &Path, files: &[PathBuf]) -> Result<(), ArchiveError> {
        let file = File::create(path).map_err(|e| ArchiveError::AddFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for member in files {
            let add_failed = |e: io::Error| ArchiveError::AddFailed {
                path: member.clone(),
                source: e,
            };
            let mut source = File::open(member).map_err(add_failed)?;
            let len = source.metadata().map_err(add_failed)?.len();

            let member_options = options.large_file(needs_zip64(len));
            zip.start_file(self.entry_name(member), member_options)
                .map_err(|e| ArchiveError::WriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;

            io::copy(&mut source, &mut zip).map_err(add_failed)?;
        }

        let mut writer = zip.finish().map_err(|e| ArchiveError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        io::Write::flush(&mut writer).map_err(|e| ArchiveError::AddFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Best-effort deletion; failures are collected, not returned as errors.
    fn remove_originals(files: &[PathBuf]) -> Vec<(PathBuf, String)> {
        let mut failed = Vec::new();
        for file in files {
            if let Err(e) = fs::remove_file(file) {
                log::warn!("archived but could not delete {}: {}", file.display(), e);
                failed.push((file.clone(), e.to_string()));
            }
        }
        failed
    }
}

/// Members larger than this need ZIP64 headers.
fn needs_zip64(len: u64) -> bool {
    len > u64::from(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    #[test]
    fn test_empty_set_writes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archiver = Archiver::new(temp_dir.path(), "2025", "20250101_000000");

        let outcome = archiver.archive(&[]).expect("archive should succeed");
        assert!(outcome.is_none());
        assert!(!temp_dir.path().join(ARCHIVE_DIR_NAME).exists());
    }

    #[test]
    fn test_archive_bundles_then_deletes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let first = root.join("Documents/2023/May/notes.txt");
        let second = root.join("Pictures/2022/June/old.png");
        write(&first, "remember the milk");
        write(&second, "pixels");

        let archiver = Archiver::new(root, "2025", "20250101_000000");
        let outcome = archiver
            .archive(&[first.clone(), second.clone()])
            .expect("archive should succeed")
            .expect("a bundle should be written");

        assert_eq!(
            outcome.bundle_path,
            root.join("ShadowArchives/2025/shadow_archive_20250101_000000.zip")
        );
        assert_eq!(outcome.removed_count(), 2);
        assert!(!first.exists());
        assert!(!second.exists());
        assert!(!outcome.bundle_path.with_extension("zip.partial").exists());

        let mut zip = ZipArchive::new(File::open(&outcome.bundle_path).expect("open bundle"))
            .expect("bundle should be a valid zip");
        assert_eq!(zip.len(), 2);

        let mut content = String::new();
        zip.by_name("Documents/2023/May/notes.txt")
            .expect("entry should exist")
            .read_to_string(&mut content)
            .expect("entry should be readable");
        assert_eq!(content, "remember the milk");
    }

    #[test]
    fn test_zip64_only_for_large_members() {
        assert!(!needs_zip64(0));
        assert!(!needs_zip64(u64::from(u32::MAX)));
        assert!(needs_zip64(u64::from(u32::MAX) + 1));
    }

    #[cfg(unix)]
    #[test]
    fn test_undeletable_original_is_reported_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let locked_dir = root.join("Documents/2023/May");
        let stuck = locked_dir.join("notes.txt");
        let free = root.join("Music/2023/May/song.mp3");
        write(&stuck, "stuck");
        write(&free, "free");

        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o555))
            .expect("Failed to lock directory");
        // Permission bits do not bind a privileged user.
        if fs::write(locked_dir.join("write_check"), "").is_ok() {
            fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o755)).ok();
            return;
        }

        let archiver = Archiver::new(root, "2025", "20250101_000000");
        let outcome = archiver
            .archive(&[stuck.clone(), free.clone()])
            .expect("archive should succeed")
            .expect("a bundle should be written");

        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o755))
            .expect("Failed to unlock directory");

        assert!(outcome.bundle_path.exists());
        assert_eq!(outcome.archived.len(), 2);
        assert_eq!(outcome.removed_count(), 1);
        assert_eq!(outcome.failed_deletes.len(), 1);
        assert_eq!(outcome.failed_deletes[0].0, stuck);
        assert!(stuck.exists());
        assert!(!free.exists());
    }

    #[test]
    fn test_failed_bundle_keeps_originals() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let present = root.join("Documents/2023/May/notes.txt");
        let missing = root.join("Documents/2023/May/gone.txt");
        write(&present, "still here");

        let archiver = Archiver::new(root, "2025", "20250101_000000");
        let result = archiver.archive(&[present.clone(), missing.clone()]);

        assert!(matches!(result, Err(ArchiveError::AddFailed { .. })));
        assert!(present.exists());
        assert!(!archiver.bundle_path().exists());
        assert!(!archiver.bundle_path().with_extension("zip.partial").exists());
    }
}
