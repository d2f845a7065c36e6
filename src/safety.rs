//! Guards run before anything on disk is changed.
//!
//! A target is refused if it is a filesystem root or the invoking user's home
//! directory. Mutating runs additionally need an interactive confirmation.

use directories::BaseDirs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a target directory is rejected.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// The path does not exist.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The path exists but is not a directory.
    #[error("Not a folder: {}", .0.display())]
    NotADirectory(PathBuf),
    /// The path is on the denylist.
    #[error("Refusing to operate on {} for safety", .0.display())]
    Denied(PathBuf),
    /// The path could not be resolved.
    #[error("Cannot resolve {}: {source}", path.display())]
    Unresolvable { path: PathBuf, source: io::Error },
}

/// Returns the invoking user's home directory, if it can be determined.
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Whether `path` (already canonical) is on the denylist.
///
/// The denylist is every filesystem root plus `home`.
pub fn is_denied(path: &Path, home: Option<&Path>) -> bool {
    if path.parent().is_none() {
        return true;
    }
    home.is_some_and(|home| {
        let home = home.canonicalize().unwrap_or_else(|_| home.to_path_buf());
        path == home
    })
}

/// Validates the target directory and returns its canonical form.
pub fn check_target(path: &Path, home: Option<&Path>) -> Result<PathBuf, SafetyError> {
    if !path.exists() {
        return Err(SafetyError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(SafetyError::NotADirectory(path.to_path_buf()));
    }

    let canonical = path
        .canonicalize()
        .map_err(|e| SafetyError::Unresolvable {
            path: path.to_path_buf(),
            source: e,
        })?;

    if is_denied(&canonical, home) {
        log::warn!("target {} is on the denylist", canonical.display());
        return Err(SafetyError::Denied(canonical));
    }

    Ok(canonical)
}

/// Asks a yes/no question; only an explicit "y"/"yes" counts as consent.
///
/// End of input counts as "no".
pub fn prompt_confirm<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{} (y/N): ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
