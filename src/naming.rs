//! Collision-free file naming.
//!
//! Names are built either from a timestamp suffix (`report_20250101_120000.pdf`)
//! or from a rename template such as `{name}_{ts}.{ext}`. The recognized
//! placeholders are a closed set; anything else in the template is copied
//! through literally.

use chrono::{DateTime, Local};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Maximum length, in characters, of a sanitized base name.
pub const MAX_BASE_LEN: usize = 120;

/// Format used for `{ts}` and the default timestamp suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Placeholders recognized in rename templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{name}`: the sanitized original base name.
    Name,
    /// `{ts}`: the run timestamp.
    Timestamp,
    /// `{ext}`: the original extension without the leading dot.
    Extension,
}

impl Placeholder {
    const ALL: [Placeholder; 3] = [
        Placeholder::Name,
        Placeholder::Timestamp,
        Placeholder::Extension,
    ];

    fn token(self) -> &'static str {
        match self {
            Placeholder::Name => "{name}",
            Placeholder::Timestamp => "{ts}",
            Placeholder::Extension => "{ext}",
        }
    }
}

/// Formats a timestamp the way it appears in generated names.
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Makes a file base name safe to use.
///
/// Line breaks become spaces, path separators and NUL are dropped, whitespace
/// runs collapse to a single `_` and the result is cut to [`MAX_BASE_LEN`]
/// characters.
///
/// # Examples
///
/// ```
/// use shadowtidy::naming::sanitize;
///
/// assert_eq!(sanitize("  my  holiday\nphoto "), "my_holiday_photo");
/// assert_eq!(sanitize("a/b\\c"), "abc");
/// ```
pub fn sanitize(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .map(|ch| if ch == '\r' || ch == '\n' { ' ' } else { ch })
        .filter(|ch| !matches!(ch, '/' | '\\' | '\0'))
        .collect();

    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    joined.chars().take(MAX_BASE_LEN).collect()
}

/// Splits a file name into its base and extension (without the dot).
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx + 1..]),
        _ => (file_name, ""),
    }
}

/// Substitutes the known placeholders in `template`.
///
/// Unknown `{...}` sequences are left untouched.
///
/// # Examples
///
/// ```
/// use shadowtidy::naming::render_template;
///
/// let name = render_template("{name}-{ts}.{ext}", "report", "20250101_000000", "pdf");
/// assert_eq!(name, "report-20250101_000000.pdf");
/// assert_eq!(render_template("{name}_{owner}", "a", "t", ""), "a_{owner}");
/// ```
pub fn render_template(template: &str, name: &str, ts: &str, ext: &str) -> String {
    Placeholder::ALL
        .iter()
        .fold(template.to_string(), |acc, placeholder| {
            let value = match placeholder {
                Placeholder::Name => name,
                Placeholder::Timestamp => ts,
                Placeholder::Extension => ext,
            };
            acc.replace(placeholder.token(), value)
        })
}

/// Builds the preferred (not yet collision-checked) name for `file_name`.
///
/// Without a pattern this is `<base>_<ts>.<ext>`; with one the template is
/// rendered and the extension appended if the template dropped it.
pub fn candidate_name(file_name: &str, pattern: Option<&str>, ts: &str) -> String {
    let (base, ext) = split_name(file_name);
    let base = sanitize(base);
    let dotted_ext = if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    };

    let name = match pattern {
        Some(template) => {
            let rendered = render_template(template, &base, ts, ext);
            let mut rendered: String = rendered
                .chars()
                .filter(|ch| !matches!(ch, '/' | '\\' | '\0' | '\r' | '\n'))
                .collect();
            if dotted_ext.is_empty() {
                rendered = rendered.trim_end_matches('.').to_string();
            } else if !rendered.ends_with(&dotted_ext) {
                rendered.push_str(&dotted_ext);
            }
            rendered
        }
        None => format!("{}_{}{}", base, ts, dotted_ext),
    };

    if name.trim().is_empty() || name == dotted_ext {
        format!("file{}", dotted_ext)
    } else {
        name
    }
}

/// Returns `name`, or `name` with the lowest free `_N` suffix, so that it does
/// not collide with an entry in `dest_dir`.
pub fn resolve_collision(dest_dir: &Path, name: &str) -> String {
    resolve_collision_with(name, |candidate| dest_dir.join(candidate).exists())
}

/// Like [`resolve_collision`], with the occupancy test supplied by the caller.
pub fn resolve_collision_with<F>(name: &str, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !is_taken(name) {
        return name.to_string();
    }

    let (stem, ext) = split_name(name);
    let dotted_ext = if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    };

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, dotted_ext);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Computes a collision-free name for `file_name` inside `dest_dir`.
///
/// # Examples
///
/// ```no_run
/// use shadowtidy::naming::smart_filename;
/// use std::path::Path;
///
/// let name = smart_filename(Path::new("/tmp/out"), "report.pdf", Some("{name}_{ts}.{ext}"), "20250101_120000");
/// assert_eq!(name, "report_20250101_120000.pdf");
/// ```
pub fn smart_filename(dest_dir: &Path, file_name: &str, pattern: Option<&str>, ts: &str) -> String {
    resolve_collision(dest_dir, &candidate_name(file_name, pattern, ts))
}

/// Decides the final name of a file being moved.
///
/// Without a pattern the original name is kept byte for byte when
/// `is_taken` reports it free; only a collision falls back to the timestamped
/// form. With a pattern the template always applies. Generated names are
/// built from the lossy UTF-8 form of `file_name`.
pub fn destination_name<F>(
    file_name: &OsStr,
    pattern: Option<&str>,
    ts: &str,
    is_taken: F,
) -> OsString
where
    F: Fn(&OsStr) -> bool,
{
    if pattern.is_none() && !is_taken(file_name) {
        return file_name.to_os_string();
    }

    let original = file_name.to_string_lossy();
    let candidate = candidate_name(&original, pattern, ts);
    OsString::from(resolve_collision_with(&candidate, |name| {
        is_taken(OsStr::new(name))
    }))
}
