/// File categorization by extension.
///
/// This module maps file extensions to the fixed set of top-level folders
/// used when organizing a directory (e.g., "Pictures", "Documents").
///
/// # Examples
///
/// ```
/// use shadowtidy::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.categorize("jpg"), Category::Pictures);
/// assert_eq!(mapper.categorize("mp3"), Category::Music);
/// assert_eq!(mapper.categorize(""), Category::Misc);
/// ```
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Represents the top-level folder a file is organized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Pictures,
    /// Video files (MP4, MKV, MOV, etc.)
    Videos,
    /// Documents, spreadsheets and slides (PDF, DOCX, TXT, etc.)
    Documents,
    /// Compressed archives (ZIP, TAR, 7Z, etc.)
    Archives,
    /// Source code files (Rust, Python, JavaScript, etc.)
    Code,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Music,
    /// Anything without a known extension
    Misc,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 7] = [
        Category::Pictures,
        Category::Videos,
        Category::Documents,
        Category::Archives,
        Category::Code,
        Category::Music,
        Category::Misc,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowtidy::file_category::Category;
    ///
    /// assert_eq!(Category::Pictures.dir_name(), "Pictures");
    /// assert_eq!(Category::Misc.dir_name(), "Misc");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Pictures => "Pictures",
            Category::Videos => "Videos",
            Category::Documents => "Documents",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Music => "Music",
            Category::Misc => "Misc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Parses a category name case-insensitively ("pictures", "Music", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.dir_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Maps file extensions to categories.
///
/// The standard table is fixed; extra mappings can be layered on top from
/// the configuration file.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the standard extension table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        const TABLE: &[(Category, &[&str])] = &[
            (
                Category::Pictures,
                &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"],
            ),
            (Category::Videos, &["mp4", "mkv", "mov", "avi", "webm"]),
            (
                Category::Documents,
                &[
                    "pdf", "doc", "docx", "odt", "xls", "xlsx", "ppt", "pptx", "txt", "md",
                ],
            ),
            (Category::Archives, &["zip", "tar", "gz", "7z", "rar"]),
            (
                Category::Code,
                &[
                    "py", "js", "html", "css", "go", "rs", "java", "c", "cpp", "sh",
                ],
            ),
            (Category::Music, &["mp3", "wav", "flac", "ogg", "m4a"]),
        ];

        for (category, extensions) in TABLE {
            for ext in *extensions {
                self.add_extension_mapping(ext, *category);
            }
        }
    }

    /// Adds (or overrides) a file extension to category mapping.
    ///
    /// A leading `.` is ignored, so both "heic" and ".heic" work.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.extension_map.insert(ext, category);
    }

    /// Maps a file extension to a category, if it is in the table.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowtidy::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category("PDF"), Some(Category::Documents));
    /// assert_eq!(mapper.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Determines the category for an extension, falling back to `Misc`.
    pub fn categorize(&self, ext: &str) -> Category {
        self.extension_to_category(ext).unwrap_or(Category::Misc)
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
