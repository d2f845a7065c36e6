//! Output formatting and styling module.
//!
//! Provides a single interface for all terminal output: colored status lines,
//! banners, the progress bar and summary tables. An `OutputFormatter` holds no
//! mutable state; it is created once per run and passed to whatever prints.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Banner variant shown at the start and end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BannerStyle {
    /// Plain, descriptive banner.
    #[default]
    Standard,
    /// The "cast" presentation variant.
    Cast,
}

/// Static advisory lines printed by `--ai`.
pub const SUGGESTIONS: [&str; 3] = [
    "Consider grouping images by resolution",
    "Archive PDFs older than 1 year",
    "Create 'Projects/<project_name>' for loose docs",
];

/// Formats all CLI output with consistent styling.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    banner: BannerStyle,
}

impl OutputFormatter {
    pub fn new(banner: BannerStyle) -> Self {
        Self { banner }
    }

    /// Title line for the start-of-run banner.
    pub fn banner_title(&self) -> &'static str {
        match self.banner {
            BannerStyle::Standard => "🧹 shadowtidy: taming folder chaos",
            BannerStyle::Cast => "🔮 Casting the tidy spell...",
        }
    }

    /// Closing line printed when a run finishes.
    pub fn farewell(&self) -> &'static str {
        match self.banner {
            BannerStyle::Standard => "Done. Your folder has been tidied.",
            BannerStyle::Cast => "✨ The spell is complete. Chaos banished. ✨",
        }
    }

    /// Prints the start-of-run banner.
    pub fn banner(&self) {
        let rule = "=".repeat(48);
        println!("\n{}", rule.magenta());
        println!("{}", self.banner_title().cyan().bold());
        println!("{}\n", rule.magenta());
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shadowtidy::output::OutputFormatter;
    /// OutputFormatter::default().success("Moved: photo.jpg");
    /// ```
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(&self, message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(&self, header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a preview-mode notice.
    pub fn dry_run_notice(&self, message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow().dimmed());
    }

    /// Prints an archive-related message in magenta.
    pub fn archive(&self, message: &str) {
        println!("{} {}", "📦".magenta(), message.magenta());
    }

    /// Prints the static advisory suggestions.
    pub fn suggestions(&self) {
        println!("\n{}", "🤖 Suggestions:".yellow().bold());
        for line in SUGGESTIONS {
            println!("{}", format!("- {}", line).yellow());
        }
    }

    /// Creates a progress bar for the move loop.
    ///
    /// Output printed while the bar is active should go through
    /// `ProgressBar::suspend` so lines are not interleaved with the bar.
    pub fn create_progress_bar(&self, total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a table of moved files per category.
    pub fn summary_table(&self, category_counts: &BTreeMap<String, usize>, total_files: usize) {
        self.header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count, "file"),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files, "file"),
            width = width
        );
    }
}

/// `"1 day"`-style pluralization helper: returns `word` or `word + "s"`.
pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
