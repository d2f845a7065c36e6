//! shadowtidy - A folder organization and archiving utility
//!
//! This library scans a directory, classifies files by extension, moves them
//! into a `Category/Year/Month` hierarchy, optionally renames them from a
//! pattern, bundles stale files into a dated zip archive and writes
//! before/after snapshots plus a text report.

pub mod archiver;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod naming;
pub mod output;
pub mod planner;
pub mod report;
pub mod safety;

pub use archiver::{ArchiveError, ArchiveOutcome, Archiver};
pub use config::{CompiledFilters, ConfigError, ShadowConfig};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{FileOrganizer, Mover, OrganizeError};
pub use planner::{FileRecord, MovePlan, Planner};
pub use report::Report;

pub use cli::{Cli, RunError, RunOptions, run_cli, run_with_options};
