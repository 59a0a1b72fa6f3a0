//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use imaging_archive_inventory::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{IaiError, Result};

// Scanner
pub use crate::scanner::aggregate::{
    Aggregator, ArchiveInventory, ArchiveOverview, ExtensionCounter, FolderRecord,
    SubjectAggregate, TopLevelGroup,
};
pub use crate::scanner::file_kinds::{FileKind, classify};
pub use crate::scanner::status::SubjectStatus;
pub use crate::scanner::walker::{TreeWalk, TreeWalker, discover_groups};
pub use crate::scanner::{scan_archive, scan_archive_with_progress};

// Report
pub use crate::report::assemble::{ArchiveReport, assemble};
pub use crate::report::writer::{ReportPaths, write_report};
