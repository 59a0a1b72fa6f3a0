#![forbid(unsafe_code)]

//! Imaging Archive Inventory (iai) — recursive inventory of a research
//! imaging archive.
//!
//! One sequential pass over the archive tree produces:
//! 1. **Folder records** — per-directory counts with files classified by
//!    name into DICOM, DAT, and NIfTI buckets
//! 2. **Group and subject rollups** — totals per top-level group plus a
//!    Processed / Not Processed / Unknown status per subject
//! 3. **CSV report** — a timestamped directory holding Overview,
//!    File_Types, per-group, and All_Folders tables
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use imaging_archive_inventory::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use imaging_archive_inventory::core::config::Config;
//! use imaging_archive_inventory::scanner::walker::TreeWalker;
//! ```

pub mod prelude;

pub mod core;
pub mod report;
pub mod scanner;
