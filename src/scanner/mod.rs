//! Archive scanner: tree walker, file-kind classification, aggregation, subject status.

pub mod aggregate;
pub mod file_kinds;
pub mod status;
pub mod walker;

use std::path::Path;

use crate::core::errors::Result;
use crate::scanner::aggregate::{Aggregator, ArchiveInventory};
use crate::scanner::walker::{TreeWalker, discover_groups};

/// Run a complete inventory of `root`: discover the top-level groups, walk
/// the tree once, and aggregate every record.
pub fn scan_archive(root: &Path) -> Result<ArchiveInventory> {
    scan_archive_with_progress(root, 0, |_| {})
}

/// [`scan_archive`] with a progress callback invoked with the running folder
/// count every `every` folders (0 disables).
pub fn scan_archive_with_progress<F>(
    root: &Path,
    every: u64,
    progress: F,
) -> Result<ArchiveInventory>
where
    F: FnMut(u64),
{
    let groups = discover_groups(root)?;
    let mut aggregator = Aggregator::new(groups);
    let mut walk = TreeWalker::new(root).with_progress(every, progress).walk()?;
    for record in walk.by_ref() {
        aggregator.consume(record);
    }
    let mut inventory = aggregator.finish();
    inventory.skipped_subtrees = walk.into_skipped();
    Ok(inventory)
}
