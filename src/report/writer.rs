//! Writes an assembled report as a timestamped directory of CSV tables.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::core::errors::{IaiError, Result};
use crate::report::assemble::{AllFoldersRow, ArchiveReport, FileTypeRow, FolderRow, OverviewRow};

/// Where a written report landed.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// Timestamped directory containing every table.
    pub directory: PathBuf,
    /// Every table file written, in write order.
    pub files: Vec<PathBuf>,
}

/// Write the report under `output_dir` as
/// `Archive_Inventory_<YYYYmmdd_HHMMSS>/`, holding `Overview.csv`,
/// `File_Types.csv`, one `<Group>.csv` per non-empty group, and
/// `All_Folders.csv`. Column headers come from the row structs' serde
/// renames; a table with no rows still gets its header line.
pub fn write_report(report: &ArchiveReport, output_dir: &Path) -> Result<ReportPaths> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let directory = output_dir.join(format!("Archive_Inventory_{timestamp}"));
    fs::create_dir_all(&directory).map_err(|err| IaiError::io(&directory, err))?;

    let mut files = Vec::with_capacity(report.group_tables.len() + 3);
    files.push(write_table(&directory, "Overview", &OverviewRow::HEADERS, &report.overview)?);
    files.push(write_table(
        &directory,
        "File_Types",
        &FileTypeRow::HEADERS,
        &report.file_types,
    )?);
    for table in &report.group_tables {
        files.push(write_table(&directory, &table.name, &FolderRow::HEADERS, &table.rows)?);
    }
    files.push(write_table(
        &directory,
        "All_Folders",
        &AllFoldersRow::HEADERS,
        &report.all_folders,
    )?);

    Ok(ReportPaths { directory, files })
}

fn write_table<T: Serialize>(
    directory: &Path,
    name: &str,
    headers: &[&str],
    rows: &[T],
) -> Result<PathBuf> {
    let path = directory.join(format!("{name}.csv"));
    let mut writer = csv::Writer::from_path(&path)?;
    // serde emits the header row together with the first record, so a
    // rowless table has to write its header itself.
    if rows.is_empty() {
        writer.write_record(headers)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|err| IaiError::io(&path, err))?;
    Ok(path)
}
