//! Flattens a finished inventory into serializable report rows.
//!
//! Column names here are a fixed output contract; downstream spreadsheet
//! tooling keys on them. Serde renames carry the exact headers so the CSV
//! writer emits them verbatim.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::path::MAIN_SEPARATOR_STR;

use serde::Serialize;

use crate::scanner::aggregate::{ArchiveInventory, FolderRecord, TopLevelGroup};

/// Row of the `Overview` table: the archive total plus one row per group.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Total_Folders")]
    pub total_folders: u64,
    #[serde(rename = "Total_Files")]
    pub total_files: u64,
    #[serde(rename = "DICOM_Files")]
    pub dicom_files: u64,
    #[serde(rename = "DAT_Files")]
    pub dat_files: u64,
    #[serde(rename = "NIFTI_Files")]
    pub nifti_files: u64,
    #[serde(rename = "Main_Subfolders")]
    pub main_subfolders: u64,
    #[serde(rename = "Max_Depth")]
    pub max_depth: usize,
}

impl OverviewRow {
    /// CSV column order; mirrors the serde renames.
    pub const HEADERS: [&'static str; 8] = [
        "Category",
        "Total_Folders",
        "Total_Files",
        "DICOM_Files",
        "DAT_Files",
        "NIFTI_Files",
        "Main_Subfolders",
        "Max_Depth",
    ];
}

/// Row of the global `File_Types` table.
#[derive(Debug, Clone, Serialize)]
pub struct FileTypeRow {
    #[serde(rename = "File_Extension")]
    pub file_extension: String,
    #[serde(rename = "Count")]
    pub count: u64,
}

impl FileTypeRow {
    /// CSV column order; mirrors the serde renames.
    pub const HEADERS: [&'static str; 2] = ["File_Extension", "Count"];
}

/// Row of a per-group table: one directory with its hierarchy columns.
#[derive(Debug, Clone, Serialize)]
pub struct FolderRow {
    #[serde(rename = "Relative_Path")]
    pub relative_path: String,
    #[serde(rename = "Level_1")]
    pub level_1: String,
    #[serde(rename = "Level_2")]
    pub level_2: String,
    #[serde(rename = "Level_3")]
    pub level_3: String,
    #[serde(rename = "Level_4")]
    pub level_4: String,
    #[serde(rename = "Deeper")]
    pub deeper: String,
    #[serde(rename = "Depth")]
    pub depth: usize,
    #[serde(rename = "Direct_Subfolders")]
    pub direct_subfolders: u64,
    #[serde(rename = "Total_Files")]
    pub total_files: u64,
    #[serde(rename = "DICOM")]
    pub dicom: u64,
    #[serde(rename = "DAT")]
    pub dat: u64,
    #[serde(rename = "NIFTI")]
    pub nifti: u64,
    #[serde(rename = "File_Types")]
    pub file_types: String,
    #[serde(rename = "Subfolder_Names")]
    pub subfolder_names: String,
    #[serde(rename = "Subject_Status")]
    pub subject_status: String,
}

impl FolderRow {
    /// CSV column order; mirrors the serde renames.
    pub const HEADERS: [&'static str; 15] = [
        "Relative_Path",
        "Level_1",
        "Level_2",
        "Level_3",
        "Level_4",
        "Deeper",
        "Depth",
        "Direct_Subfolders",
        "Total_Files",
        "DICOM",
        "DAT",
        "NIFTI",
        "File_Types",
        "Subfolder_Names",
        "Subject_Status",
    ];
}

/// Row of the `All_Folders` table.
#[derive(Debug, Clone, Serialize)]
pub struct AllFoldersRow {
    pub path: String,
    pub depth: usize,
    pub num_subfolders: u64,
    pub num_files: u64,
    pub dicom_files: u64,
    pub dat_files: u64,
    pub nifti_files: u64,
}

impl AllFoldersRow {
    /// CSV column order; mirrors the field names.
    pub const HEADERS: [&'static str; 7] = [
        "path",
        "depth",
        "num_subfolders",
        "num_files",
        "dicom_files",
        "dat_files",
        "nifti_files",
    ];
}

/// One group's table plus the sanitized, collision-free name it is
/// written under.
#[derive(Debug, Clone)]
pub struct GroupTable {
    pub name: String,
    pub rows: Vec<FolderRow>,
}

/// Fully assembled report, ready for the writer. Pure data, no I/O.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub overview: Vec<OverviewRow>,
    pub file_types: Vec<FileTypeRow>,
    pub group_tables: Vec<GroupTable>,
    pub all_folders: Vec<AllFoldersRow>,
}

/// Assemble every report table from a finished inventory.
///
/// The overview carries one row per group even when the group has no
/// records; per-group tables are only produced for groups with at least
/// one. Group rows sort by depth then relative path, `All_Folders` by
/// depth then path.
#[must_use]
pub fn assemble(inventory: &ArchiveInventory) -> ArchiveReport {
    let mut overview = Vec::with_capacity(inventory.groups.len() + 1);
    overview.push(OverviewRow {
        category: "ARCHIVE TOTAL".to_string(),
        total_folders: inventory.overview.total_folders,
        total_files: inventory.overview.total_files,
        dicom_files: inventory.overview.total_dicom,
        dat_files: inventory.overview.total_dat,
        nifti_files: inventory.overview.total_nifti,
        main_subfolders: inventory.overview.main_subfolder_count,
        max_depth: inventory.overview.max_depth,
    });
    for group in &inventory.groups {
        overview.push(group_overview_row(group, inventory));
    }

    let file_types = inventory
        .global_extensions
        .ranked()
        .into_iter()
        .take(GLOBAL_TOP_EXTENSIONS)
        .map(|(extension, count)| FileTypeRow {
            file_extension: extension.to_string(),
            count,
        })
        .collect();

    // Reserved for the fixed tables; a group carrying one of these names
    // gets a numeric suffix like any other collision.
    let mut used_names: HashSet<String> = ["Overview", "File_Types", "All_Folders"]
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let mut group_tables = Vec::new();
    for group in &inventory.groups {
        if group.record_indices.is_empty() {
            continue;
        }
        let mut rows: Vec<FolderRow> = group
            .record_indices
            .iter()
            .map(|&index| folder_row(&inventory.records[index], group))
            .collect();
        rows.sort_by(|a, b| {
            a.depth
                .cmp(&b.depth)
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });
        group_tables.push(GroupTable {
            name: unique_table_name(&group.name, &mut used_names),
            rows,
        });
    }

    let mut all_folders: Vec<AllFoldersRow> = inventory
        .records
        .iter()
        .map(|record| AllFoldersRow {
            path: record.display_path(),
            depth: record.depth,
            num_subfolders: record.direct_subfolder_count,
            num_files: record.direct_file_count,
            dicom_files: record.dicom_count,
            dat_files: record.dat_count,
            nifti_files: record.nifti_count,
        })
        .collect();
    all_folders.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.path.cmp(&b.path)));

    ArchiveReport {
        overview,
        file_types,
        group_tables,
        all_folders,
    }
}

fn group_overview_row(group: &TopLevelGroup, inventory: &ArchiveInventory) -> OverviewRow {
    let nifti_files = group
        .record_indices
        .iter()
        .map(|&index| inventory.records[index].nifti_count)
        .sum();
    // The group's own folder is always its first record, so its direct
    // subfolder count doubles as the group's Main_Subfolders figure.
    let main_subfolders = group
        .record_indices
        .first()
        .map_or(0, |&index| inventory.records[index].direct_subfolder_count);
    OverviewRow {
        category: group.name.clone(),
        total_folders: group.total_folders,
        total_files: group.total_files,
        dicom_files: group.total_dicom,
        dat_files: group.total_dat,
        nifti_files,
        main_subfolders,
        max_depth: group.max_depth(),
    }
}

fn folder_row(record: &FolderRecord, group: &TopLevelGroup) -> FolderRow {
    let segments: Vec<String> = record
        .rel_path
        .iter()
        .map(|segment| segment.to_string_lossy().into_owned())
        .collect();
    let level = |index: usize| segments.get(index).cloned().unwrap_or_default();
    let deeper = if segments.len() > 4 {
        segments[4..].join(MAIN_SEPARATOR_STR)
    } else {
        String::new()
    };

    let file_types = record
        .extension_counts
        .ranked()
        .into_iter()
        .take(FOLDER_TOP_EXTENSIONS)
        .map(|(extension, count)| format!("{extension}({count})"))
        .collect::<Vec<_>>()
        .join(", ");

    let subfolder_names = record
        .child_subfolder_names
        .iter()
        .take(DISPLAYED_CHILD_NAMES)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let subject_status = record
        .subject_name()
        .and_then(|subject| group.subjects.get(subject))
        .map_or_else(String::new, |subject| subject.status.label().to_string());

    FolderRow {
        relative_path: record.display_path(),
        level_1: level(0),
        level_2: level(1),
        level_3: level(2),
        level_4: level(3),
        deeper,
        depth: record.depth,
        direct_subfolders: record.direct_subfolder_count,
        total_files: record.direct_file_count,
        dicom: record.dicom_count,
        dat: record.dat_count,
        nifti: record.nifti_count,
        file_types,
        subfolder_names,
        subject_status,
    }
}

/// Replace characters that spreadsheet tooling rejects in table names and
/// cap the length.
fn sanitize_table_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '[' | ']' => '_',
            other => other,
        })
        .take(MAX_TABLE_NAME_LEN)
        .collect()
}

/// Sanitize a group name and resolve collisions with a numeric suffix,
/// keeping the result within the length cap.
fn unique_table_name(group_name: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_table_name(group_name);
    if used.insert(base.clone()) {
        return base;
    }
    let mut counter = 2u64;
    loop {
        let suffix = format!("_{counter}");
        let keep = MAX_TABLE_NAME_LEN.saturating_sub(suffix.len());
        let mut candidate: String = base.chars().take(keep).collect();
        candidate.push_str(&suffix);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Global `File_Types` table keeps the most frequent extensions.
pub const GLOBAL_TOP_EXTENSIONS: usize = 20;

/// Per-folder `File_Types` cell keeps the most frequent extensions.
pub const FOLDER_TOP_EXTENSIONS: usize = 5;

/// Per-folder `Subfolder_Names` cell shows the first child names.
pub const DISPLAYED_CHILD_NAMES: usize = 5;

/// Length cap on table names, inherited from spreadsheet sheet-name limits.
pub const MAX_TABLE_NAME_LEN: usize = 31;
