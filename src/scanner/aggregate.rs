//! Multi-granularity accumulation of walk records: global overview,
//! per-top-level-group totals, and per-subject rollups with processing
//! status.
//!
//! The [`Aggregator`] owns every [`FolderRecord`] the walker produces;
//! groups and subjects index into that record list rather than copying
//! it. All counter updates are commutative sums, so final totals do not
//! depend on sibling visit order.

#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::scanner::status::SubjectStatus;

/// Counter keyed by normalized extension that remembers the rank at which
/// each key was first seen. Rankings sort by count descending with ties
/// broken by first-seen rank ascending, which keeps top-N listings stable
/// across runs that visit entries in the same order.
#[derive(Debug, Clone, Default)]
pub struct ExtensionCounter {
    counts: HashMap<String, ExtensionSlot>,
    next_rank: u64,
}

#[derive(Debug, Clone, Copy)]
struct ExtensionSlot {
    count: u64,
    first_seen: u64,
}

impl ExtensionCounter {
    /// Count one occurrence of `extension`.
    pub fn record(&mut self, extension: &str) {
        self.add(extension, 1);
    }

    /// Count `count` occurrences of `extension`.
    pub fn add(&mut self, extension: &str, count: u64) {
        if let Some(slot) = self.counts.get_mut(extension) {
            slot.count += count;
        } else {
            let first_seen = self.next_rank;
            self.next_rank += 1;
            self.counts
                .insert(extension.to_string(), ExtensionSlot { count, first_seen });
        }
    }

    /// Fold another counter into this one. Unseen keys get fresh ranks in
    /// the other counter's insertion order, so merging a sequence of
    /// counters reproduces the ordering a single shared counter would have
    /// produced.
    pub fn merge(&mut self, other: &Self) {
        let mut entries: Vec<(&str, &ExtensionSlot)> = other
            .counts
            .iter()
            .map(|(ext, slot)| (ext.as_str(), slot))
            .collect();
        entries.sort_by_key(|(_, slot)| slot.first_seen);
        for (extension, slot) in entries {
            self.add(extension, slot.count);
        }
    }

    /// Entries sorted by count descending, ties by first-seen order.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64, u64)> = self
            .counts
            .iter()
            .map(|(ext, slot)| (ext.as_str(), slot.count, slot.first_seen))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        entries
            .into_iter()
            .map(|(ext, count, _)| (ext, count))
            .collect()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|slot| slot.count).sum()
    }

    /// Count for one extension, zero when absent.
    #[must_use]
    pub fn count_of(&self, extension: &str) -> u64 {
        self.counts.get(extension).map_or(0, |slot| slot.count)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Everything recorded about one visited directory node.
#[derive(Debug, Clone)]
pub struct FolderRecord {
    /// Path relative to the scan root; empty for the root itself.
    pub rel_path: PathBuf,
    /// Segment count relative to the root (root = 0).
    pub depth: usize,
    pub direct_subfolder_count: u64,
    pub direct_file_count: u64,
    /// Per-extension counts for files directly inside this node.
    pub extension_counts: ExtensionCounter,
    pub dicom_count: u64,
    pub dat_count: u64,
    pub nifti_count: u64,
    /// First few immediate subdirectory names, for display.
    pub child_subfolder_names: Vec<String>,
}

impl FolderRecord {
    /// Relative path for display; the root renders as `"."`.
    #[must_use]
    pub fn display_path(&self) -> String {
        if self.rel_path.as_os_str().is_empty() {
            ".".to_string()
        } else {
            self.rel_path.to_string_lossy().into_owned()
        }
    }

    /// First path segment, which names the owning top-level group.
    #[must_use]
    pub fn top_level_group(&self) -> Option<&str> {
        self.rel_path.iter().next().and_then(|segment| segment.to_str())
    }

    /// Second path segment, which names the subject within its group.
    #[must_use]
    pub fn subject_name(&self) -> Option<&str> {
        self.rel_path.iter().nth(1).and_then(|segment| segment.to_str())
    }
}

/// Running totals for one immediate child directory of the scan root.
#[derive(Debug, Clone)]
pub struct TopLevelGroup {
    pub name: String,
    pub total_folders: u64,
    pub total_files: u64,
    pub total_dicom: u64,
    pub total_dat: u64,
    /// Extension counts merged over every record in the group.
    pub extension_counts: ExtensionCounter,
    /// How many records sit at each depth.
    pub depth_histogram: BTreeMap<usize, u64>,
    /// Indices into the aggregator's record list, in visitation order.
    pub record_indices: Vec<usize>,
    /// Per-subject rollups, populated by [`Aggregator::finish`].
    pub subjects: BTreeMap<String, SubjectAggregate>,
}

impl TopLevelGroup {
    fn new(name: String) -> Self {
        Self {
            name,
            total_folders: 0,
            total_files: 0,
            total_dicom: 0,
            total_dat: 0,
            extension_counts: ExtensionCounter::default(),
            depth_histogram: BTreeMap::new(),
            record_indices: Vec::new(),
            subjects: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, index: usize, record: &FolderRecord) {
        self.total_folders += 1;
        self.total_files += record.direct_file_count;
        self.total_dicom += record.dicom_count;
        self.total_dat += record.dat_count;
        *self.depth_histogram.entry(record.depth).or_insert(0) += 1;
        self.extension_counts.merge(&record.extension_counts);
        self.record_indices.push(index);
    }

    /// Deepest record depth seen in this group, zero when empty.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.depth_histogram.keys().next_back().copied().unwrap_or(0)
    }
}

/// Merged counts and derived status for one subject folder.
#[derive(Debug, Clone)]
pub struct SubjectAggregate {
    pub name: String,
    /// Extension counts merged over the subject folder and everything
    /// beneath it.
    pub extension_counts: ExtensionCounter,
    pub status: SubjectStatus,
}

impl SubjectAggregate {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extension_counts: ExtensionCounter::default(),
            status: SubjectStatus::Unknown,
        }
    }
}

/// Archive-wide totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveOverview {
    pub total_folders: u64,
    pub total_files: u64,
    pub total_dicom: u64,
    pub total_dat: u64,
    pub total_nifti: u64,
    /// Deepest record depth across the whole archive.
    pub max_depth: usize,
    /// Number of top-level groups discovered under the scan root.
    pub main_subfolder_count: u64,
}

/// Accumulates walk records into the overview, the per-group totals, and
/// the global extension counter, then derives subjects on [`finish`].
///
/// [`finish`]: Aggregator::finish
#[derive(Debug)]
pub struct Aggregator {
    records: Vec<FolderRecord>,
    overview: ArchiveOverview,
    global_extensions: ExtensionCounter,
    groups: Vec<TopLevelGroup>,
    group_index: HashMap<String, usize>,
    unmatched_records: u64,
}

impl Aggregator {
    /// Pre-enumerate the top-level groups. Names come from listing the
    /// root's immediate child directories before the walk starts.
    #[must_use]
    pub fn new(group_names: Vec<String>) -> Self {
        let group_index = group_names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        let overview = ArchiveOverview {
            main_subfolder_count: group_names.len() as u64,
            ..ArchiveOverview::default()
        };
        let groups = group_names.into_iter().map(TopLevelGroup::new).collect();
        Self {
            records: Vec::new(),
            overview,
            global_extensions: ExtensionCounter::default(),
            groups,
            group_index,
            unmatched_records: 0,
        }
    }

    /// Fold one walk record into the totals. The overview and the global
    /// extension counter always update; the owning group updates when the
    /// record's first path segment matches a pre-enumerated group. A first
    /// segment matching no known group stays in the global totals and is
    /// counted as unmatched.
    pub fn consume(&mut self, record: FolderRecord) {
        self.overview.total_folders += 1;
        self.overview.total_files += record.direct_file_count;
        self.overview.total_dicom += record.dicom_count;
        self.overview.total_dat += record.dat_count;
        self.overview.total_nifti += record.nifti_count;
        if record.depth > self.overview.max_depth {
            self.overview.max_depth = record.depth;
        }
        self.global_extensions.merge(&record.extension_counts);

        let index = self.records.len();
        if let Some(group_name) = record.top_level_group() {
            if let Some(&group_idx) = self.group_index.get(group_name) {
                self.groups[group_idx].absorb(index, &record);
            } else {
                self.unmatched_records += 1;
            }
        }
        self.records.push(record);
    }

    /// Build the per-subject rollups and seal the inventory. Each group's
    /// records partition on their second path segment; records without one
    /// (the group folder itself) belong to no subject. Status derives from
    /// the merged `.mat`, `.dat` and `.ima` counts.
    #[must_use]
    pub fn finish(mut self) -> ArchiveInventory {
        for group in &mut self.groups {
            for &index in &group.record_indices {
                let record = &self.records[index];
                let Some(subject_name) = record.subject_name() else {
                    continue;
                };
                let subject = group
                    .subjects
                    .entry(subject_name.to_string())
                    .or_insert_with(|| SubjectAggregate::new(subject_name));
                subject.extension_counts.merge(&record.extension_counts);
            }
            for subject in group.subjects.values_mut() {
                subject.status = SubjectStatus::from_counts(
                    subject.extension_counts.count_of(".mat"),
                    subject.extension_counts.count_of(".dat"),
                    subject.extension_counts.count_of(".ima"),
                );
            }
        }
        ArchiveInventory {
            overview: self.overview,
            global_extensions: self.global_extensions,
            groups: self.groups,
            records: self.records,
            unmatched_records: self.unmatched_records,
            skipped_subtrees: Vec::new(),
        }
    }
}

/// Completed inventory of one scan: the overview, every group with its
/// subjects, the full record list, and the paths the walker had to skip.
#[derive(Debug)]
pub struct ArchiveInventory {
    pub overview: ArchiveOverview,
    pub global_extensions: ExtensionCounter,
    pub groups: Vec<TopLevelGroup>,
    pub records: Vec<FolderRecord>,
    /// Records whose first path segment matched no pre-enumerated group.
    pub unmatched_records: u64,
    /// Subtrees the walker could not list, in encounter order.
    pub skipped_subtrees: Vec<PathBuf>,
}

impl ArchiveInventory {
    /// Look up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&TopLevelGroup> {
        self.groups.iter().find(|group| group.name == name)
    }
}
