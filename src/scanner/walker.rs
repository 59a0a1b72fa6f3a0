//! Sequential depth-first directory walker.
//!
//! The walker is the "eyes" of the scanner: it visits every directory under
//! the scan root exactly once, classifies the files it sees by name alone,
//! and yields one [`FolderRecord`] per node in pre-order. Subtrees whose
//! listing fails are skipped and remembered rather than aborting the walk.

#![allow(missing_docs)]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::errors::{IaiError, Result};
use crate::scanner::aggregate::{ExtensionCounter, FolderRecord};
use crate::scanner::file_kinds;

/// Item in the walk stack: (absolute_path, relative_path, depth).
type PendingDir = (PathBuf, PathBuf, usize);

/// Builder for a single traversal of one scan root.
///
/// Traversal invariants:
/// - Every readable directory yields exactly one record, the root included
/// - A node's record is produced before any descendant's (pre-order)
/// - Sibling order follows readdir order, so one run is deterministic
/// - Symlinks are counted where they stand but never descended
pub struct TreeWalker<'cb> {
    root: PathBuf,
    progress_every: u64,
    progress: Option<Box<dyn FnMut(u64) + 'cb>>,
}

impl<'cb> TreeWalker<'cb> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            progress_every: 0,
            progress: None,
        }
    }

    /// Set a progress callback invoked with the running visited count every
    /// `every` folders. Zero disables reporting.
    #[must_use]
    pub fn with_progress<F>(mut self, every: u64, callback: F) -> Self
    where
        F: FnMut(u64) + 'cb,
    {
        self.progress_every = every;
        self.progress = Some(Box::new(callback));
        self
    }

    /// Validate the root eagerly and begin the walk.
    ///
    /// A missing root, a root that is not a directory, or a root that cannot
    /// be listed fails here, before any record is produced. Listing failures
    /// deeper in the tree are not errors; see [`TreeWalk::skipped_subtrees`].
    pub fn walk(self) -> Result<TreeWalk<'cb>> {
        open_root(&self.root)?;
        Ok(TreeWalk {
            stack: vec![(self.root, PathBuf::new(), 0)],
            visited: 0,
            progress_every: self.progress_every,
            progress: self.progress,
            skipped_subtrees: Vec::new(),
        })
    }
}

/// In-progress traversal yielding one [`FolderRecord`] per visited node.
pub struct TreeWalk<'cb> {
    stack: Vec<PendingDir>,
    visited: u64,
    progress_every: u64,
    progress: Option<Box<dyn FnMut(u64) + 'cb>>,
    skipped_subtrees: Vec<PathBuf>,
}

impl TreeWalk<'_> {
    /// Folders visited so far.
    #[must_use]
    pub fn visited(&self) -> u64 {
        self.visited
    }

    /// Subtrees skipped because their listing failed, in encounter order.
    #[must_use]
    pub fn skipped_subtrees(&self) -> &[PathBuf] {
        &self.skipped_subtrees
    }

    /// Consume the walk, keeping the skipped-subtree list.
    #[must_use]
    pub fn into_skipped(self) -> Vec<PathBuf> {
        self.skipped_subtrees
    }
}

impl Iterator for TreeWalk<'_> {
    type Item = FolderRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (abs_path, rel_path, depth) = self.stack.pop()?;

            // Per-subtree failure policy: skip-and-continue. An unreadable
            // directory produces no record and the walk moves on.
            let entries = match fs::read_dir(&abs_path) {
                Ok(entries) => entries,
                Err(_) => {
                    self.skipped_subtrees.push(abs_path);
                    continue;
                }
            };

            let mut subfolder_count = 0u64;
            let mut file_count = 0u64;
            let mut extension_counts = ExtensionCounter::default();
            let mut dicom_count = 0u64;
            let mut dat_count = 0u64;
            let mut nifti_count = 0u64;
            let mut child_names: Vec<String> = Vec::new();
            let mut child_dirs: Vec<(PathBuf, PathBuf)> = Vec::new();

            for entry_result in entries {
                let Ok(entry) = entry_result else {
                    continue;
                };
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                let name = entry.file_name();

                if file_type.is_dir() {
                    subfolder_count += 1;
                    if child_names.len() < MAX_CHILD_NAMES {
                        child_names.push(name.to_string_lossy().into_owned());
                    }
                    child_dirs.push((entry.path(), rel_path.join(&name)));
                    continue;
                }

                // A symlink whose target is a directory counts as a subfolder
                // but is never descended; broken links and links to files
                // count as files.
                if file_type.is_symlink()
                    && fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir())
                {
                    subfolder_count += 1;
                    if child_names.len() < MAX_CHILD_NAMES {
                        child_names.push(name.to_string_lossy().into_owned());
                    }
                    continue;
                }

                file_count += 1;
                let kind = file_kinds::classify(&name.to_string_lossy());
                extension_counts.record(&kind.extension);
                dicom_count += u64::from(kind.is_dicom);
                dat_count += u64::from(kind.is_dat);
                nifti_count += u64::from(kind.is_nifti);
            }

            // Reversed push keeps pop order equal to readdir order.
            for (child_abs, child_rel) in child_dirs.into_iter().rev() {
                self.stack.push((child_abs, child_rel, depth + 1));
            }

            let record = FolderRecord {
                rel_path,
                depth,
                direct_subfolder_count: subfolder_count,
                direct_file_count: file_count,
                extension_counts,
                dicom_count,
                dat_count,
                nifti_count,
                child_subfolder_names: child_names,
            };

            self.visited += 1;
            if self.progress_every > 0
                && self.visited.is_multiple_of(self.progress_every)
                && let Some(progress) = self.progress.as_mut()
            {
                progress(self.visited);
            }

            return Some(record);
        }
    }
}

/// List the immediate child directories of the scan root, in readdir order.
/// These names become the top-level groups of the inventory. A symlink whose
/// target is a directory is a group like any other; the walk still refuses
/// to descend it, so such a group stays at zero counts.
pub fn discover_groups(root: &Path) -> Result<Vec<String>> {
    let entries = open_root(root)?;
    let mut groups = Vec::new();
    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        // Same classification the walker applies to subfolders: follow the
        // link one metadata call deep. Broken links are not groups.
        let is_dir = file_type.is_dir()
            || (file_type.is_symlink()
                && fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir()));
        if is_dir {
            groups.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(groups)
}

/// Validate the scan root and open its listing. Shared by group discovery
/// and the walk itself so both fail with the same coded errors.
fn open_root(root: &Path) -> Result<fs::ReadDir> {
    let meta = match fs::metadata(root) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(IaiError::RootNotFound {
                path: root.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(IaiError::RootUnreadable {
                path: root.to_path_buf(),
                details: err.to_string(),
            });
        }
    };
    if !meta.is_dir() {
        return Err(IaiError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|err| IaiError::RootUnreadable {
        path: root.to_path_buf(),
        details: err.to_string(),
    })
}

/// Maximum immediate subdirectory names stored per record. Counting is
/// unaffected; names beyond the cap are simply not remembered.
pub const MAX_CHILD_NAMES: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    fn collect(root: &Path) -> Vec<FolderRecord> {
        TreeWalker::new(root).walk().unwrap().collect()
    }

    #[test]
    fn walks_tree_in_preorder() {
        let tmp = TempDir::new().unwrap();

        // root/
        //   A/
        //     S1/
        //   B/
        fs::create_dir_all(tmp.path().join("A").join("S1")).unwrap();
        fs::create_dir_all(tmp.path().join("B")).unwrap();

        let records = collect(tmp.path());
        let paths: Vec<String> = records.iter().map(FolderRecord::display_path).collect();

        assert_eq!(paths.len(), 4);
        assert_eq!(paths[0], ".");
        let pos_a = paths.iter().position(|p| p == "A").unwrap();
        let pos_s1 = paths.iter().position(|p| p == "A/S1").unwrap();
        // A has a single child, so DFS visits it immediately after A.
        assert_eq!(pos_s1, pos_a + 1);
        assert!(paths.contains(&"B".to_string()));
    }

    #[test]
    fn classifies_direct_files_by_name() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        touch(&tmp.path().join("a.dcm"));
        touch(&tmp.path().join("b.DAT"));
        touch(&tmp.path().join("c.nii.gz"));
        touch(&tmp.path().join("README"));

        let records = collect(tmp.path());
        let root = &records[0];

        assert_eq!(root.depth, 0);
        assert_eq!(root.direct_subfolder_count, 1);
        assert_eq!(root.direct_file_count, 4);
        assert_eq!(root.dicom_count, 1);
        assert_eq!(root.dat_count, 1);
        assert_eq!(root.nifti_count, 1);
        assert_eq!(root.extension_counts.count_of(".dcm"), 1);
        assert_eq!(root.extension_counts.count_of(".dat"), 1);
        assert_eq!(root.extension_counts.count_of(".gz"), 1);
        assert_eq!(root.extension_counts.count_of(""), 1);
        assert_eq!(root.child_subfolder_names, vec!["sub".to_string()]);
    }

    #[test]
    fn depth_matches_segment_count() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a").join("b").join("c")).unwrap();

        let records = collect(tmp.path());
        for record in &records {
            assert_eq!(record.depth, record.rel_path.iter().count());
        }
        assert!(records.iter().any(|r| r.depth == 3));
    }

    #[test]
    fn child_names_are_capped_but_counts_are_not() {
        let tmp = TempDir::new().unwrap();
        for index in 0..12 {
            fs::create_dir(tmp.path().join(format!("sub{index:02}"))).unwrap();
        }

        let records = collect(tmp.path());
        let root = &records[0];
        assert_eq!(root.direct_subfolder_count, 12);
        assert_eq!(root.child_subfolder_names.len(), MAX_CHILD_NAMES);
    }

    #[test]
    fn empty_directory_yields_zero_count_record() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let records = collect(tmp.path());
        let empty = records
            .iter()
            .find(|r| r.display_path() == "empty")
            .unwrap();
        assert_eq!(empty.direct_subfolder_count, 0);
        assert_eq!(empty.direct_file_count, 0);
        assert!(empty.extension_counts.is_empty());
    }

    #[test]
    fn missing_root_fails_before_iteration() {
        let Err(err) = TreeWalker::new("/definitely/does/not/exist").walk() else {
            panic!("walking a missing root must fail");
        };
        assert_eq!(err.code(), "IAI-2001");
    }

    #[test]
    fn file_root_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not_a_dir");
        touch(&file);

        let Err(err) = TreeWalker::new(&file).walk() else {
            panic!("a plain file as root must be rejected");
        };
        assert_eq!(err.code(), "IAI-2002");
    }

    #[test]
    fn clean_walk_skips_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a").join("b")).unwrap();

        let mut walk = TreeWalker::new(tmp.path()).walk().unwrap();
        assert_eq!(walk.by_ref().count(), 3);
        assert!(walk.skipped_subtrees().is_empty());
        assert!(walk.into_skipped().is_empty());
    }

    #[test]
    fn progress_fires_at_multiples() {
        let tmp = TempDir::new().unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }

        let mut ticks: Vec<u64> = Vec::new();
        let count = TreeWalker::new(tmp.path())
            .with_progress(2, |visited| ticks.push(visited))
            .walk()
            .unwrap()
            .count();

        assert_eq!(count, 6);
        assert_eq!(ticks, vec![2, 4, 6]);
    }

    #[test]
    fn zero_progress_interval_disables_reporting() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();

        let mut ticks: Vec<u64> = Vec::new();
        let count = TreeWalker::new(tmp.path())
            .with_progress(0, |visited| ticks.push(visited))
            .walk()
            .unwrap()
            .count();

        assert_eq!(count, 2);
        assert!(ticks.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_counts_without_descending() {
        let tmp = TempDir::new().unwrap();
        let real_dir = tmp.path().join("real");
        fs::create_dir_all(real_dir.join("nested")).unwrap();
        std::os::unix::fs::symlink(&real_dir, tmp.path().join("link")).unwrap();

        let records = collect(tmp.path());
        let root = &records[0];

        assert_eq!(root.direct_subfolder_count, 2);
        assert_eq!(root.direct_file_count, 0);
        assert!(root.child_subfolder_names.contains(&"link".to_string()));
        // The link itself is never visited.
        assert!(records.iter().all(|r| r.display_path() != "link"));
        assert!(records.iter().any(|r| r.display_path() == "real/nested"));
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_counts_as_file() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.dat"), tmp.path().join("dangling.dat"))
            .unwrap();

        let records = collect(tmp.path());
        let root = &records[0];

        assert_eq!(root.direct_subfolder_count, 0);
        assert_eq!(root.direct_file_count, 1);
        // Classification is name-based, so the dangling link still counts
        // toward its extension bucket.
        assert_eq!(root.dat_count, 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file_counts_as_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("real.dcm");
        touch(&target);
        std::os::unix::fs::symlink(&target, tmp.path().join("alias.dcm")).unwrap();

        let records = collect(tmp.path());
        let root = &records[0];
        assert_eq!(root.direct_file_count, 2);
        assert_eq!(root.dicom_count, 2);
    }

    #[test]
    fn discover_groups_lists_only_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("GroupA")).unwrap();
        fs::create_dir(tmp.path().join("GroupB")).unwrap();
        touch(&tmp.path().join("stray.txt"));

        let mut groups = discover_groups(tmp.path()).unwrap();
        groups.sort();
        assert_eq!(groups, vec!["GroupA".to_string(), "GroupB".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn discover_groups_includes_symlinked_directories() {
        let tmp = TempDir::new().unwrap();
        let real_dir = tmp.path().join("real");
        fs::create_dir(&real_dir).unwrap();
        std::os::unix::fs::symlink(&real_dir, tmp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("dangling")).unwrap();

        let mut groups = discover_groups(tmp.path()).unwrap();
        groups.sort();
        assert_eq!(groups, vec!["link".to_string(), "real".to_string()]);
    }

    #[test]
    fn discover_groups_rejects_missing_root() {
        let err = discover_groups(Path::new("/definitely/does/not/exist")).unwrap_err();
        assert_eq!(err.code(), "IAI-2001");
    }
}
