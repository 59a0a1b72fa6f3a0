//! File-kind classification from names alone: normalized extensions plus
//! DICOM, DAT, and compound-suffix NIfTI detection.
//!
//! Everything in this module is pure string logic. No entry is ever opened
//! or stat'd here; the walker hands over bare file names and the classifier
//! answers from those alone.

#![allow(missing_docs)]

/// Extensions counted as DICOM imagery.
pub const DICOM_EXTENSIONS: [&str; 2] = [".dcm", ".ima"];

/// Extension counted as raw scanner data.
pub const DAT_EXTENSION: &str = ".dat";

/// Classification of a single file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKind {
    /// Normalized extension: lowercase, leading dot kept, `""` when absent.
    pub extension: String,
    pub is_dicom: bool,
    pub is_dat: bool,
    pub is_nifti: bool,
}

/// Classify a file name into its extension bucket and format flags.
///
/// The buckets are mutually exclusive: DICOM and DAT key on the final
/// extension, and a NIfTI name always normalizes to `.nii` or `.gz`, so no
/// single name can land in two buckets. NIfTI detection runs against the
/// full compound suffix (`scan.nii.gz` matches, a bare `.gz` archive does
/// not).
#[must_use]
pub fn classify(file_name: &str) -> FileKind {
    let extension = normalized_extension(file_name);
    let is_dicom = DICOM_EXTENSIONS.contains(&extension.as_str());
    let is_dat = extension == DAT_EXTENSION;
    let is_nifti = is_nifti_filename(file_name);
    FileKind {
        extension,
        is_dicom,
        is_dat,
        is_nifti,
    }
}

/// Normalized extension of a file name: the suffix from the final dot,
/// lowercased, with the dot kept. Names without an extension (including
/// dotfiles like `.bashrc`) normalize to the empty string.
#[must_use]
pub fn normalized_extension(file_name: &str) -> String {
    let Some(last_dot) = file_name.rfind('.') else {
        return String::new();
    };
    // A dot run at the start of the name belongs to the stem, not an extension.
    if file_name[..last_dot].chars().all(|c| c == '.') {
        return String::new();
    }
    file_name[last_dot..].to_lowercase()
}

/// Whether a file name is NIfTI imagery (`.nii`, optionally gzip-compressed).
///
/// The check runs against the full compound suffix so `scan.nii.gz` matches
/// while a plain `.gz` archive or a dotfile named `.nii` does not.
#[must_use]
pub fn is_nifti_filename(file_name: &str) -> bool {
    let suffix = compound_suffix(file_name);
    suffix.ends_with(".nii") || suffix.ends_with(".nii.gz")
}

/// Full chain of suffixes after the stem, lowercased: `a.nii.gz` yields
/// `.nii.gz`, `archive.tar.gz` yields `.tar.gz`, `.hidden` yields `""`.
fn compound_suffix(file_name: &str) -> String {
    let trimmed = file_name.trim_start_matches('.');
    match trimmed.split_once('.') {
        Some((_, rest)) => format!(".{rest}").to_lowercase(),
        None => String::new(),
    }
}
