//! Subject processing status derived from raw-data and result-file counts.

use std::fmt;

use serde::Serialize;

/// Processing state of a single subject folder.
///
/// A subject that has produced results (`.mat` files) is `Processed` no matter
/// how much raw data sits beside them. Raw data (`.dat` or `.ima`) without
/// results means `NotProcessed`. Subjects with neither are `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubjectStatus {
    /// Analysis results present (`.mat`).
    #[serde(rename = "Processed")]
    Processed,
    /// Raw data present (`.dat` or `.ima`) but no results.
    #[serde(rename = "Not Processed")]
    NotProcessed,
    /// Neither results nor raw data found.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl SubjectStatus {
    /// Derive the status from per-subject file counts. Results take
    /// precedence over raw data.
    #[must_use]
    pub const fn from_counts(mat_count: u64, dat_count: u64, ima_count: u64) -> Self {
        if mat_count > 0 {
            Self::Processed
        } else if dat_count > 0 || ima_count > 0 {
            Self::NotProcessed
        } else {
            Self::Unknown
        }
    }

    /// Human-readable label as written into report cells.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Processed => "Processed",
            Self::NotProcessed => "Not Processed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
