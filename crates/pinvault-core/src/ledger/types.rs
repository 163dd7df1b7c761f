//! Types used by the ledger.

use serde::{Deserialize, Serialize};

use crate::content_hash::ContentHash;

/// Terminal classification of a processed hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Downloaded,
    SkippedTooSmall,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Downloaded => "downloaded",
            Disposition::SkippedTooSmall => "skipped_too_small",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub content_hash: ContentHash,
    pub status: Disposition,
    pub size_bytes: Option<u64>,
    pub saved_filename: Option<String>,
}

/// Optional details attached to a `record` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMeta {
    pub size_bytes: Option<u64>,
    pub saved_filename: Option<String>,
}

impl EntryMeta {
    pub fn downloaded(size_bytes: u64, saved_filename: impl Into<String>) -> Self {
        Self {
            size_bytes: Some(size_bytes),
            saved_filename: Some(saved_filename.into()),
        }
    }

    pub fn too_small(size_bytes: u64) -> Self {
        Self {
            size_bytes: Some(size_bytes),
            saved_filename: None,
        }
    }
}

/// Per-disposition totals, used by the CLI `status` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerCounts {
    pub downloaded: usize,
    pub skipped: usize,
}
