//! JSON document format and atomic writes.
//!
//! ```json
//! { "downloaded": ["abc123…", …], "skipped": ["def456…", …],
//!   "details": { "abc123…": { "size_bytes": 102400, "saved_filename": "abc123…_x.jpg" } } }
//! ```
//!
//! The two lists are sets serialized in sorted order; `details` is optional.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use super::types::{Disposition, LedgerEntry};
use crate::content_hash::ContentHash;
use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_filename: Option<String>,
}

impl EntryDetails {
    fn is_empty(&self) -> bool {
        self.size_bytes.is_none() && self.saved_filename.is_none()
    }
}

/// On-disk ledger document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub downloaded: BTreeSet<ContentHash>,
    #[serde(default)]
    pub skipped: BTreeSet<ContentHash>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<ContentHash, EntryDetails>,
}

impl LedgerDocument {
    pub fn from_entries<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Self {
        let mut doc = LedgerDocument::default();
        for e in entries {
            match e.status {
                Disposition::Downloaded => doc.downloaded.insert(e.content_hash.clone()),
                Disposition::SkippedTooSmall => doc.skipped.insert(e.content_hash.clone()),
            };
            let details = EntryDetails {
                size_bytes: e.size_bytes,
                saved_filename: e.saved_filename.clone(),
            };
            if !details.is_empty() {
                doc.details.insert(e.content_hash.clone(), details);
            }
        }
        doc
    }

    /// A hash listed in both sets is treated as downloaded.
    pub fn into_entries(mut self) -> BTreeMap<ContentHash, LedgerEntry> {
        let mut out = BTreeMap::new();
        for (hash, status) in self
            .skipped
            .into_iter()
            .map(|h| (h, Disposition::SkippedTooSmall))
            .chain(self.downloaded.into_iter().map(|h| (h, Disposition::Downloaded)))
        {
            let details = self.details.remove(&hash).unwrap_or_default();
            out.insert(
                hash.clone(),
                LedgerEntry {
                    content_hash: hash,
                    status,
                    size_bytes: details.size_bytes,
                    saved_filename: details.saved_filename,
                },
            );
        }
        out
    }
}

/// Read the document at `path`. Missing, unreadable or corrupt files yield an empty document.
pub(super) fn read_or_empty(path: &Path) -> LedgerDocument {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LedgerDocument::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ledger unreadable, starting empty: {}", e);
            return LedgerDocument::default();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ledger corrupt, starting empty: {}", e);
            LedgerDocument::default()
        }
    }
}

/// Serialize to a temp file next to `path`, fsync, then rename over `path`.
pub(super) fn write_atomic(path: &Path, doc: &LedgerDocument) -> Result<(), LedgerError> {
    let write_err = |source: std::io::Error| LedgerError::Write {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_vec_pretty(doc)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
