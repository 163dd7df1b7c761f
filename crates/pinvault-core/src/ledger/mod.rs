//! Persistent dedup ledger.
//!
//! Maps content hashes to their disposition. Loaded once per session from the
//! JSON store and merged with evidence from the output directory (hash-prefixed
//! image files count as downloaded), then written through to disk after every
//! mutation. Entries are only ever added or upgraded, never removed.

mod reconcile;
mod store;
mod types;

pub use reconcile::scan_output_dir;
pub use store::LedgerDocument;
pub use types::{Disposition, EntryMeta, LedgerCounts, LedgerEntry};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::content_hash::ContentHash;
use crate::error::LedgerError;

/// In-memory ledger bound to its JSON file.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<ContentHash, LedgerEntry>,
}

impl Ledger {
    /// Load the JSON store at `path` and merge hashes found in `output_dir`.
    ///
    /// A missing or corrupt store is treated as empty (never fatal). An output
    /// directory that does not exist yet contributes nothing. Only an unreadable
    /// existing directory is an error.
    pub fn load(path: &Path, output_dir: &Path) -> Result<Self, LedgerError> {
        let doc = store::read_or_empty(path);
        let mut entries = doc.into_entries();
        let from_json = entries.len();

        let mut inferred = 0usize;
        for (hash, filename) in scan_output_dir(output_dir)? {
            match entries.get_mut(&hash) {
                Some(e) if e.status == Disposition::Downloaded => {
                    if e.saved_filename.is_none() {
                        e.saved_filename = Some(filename);
                    }
                }
                // File on disk beats any other recorded disposition.
                Some(e) => {
                    e.status = Disposition::Downloaded;
                    e.saved_filename = Some(filename);
                    inferred += 1;
                }
                None => {
                    entries.insert(
                        hash.clone(),
                        LedgerEntry {
                            content_hash: hash,
                            status: Disposition::Downloaded,
                            size_bytes: None,
                            saved_filename: Some(filename),
                        },
                    );
                    inferred += 1;
                }
            }
        }

        tracing::info!(
            path = %path.display(),
            "ledger loaded: {} from store, {} inferred from files",
            from_json,
            inferred
        );
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lookup(&self, hash: &ContentHash) -> Option<Disposition> {
        self.entries.get(hash).map(|e| e.status)
    }

    pub fn entry(&self, hash: &ContentHash) -> Option<&LedgerEntry> {
        self.entries.get(hash)
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> LedgerCounts {
        let mut c = LedgerCounts::default();
        for e in self.entries.values() {
            match e.status {
                Disposition::Downloaded => c.downloaded += 1,
                Disposition::SkippedTooSmall => c.skipped += 1,
            }
        }
        c
    }

    /// Record a disposition and persist immediately.
    ///
    /// `Downloaded` is never downgraded; recording `SkippedTooSmall` for an
    /// already downloaded hash leaves the entry as it is.
    pub fn record(
        &mut self,
        hash: &ContentHash,
        status: Disposition,
        meta: EntryMeta,
    ) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .entry(hash.clone())
            .or_insert_with(|| LedgerEntry {
                content_hash: hash.clone(),
                status,
                size_bytes: None,
                saved_filename: None,
            });
        if entry.status == Disposition::Downloaded && status == Disposition::SkippedTooSmall {
            tracing::debug!(hash = %hash, "ignoring downgrade of downloaded entry");
        } else {
            entry.status = status;
            if meta.size_bytes.is_some() {
                entry.size_bytes = meta.size_bytes;
            }
            if meta.saved_filename.is_some() {
                entry.saved_filename = meta.saved_filename;
            }
        }
        self.persist()
    }

    /// Write the current mapping to disk (atomic replace).
    pub fn persist(&self) -> Result<(), LedgerError> {
        let doc = LedgerDocument::from_entries(self.entries.values());
        store::write_atomic(&self.path, &doc)
    }
}
