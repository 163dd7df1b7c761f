//! Filesystem evidence: hash-prefixed images already in the output directory.

use std::path::Path;

use crate::content_hash::{hash_from_filename, ContentHash};
use crate::error::LedgerError;

/// `(hash, filename)` for every finished image in `dir`.
/// A directory that does not exist yet yields nothing.
pub fn scan_output_dir(dir: &Path) -> Result<Vec<(ContentHash, String)>, LedgerError> {
    let scan_err = |source| LedgerError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let read = match std::fs::read_dir(dir) {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(scan_err(e)),
    };
    let mut found = Vec::new();
    for entry in read {
        let entry = entry.map_err(scan_err)?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if let Some(hash) = hash_from_filename(&name) {
            found.push((hash, name));
        }
    }
    found.sort();
    Ok(found)
}
