//! Content hash: the dedup key for images.
//!
//! The hash is a fingerprint of the image's source URL, not of its pixels, so two
//! URLs serving the same bytes are distinct keys.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 12;

/// Image extensions that count as evidence of a finished download.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Short lowercase-hex fingerprint of an image source URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already computed hash (e.g. read back from the ledger or a filename).
    pub fn from_raw(s: impl Into<String>) -> Self {
        ContentHash(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// What the detail view tells us about an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub source_url: String,
}

impl ImageDescriptor {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }

    pub fn content_hash(&self) -> ContentHash {
        fingerprint(&self.source_url)
    }
}

/// MD5 of the URL string, hex-encoded and truncated to `HASH_LEN`. Files named
/// `{hash}_*` by other downloaders using the same scheme reconcile to the same key.
pub fn fingerprint(source_url: &str) -> ContentHash {
    let digest = Md5::digest(source_url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    ContentHash(hex)
}

/// Hash encoded in an output filename, if the file is a finished image.
///
/// `abc123_photo.jpg` yields `abc123`; a name without `_` yields its stem.
/// Non-image files (temporaries, the ledger itself) yield `None`.
pub fn hash_from_filename(name: &str) -> Option<ContentHash> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    let prefix = match name.split_once('_') {
        Some((head, _)) => head,
        None => Path::new(name).file_stem()?.to_str()?,
    };
    if prefix.is_empty() {
        return None;
    }
    Some(ContentHash(prefix.to_string()))
}
