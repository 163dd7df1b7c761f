//! URL modeling and filename derivation.
//!
//! Derives the permanent filename of a committed image and decides whether the
//! page is currently showing the board.

mod board;
mod sanitize;

pub use board::BoardUrl;
pub use sanitize::sanitize_filename;

use crate::content_hash::ContentHash;

/// Default name when the browser's suggested filename is empty or unusable.
const DEFAULT_FILENAME: &str = "image.jpg";

/// Permanent name for a committed download: `{hash}_{sanitized suggested name}`.
///
/// # Examples
///
/// - hash `abc123`, suggested `"cat photo.jpg"` -> `"abc123_cat_photo.jpg"`
/// - hash `abc123`, suggested `""` -> `"abc123_image.jpg"`
pub fn saved_filename(hash: &ContentHash, suggested: &str) -> String {
    let sanitized = sanitize_filename(suggested);
    let name = if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME
    } else {
        sanitized.as_str()
    };
    format!("{}_{}", hash, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_hash::hash_from_filename;

    #[test]
    fn saved_filename_prefixes_hash() {
        let h = ContentHash::from_raw("abc123");
        assert_eq!(saved_filename(&h, "cat photo.jpg"), "abc123_cat_photo.jpg");
        assert_eq!(saved_filename(&h, "x/../y.png"), "abc123_x_.._y.png");
    }

    #[test]
    fn saved_filename_fallback() {
        let h = ContentHash::from_raw("abc123");
        assert_eq!(saved_filename(&h, ""), "abc123_image.jpg");
        assert_eq!(saved_filename(&h, " .. "), "abc123_image.jpg");
    }

    #[test]
    fn saved_filename_reads_back_as_same_hash() {
        let h = ContentHash::from_raw("0f1e2d3c4b5a");
        let name = saved_filename(&h, "pin_original.jpg");
        assert_eq!(hash_from_filename(&name), Some(h));
    }
}
