//! Filesystem-safe sanitization of browser-suggested filenames.

/// Longest name kept, leaving room for the hash prefix and `.part` under NAME_MAX.
const MAX_LEN: usize = 200;

/// Make a browser-suggested filename safe to create in the output directory.
///
/// Separators, NUL, control characters and whitespace become `_`, runs of `_`
/// collapse to one, and leading/trailing `.`/`_` are dropped.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '_' || is_unsafe(c) {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }
    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    truncate_on_char_boundary(trimmed, MAX_LEN).to_string()
}

fn is_unsafe(c: char) -> bool {
    matches!(c, '\0' | '/' | '\\') || c.is_control() || c.is_whitespace()
}

fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}
