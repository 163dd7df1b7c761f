//! Errors reported by a `BrowserSession`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// A bounded wait or call ran out of time.
    #[error("timed out after {after:?}: {what}")]
    Timeout { what: String, after: Duration },
    /// Nothing matched a selector.
    #[error("no element matches {0}")]
    NotFound(String),
    /// The element handle no longer refers to a rendered node.
    #[error("stale element handle {0}")]
    Stale(String),
    /// The browser rejected or failed a command.
    #[error("browser protocol error: {0}")]
    Protocol(String),
    /// The page or browser is gone.
    #[error("browser closed")]
    Closed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}
