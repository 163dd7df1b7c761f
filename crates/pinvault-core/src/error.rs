//! Session-fatal errors.
//!
//! Per-pin failures never show up here; they are `DownloadOutcome` values.
//! These are the conditions that end the crawl.

use std::path::PathBuf;
use thiserror::Error;

use crate::browser::BrowserError;

/// Ledger persistence failure.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("read ledger directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The board view could not be (re)established.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("invalid board url {url}: {source}")]
    InvalidBoardUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not open board {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: BrowserError,
    },
    #[error("not back on the board (page is at {current})")]
    LostBoard { current: String },
}

/// Anything that aborts the whole session.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),
    #[error("ledger failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error("output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not capture pins after {attempts} attempts: {source}")]
    PinCapture {
        attempts: u32,
        #[source]
        source: BrowserError,
    },
    #[error("browser closed during the session")]
    BrowserClosed,
}
