//! Per-pin outcomes and classification of browser failures into them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::browser::BrowserError;
use crate::locator::UiStep;

/// Result of one download transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOutcome {
    Downloaded,
    SkippedDuplicate,
    SkippedTooSmall,
    /// The detail view showed no usable image source.
    FailedExtraction,
    /// No locator strategy found a required control.
    #[serde(rename = "failed_ui_element")]
    FailedUIElement,
    /// A bounded wait ran out (image, download event, click).
    FailedTimeout,
    /// The board view could not be re-established. Session-fatal.
    FailedNavigation,
}

impl DownloadOutcome {
    pub const ALL: [DownloadOutcome; 7] = [
        DownloadOutcome::Downloaded,
        DownloadOutcome::SkippedDuplicate,
        DownloadOutcome::SkippedTooSmall,
        DownloadOutcome::FailedExtraction,
        DownloadOutcome::FailedUIElement,
        DownloadOutcome::FailedTimeout,
        DownloadOutcome::FailedNavigation,
    ];

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            DownloadOutcome::FailedExtraction
                | DownloadOutcome::FailedUIElement
                | DownloadOutcome::FailedTimeout
                | DownloadOutcome::FailedNavigation
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownloadOutcome::Downloaded => "downloaded",
            DownloadOutcome::SkippedDuplicate => "skipped_duplicate",
            DownloadOutcome::SkippedTooSmall => "skipped_too_small",
            DownloadOutcome::FailedExtraction => "failed_extraction",
            DownloadOutcome::FailedUIElement => "failed_ui_element",
            DownloadOutcome::FailedTimeout => "failed_timeout",
            DownloadOutcome::FailedNavigation => "failed_navigation",
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a browser error raised while driving `step` to a per-pin outcome.
///
/// Timeouts are always `FailedTimeout`; anything else at a UI step means the
/// control was not usable.
pub fn classify_ui_error(step: UiStep, e: &BrowserError) -> DownloadOutcome {
    tracing::debug!(step = %step, "ui step failed: {}", e);
    match e {
        BrowserError::Timeout { .. } => DownloadOutcome::FailedTimeout,
        BrowserError::NotFound(_)
        | BrowserError::Stale(_)
        | BrowserError::Protocol(_)
        | BrowserError::Closed
        | BrowserError::Io(_) => DownloadOutcome::FailedUIElement,
    }
}

/// Map a browser error raised while reading the detail image.
pub fn classify_extraction_error(e: &BrowserError) -> DownloadOutcome {
    if e.is_timeout() {
        DownloadOutcome::FailedTimeout
    } else {
        DownloadOutcome::FailedExtraction
    }
}
