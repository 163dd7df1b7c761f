//! Incremental pin discovery under infinite scroll.
//!
//! Rendering is virtualized: the board recycles DOM nodes as it scrolls, so
//! handles are recaptured before every pick and never reused. Termination is
//! by progressive disclosure: a scroll pass that surfaces no pin not already
//! seen this session ends the enumeration.

use std::collections::HashSet;
use std::fmt;

use crate::browser::{bounded, scroll_offset, BrowserError, BrowserSession, ElementHandle};
use crate::config::{ScrollSettings, SessionConfig, Timeouts};
use crate::content_hash::{fingerprint, ContentHash};
use crate::error::CrawlError;
use crate::ledger::Ledger;
use crate::locator::SiteProfile;
use crate::navigator::{Backoff, PageNavigator};
use crate::outcome::DownloadOutcome;
use crate::pacing::Pacing;
use crate::report::{SessionEnd, SessionReport};
use crate::transaction::{DownloadTransaction, TransactionSettings};

/// Session-local identity of a pin card (hash of its link, else of its thumbnail).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinKey(ContentHash);

impl PinKey {
    pub fn from_identity(identity: &str) -> Self {
        PinKey(fingerprint(identity))
    }
}

impl fmt::Display for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A rendered pin as of the latest capture. Valid only until the next scroll
/// or transaction; deliberately not `Clone`.
#[derive(Debug)]
pub struct PinHandle {
    pub element: ElementHandle,
    pub key: PinKey,
    /// Page scroll offset when the pin was captured.
    pub scroll_y: f64,
}

/// Drives discovery and hands each newly seen pin to a `DownloadTransaction`.
pub struct PinEnumerator {
    seen: HashSet<PinKey>,
    scroll: ScrollSettings,
    site: SiteProfile,
    timeouts: Timeouts,
    pacing: Pacing,
    backoff: Backoff,
}

impl PinEnumerator {
    pub fn new(scroll: ScrollSettings, site: SiteProfile, timeouts: Timeouts, pacing: Pacing) -> Self {
        Self {
            seen: HashSet::new(),
            scroll,
            site,
            timeouts,
            pacing,
            backoff: Backoff::default(),
        }
    }

    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self::new(cfg.scroll.clone(), cfg.site.clone(), cfg.timeouts.clone(), cfg.pacing)
    }

    /// Single forward pass over the board. Every outcome is tallied in `report`;
    /// session-fatal errors are returned after the failing pin is tallied.
    pub async fn run(
        &mut self,
        session: &dyn BrowserSession,
        navigator: &PageNavigator,
        settings: &TransactionSettings,
        ledger: &mut Ledger,
        report: &mut SessionReport,
    ) -> Result<SessionEnd, CrawlError> {
        let mut iteration = 0u32;
        loop {
            let mut found_new = 0usize;
            while let Some(pin) = self.next_unseen(session).await? {
                self.seen.insert(pin.key.clone());
                found_new += 1;
                match DownloadTransaction::new(settings, pin).run(session, navigator, ledger).await {
                    Ok(outcome) => report.record(outcome),
                    Err(e) => {
                        if matches!(e, CrawlError::Navigation(_)) {
                            report.record(DownloadOutcome::FailedNavigation);
                        }
                        return Err(e);
                    }
                }
            }

            iteration += 1;
            tracing::debug!(iteration, new = found_new, seen = self.seen.len(), "scroll pass done");
            if found_new == 0 {
                tracing::info!(pins = self.seen.len(), "no new pins surfaced, enumeration finished");
                return Ok(SessionEnd::Exhausted);
            }
            if iteration >= self.scroll.max_iterations {
                tracing::warn!(
                    iterations = iteration,
                    pins = self.seen.len(),
                    "scroll iteration limit reached, stopping with a partial result"
                );
                return Ok(SessionEnd::IterationLimit);
            }
            self.scroll_forward(session).await;
        }
    }

    /// Recapture the rendered pins and return the first one not seen this session.
    async fn next_unseen(&self, session: &dyn BrowserSession) -> Result<Option<PinHandle>, CrawlError> {
        let handles = self.capture(session).await?;
        let scroll_y = scroll_offset(session, self.timeouts.action()).await;
        for element in handles {
            let Some(identity) = self.read_identity(session, &element).await else {
                continue;
            };
            let key = PinKey::from_identity(&identity);
            if !self.seen.contains(&key) {
                return Ok(Some(PinHandle {
                    element,
                    key,
                    scroll_y,
                }));
            }
        }
        Ok(None)
    }

    /// Rendered pin handles, retried with backoff. A capture that keeps failing
    /// is an error, never an empty board.
    async fn capture(&self, session: &dyn BrowserSession) -> Result<Vec<ElementHandle>, CrawlError> {
        let attempts = self.scroll.capture_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match bounded("capture pins", self.timeouts.action(), session.locate(&self.site.pin)).await {
                Ok(handles) => return Ok(handles),
                Err(BrowserError::Closed) => return Err(CrawlError::BrowserClosed),
                Err(e) if attempt < attempts => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(attempt, "pin capture failed, retrying in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => return Err(CrawlError::PinCapture { attempts, source }),
            }
        }
    }

    /// Cheap identity read without opening the detail view: pin link, else thumbnail src.
    async fn read_identity(&self, session: &dyn BrowserSession, pin: &ElementHandle) -> Option<String> {
        let sources = [
            (self.site.pin_link.as_str(), "href"),
            (self.site.pin_thumbnail.as_str(), "src"),
        ];
        for (selector, attr) in sources {
            let found = match bounded("read pin", self.timeouts.action(), session.locate_within(pin, selector)).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::debug!(pin = %pin.0, "pin unreadable: {}", e);
                    return None;
                }
            };
            let Some(child) = found.first() else {
                continue;
            };
            match bounded("read pin", self.timeouts.action(), session.attribute(child, attr)).await {
                Ok(Some(v)) if !v.trim().is_empty() => return Some(v.trim().to_string()),
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(pin = %pin.0, "pin unreadable: {}", e);
                    return None;
                }
            }
        }
        None
    }

    async fn scroll_forward(&self, session: &dyn BrowserSession) {
        let script = format!(
            "window.scrollBy(0, window.innerHeight * {})",
            self.scroll.viewport_fraction
        );
        if let Err(e) = bounded("scroll", self.timeouts.action(), session.evaluate(&script)).await {
            tracing::warn!("scroll failed: {}", e);
        }
        if let Err(e) = session.wait_for(&self.site.pin, self.timeouts.board_ready()).await {
            tracing::debug!("no pins visible after scroll: {}", e);
        }
        self.pacing.settle().await;
    }
}
