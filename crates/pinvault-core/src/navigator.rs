//! Opening the board and getting back to it after each pin.

use std::time::Duration;

use crate::browser::{bounded, close_stray_pages, BrowserError, BrowserSession};
use crate::config::{ScrollSettings, Timeouts};
use crate::error::NavigationError;
use crate::locator::{Locator, LocatorChain, ResolveError, UiStep};
use crate::pacing::Pacing;
use crate::url_model::BoardUrl;

/// Which rung of the recovery ladder got us back to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPath {
    CloseControl,
    EscapeKey,
    HistoryBack,
    Renavigated,
}

/// Capped exponential backoff between board open attempts.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(8),
        }
    }
}

impl Backoff {
    /// Delay after failed `attempt` (1-based): base * 2^(attempt-1), capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        self.base.saturating_mul(exp).min(self.max)
    }
}

/// Knows the board URL and how to get back to it.
#[derive(Debug, Clone)]
pub struct PageNavigator {
    board: BoardUrl,
    pin_selector: String,
    close: Vec<Locator>,
    timeouts: Timeouts,
    open_attempts: u32,
    backoff: Backoff,
    pacing: Pacing,
}

impl PageNavigator {
    pub fn new(
        board_url: &str,
        pin_selector: &str,
        close: Vec<Locator>,
        timeouts: Timeouts,
        scroll: &ScrollSettings,
        pacing: Pacing,
    ) -> Result<Self, NavigationError> {
        let board = BoardUrl::parse(board_url).map_err(|source| NavigationError::InvalidBoardUrl {
            url: board_url.to_string(),
            source,
        })?;
        Ok(Self {
            board,
            pin_selector: pin_selector.to_string(),
            close,
            timeouts,
            open_attempts: scroll.open_attempts.max(1),
            backoff: Backoff::default(),
            pacing,
        })
    }

    /// Navigate to the board, retrying transient failures, and wait for the pin grid.
    pub async fn open_board(&self, session: &dyn BrowserSession) -> Result<(), NavigationError> {
        let url = self.board.as_str();
        let mut attempt = 1u32;
        loop {
            match session.navigate(url, self.timeouts.navigation()).await {
                Ok(()) => break,
                Err(BrowserError::Closed) => {
                    return Err(NavigationError::Open {
                        url: url.to_string(),
                        source: BrowserError::Closed,
                    })
                }
                Err(e) if attempt < self.open_attempts => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(attempt, "opening board failed, retrying in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(NavigationError::Open {
                        url: url.to_string(),
                        source: e,
                    })
                }
            }
        }

        let current = self.current_url(session).await;
        if !self.board.matches(&current) {
            return Err(NavigationError::LostBoard { current });
        }
        if let Err(e) = session.wait_for(&self.pin_selector, self.timeouts.board_ready()).await {
            // An empty board is legal; enumeration will simply find nothing.
            tracing::warn!("no pins rendered on board yet: {}", e);
        }
        self.pacing.settle().await;
        tracing::info!(board = %url, "board opened");
        Ok(())
    }

    /// Re-establish the board view after a transaction, restoring `scroll_y`.
    ///
    /// Tries, in order: the close control, Escape, history back, and a fresh
    /// navigation to the board URL. Each rung is verified against the board URL.
    pub async fn return_to_board(
        &self,
        session: &dyn BrowserSession,
        scroll_y: f64,
    ) -> Result<ReturnPath, NavigationError> {
        if let Err(e) = close_stray_pages(session, self.timeouts.action()).await {
            tracing::warn!("could not clean up stray tabs: {}", e);
        }

        let path = self.ladder(session).await?;
        if path != ReturnPath::CloseControl {
            tracing::debug!(?path, "returned to board via fallback");
        }
        if scroll_y > 0.0 {
            let script = format!("window.scrollTo(0, {})", scroll_y);
            if let Err(e) = bounded("restore scroll", self.timeouts.action(), session.evaluate(&script)).await {
                tracing::debug!("scroll restore failed: {}", e);
            }
        }
        Ok(path)
    }

    async fn ladder(&self, session: &dyn BrowserSession) -> Result<ReturnPath, NavigationError> {
        let chain = LocatorChain::new(UiStep::Close, &self.close);
        match chain.resolve(session, self.timeouts.locator()).await {
            Ok(el) => {
                if let Err(e) = bounded("click close", self.timeouts.action(), session.click(&el)).await {
                    tracing::debug!("close click failed: {}", e);
                }
                if self.settled_on_board(session).await {
                    return Ok(ReturnPath::CloseControl);
                }
            }
            Err(ResolveError::Browser(_)) => return Err(self.lost(session).await),
            Err(ResolveError::Unresolved(u)) => tracing::debug!("{}", u),
        }

        if let Err(e) = bounded("press Escape", self.timeouts.action(), session.press_key("Escape")).await {
            tracing::debug!("escape failed: {}", e);
        }
        if self.settled_on_board(session).await {
            return Ok(ReturnPath::EscapeKey);
        }

        if let Err(e) = session.go_back(self.timeouts.navigation()).await {
            tracing::debug!("history back failed: {}", e);
        }
        if self.settled_on_board(session).await {
            return Ok(ReturnPath::HistoryBack);
        }

        match session.navigate(self.board.as_str(), self.timeouts.navigation()).await {
            Ok(()) => {
                if self.on_board(session).await {
                    if let Err(e) = session.wait_for(&self.pin_selector, self.timeouts.board_ready()).await {
                        tracing::warn!("board reloaded but pins not rendered: {}", e);
                    }
                    return Ok(ReturnPath::Renavigated);
                }
            }
            Err(e) => tracing::warn!("re-navigation to board failed: {}", e),
        }
        Err(self.lost(session).await)
    }

    async fn settled_on_board(&self, session: &dyn BrowserSession) -> bool {
        self.pacing.settle().await;
        self.on_board(session).await
    }

    /// True when the page URL is the board URL.
    pub async fn on_board(&self, session: &dyn BrowserSession) -> bool {
        self.board.matches(&self.current_url(session).await)
    }

    async fn current_url(&self, session: &dyn BrowserSession) -> String {
        bounded("read url", self.timeouts.action(), session.current_url())
            .await
            .unwrap_or_else(|e| format!("<unknown: {e}>"))
    }

    async fn lost(&self, session: &dyn BrowserSession) -> NavigationError {
        NavigationError::LostBoard {
            current: self.current_url(session).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_is_capped() {
        let b = Backoff::default();
        assert_eq!(b.delay(1), Duration::from_millis(500));
        assert_eq!(b.delay(2), Duration::from_secs(1));
        assert_eq!(b.delay(3), Duration::from_secs(2));
        assert_eq!(b.delay(20), Duration::from_secs(8));
    }

    #[test]
    fn invalid_board_url_is_a_navigation_error() {
        let err = PageNavigator::new(
            "board please",
            "[data-test-id=\"pin\"]",
            Vec::new(),
            Timeouts::default(),
            &ScrollSettings::default(),
            Pacing::immediate(),
        )
        .unwrap_err();
        assert!(matches!(err, NavigationError::InvalidBoardUrl { .. }));
    }
}
