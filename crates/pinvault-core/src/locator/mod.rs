//! Ordered locator strategies for UI controls.
//!
//! Each control the crawl clicks (menu button, download action, close button)
//! has a list of alternative ways to find it. They are tried in order and the
//! first one that resolves to a visible element wins.

mod profile;

pub use profile::SiteProfile;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::browser::{bounded, BrowserError, BrowserSession, ElementHandle};

/// UI step a locator chain belongs to; carried in failures for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiStep {
    OpenDetail,
    Menu,
    DownloadAction,
    Close,
}

impl fmt::Display for UiStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UiStep::OpenDetail => "open detail",
            UiStep::Menu => "menu button",
            UiStep::DownloadAction => "download action",
            UiStep::Close => "close control",
        };
        f.write_str(s)
    }
}

/// One way of finding a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// Raw CSS selector.
    Css(String),
    /// Element whose `aria-label` equals the value.
    AriaLabel(String),
    /// Element whose `data-test-id` equals the value.
    TestId(String),
    /// Element whose visible text is exactly the value.
    Text(String),
    /// `tag` element whose text contains `text`.
    TagWithText { tag: String, text: String },
}

impl Locator {
    pub fn aria_label(s: &str) -> Self {
        Locator::AriaLabel(s.to_string())
    }

    pub fn test_id(s: &str) -> Self {
        Locator::TestId(s.to_string())
    }

    pub fn text(s: &str) -> Self {
        Locator::Text(s.to_string())
    }

    pub fn tag_with_text(tag: &str, text: &str) -> Self {
        Locator::TagWithText {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    /// Selector string in the engine syntax the session understands
    /// (CSS plus `text="…"` and `:has-text("…")`).
    pub fn selector(&self) -> String {
        match self {
            Locator::Css(s) => s.clone(),
            Locator::AriaLabel(v) => format!("[aria-label=\"{}\"]", escape(v)),
            Locator::TestId(v) => format!("[data-test-id=\"{}\"]", escape(v)),
            Locator::Text(v) => format!("text=\"{}\"", escape(v)),
            Locator::TagWithText { tag, text } => format!("{}:has-text(\"{}\")", tag, escape(text)),
        }
    }
}

fn escape(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Every strategy of a chain failed to produce a visible element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub step: UiStep,
    pub tried: usize,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not found ({} strategies tried)", self.step, self.tried)
    }
}

impl std::error::Error for Unresolved {}

/// Why a chain did not resolve.
#[derive(Debug)]
pub enum ResolveError {
    Unresolved(Unresolved),
    /// The browser itself went away; no point trying further strategies.
    Browser(BrowserError),
}

/// Ordered alternatives for one UI step.
#[derive(Debug, Clone)]
pub struct LocatorChain<'a> {
    pub step: UiStep,
    pub strategies: &'a [Locator],
}

impl<'a> LocatorChain<'a> {
    pub fn new(step: UiStep, strategies: &'a [Locator]) -> Self {
        Self { step, strategies }
    }

    /// First strategy whose selector becomes visible within `per_strategy` wins.
    pub async fn resolve(
        &self,
        session: &dyn BrowserSession,
        per_strategy: Duration,
    ) -> Result<ElementHandle, ResolveError> {
        for (idx, locator) in self.strategies.iter().enumerate() {
            let selector = locator.selector();
            match session.wait_for(&selector, per_strategy).await {
                Ok(()) => {}
                Err(BrowserError::Closed) => return Err(ResolveError::Browser(BrowserError::Closed)),
                Err(e) => {
                    tracing::debug!(step = %self.step, selector = %selector, "strategy {} missed: {}", idx, e);
                    continue;
                }
            }
            match bounded("locate", per_strategy, session.locate(&selector)).await {
                Ok(found) => {
                    if let Some(el) = found.into_iter().next() {
                        if idx > 0 {
                            tracing::debug!(step = %self.step, selector = %selector, "resolved by fallback strategy {}", idx);
                        }
                        return Ok(el);
                    }
                }
                Err(BrowserError::Closed) => return Err(ResolveError::Browser(BrowserError::Closed)),
                Err(e) => tracing::debug!(step = %self.step, selector = %selector, "locate failed: {}", e),
            }
        }
        Err(ResolveError::Unresolved(Unresolved {
            step: self.step,
            tried: self.strategies.len(),
        }))
    }
}
