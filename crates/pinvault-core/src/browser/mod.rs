//! Browser capability consumed by the crawl.
//!
//! The core owns none of the browser lifecycle (launch, profile, login); an
//! embedder hands in something implementing [`BrowserSession`] that drives one
//! already-open page. Element handles are opaque ids scoped to that page and go
//! stale whenever the page re-renders.

mod error;

pub use error::BrowserError;

use async_trait::async_trait;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Opaque reference to a rendered element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

/// Opaque reference to an open page/tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(pub String);

/// A download started by a UI action, not yet saved anywhere.
#[async_trait]
pub trait PendingDownload: Send {
    /// Filename proposed by the site.
    fn suggested_name(&self) -> String;

    /// Write the downloaded bytes to `path`.
    async fn save_as(&mut self, path: &Path) -> Result<(), BrowserError>;
}

/// Operations on the single page the crawl drives.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// All elements currently matching `selector`, in document order.
    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Descendants of `parent` matching `selector`.
    async fn locate_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Wait until a visible element matches `selector`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    async fn press_key(&self, key: &str) -> Result<(), BrowserError>;

    /// Click `action` and wait for the resulting download to start.
    async fn trigger_download(
        &self,
        action: &ElementHandle,
        timeout: Duration,
    ) -> Result<Box<dyn PendingDownload>, BrowserError>;

    async fn go_back(&self, timeout: Duration) -> Result<(), BrowserError>;

    /// The page the crawl drives.
    fn primary_page(&self) -> PageId;

    async fn list_open_pages(&self) -> Result<Vec<PageId>, BrowserError>;

    async fn close_page(&self, page: &PageId) -> Result<(), BrowserError>;

    async fn bring_to_front(&self, page: &PageId) -> Result<(), BrowserError>;

    /// Release the browser. Called once when the session ends.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Run `fut` with an upper bound; elapsed time becomes `BrowserError::Timeout`.
pub async fn bounded<T, F>(what: &str, limit: Duration, fut: F) -> Result<T, BrowserError>
where
    F: Future<Output = Result<T, BrowserError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(r) => r,
        Err(_) => Err(BrowserError::Timeout {
            what: what.to_string(),
            after: limit,
        }),
    }
}

/// Vertical scroll offset of the page, 0.0 when it cannot be read.
pub async fn scroll_offset(session: &dyn BrowserSession, limit: Duration) -> f64 {
    match bounded("read scroll offset", limit, session.evaluate("window.scrollY")).await {
        Ok(v) => v.as_f64().unwrap_or(0.0),
        Err(e) => {
            tracing::debug!("scroll offset unavailable: {}", e);
            0.0
        }
    }
}

/// Close every page except the primary one and focus the primary page again.
/// Popups opened by ads or stray clicks would otherwise steal input.
pub async fn close_stray_pages(
    session: &dyn BrowserSession,
    limit: Duration,
) -> Result<usize, BrowserError> {
    let primary = session.primary_page();
    let pages = bounded("list pages", limit, session.list_open_pages()).await?;
    let mut closed = 0;
    for page in pages.iter().filter(|p| **p != primary) {
        tracing::warn!(page = %page.0, "closing unexpected tab");
        bounded("close tab", limit, session.close_page(page)).await?;
        closed += 1;
    }
    if closed > 0 {
        bounded("focus primary page", limit, session.bring_to_front(&primary)).await?;
    }
    Ok(closed)
}
