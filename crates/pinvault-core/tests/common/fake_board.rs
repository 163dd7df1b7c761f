//! Scripted in-memory board implementing `BrowserSession`.
//!
//! Renders a sliding window of pins (virtualized), opens a detail view on
//! click, shows a menu and a download action, and can be told to misbehave:
//! missing controls, images that never load, popups, a board view that can't
//! be re-established, downloads that hang mid-save.

use async_trait::async_trait;
use pinvault_core::browser::{BrowserError, BrowserSession, ElementHandle, PageId, PendingDownload};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub const BOARD_URL: &str = "https://www.pinterest.com/someone/cats/";
pub const LOGIN_URL: &str = "https://www.pinterest.com/login/";
pub const ROW_HEIGHT: f64 = 400.0;

const PIN_SELECTOR: &str = r#"[data-test-id="pin"]"#;
const PIN_LINK_SELECTOR: &str = r#"a[href*="/pin/"]"#;
const DETAIL_IMAGE_SELECTOR: &str = r#"img[src*="pinimg"]"#;

#[derive(Debug, Clone)]
pub struct FakePin {
    pub link: Option<String>,
    pub thumbnail: String,
    pub detail_src: Option<String>,
    pub size: usize,
    pub suggested_name: String,
    pub has_download_action: bool,
    pub image_appears: bool,
    pub opens_popup: bool,
    pub loses_board: bool,
    pub hangs_on_save: bool,
    /// Save produces an undeletable directory instead of a file.
    pub saves_as_directory: bool,
}

impl FakePin {
    pub fn new(id: usize, size: usize) -> Self {
        Self {
            link: Some(format!("https://www.pinterest.com/pin/{id}/")),
            thumbnail: format!("https://i.pinimg.com/236x/{id}.jpg"),
            detail_src: Some(format!("https://i.pinimg.com/originals/{id}.jpg")),
            size,
            suggested_name: format!("pin-{id}.jpg"),
            has_download_action: true,
            image_appears: true,
            opens_popup: false,
            loses_board: false,
            hangs_on_save: false,
            saves_as_directory: false,
        }
    }

    pub fn detail_src(mut self, src: &str) -> Self {
        self.detail_src = Some(src.to_string());
        self
    }

    pub fn no_detail_src(mut self) -> Self {
        self.detail_src = None;
        self
    }

    pub fn without_link(mut self) -> Self {
        self.link = None;
        self
    }

    pub fn without_download_action(mut self) -> Self {
        self.has_download_action = false;
        self
    }

    pub fn image_never_loads(mut self) -> Self {
        self.image_appears = false;
        self
    }

    pub fn opens_popup(mut self) -> Self {
        self.opens_popup = true;
        self
    }

    pub fn loses_board(mut self) -> Self {
        self.loses_board = true;
        self
    }

    pub fn hangs_on_save(mut self) -> Self {
        self.hangs_on_save = true;
        self
    }

    pub fn saves_as_directory(mut self) -> Self {
        self.saves_as_directory = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeOptions {
    /// Pins rendered at once.
    pub window: usize,
    pub menu_selector: String,
    pub download_selector: String,
    /// `None` means the detail view has no close control at all.
    pub close_selector: Option<String>,
    pub escape_closes: bool,
    pub back_closes: bool,
    /// Leading pin captures that fail with a protocol error.
    pub failing_captures: usize,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            window: 6,
            menu_selector: r#"[aria-label="More options"]"#.to_string(),
            download_selector: r#"text="Download image""#.to_string(),
            close_selector: Some(r#"[aria-label="Close"]"#.to_string()),
            escape_closes: true,
            back_closes: true,
            failing_captures: 0,
        }
    }
}

#[derive(Debug)]
struct State {
    url: String,
    first_rendered: usize,
    detail: Option<usize>,
    menu_open: bool,
    extra_pages: Vec<PageId>,
    next_page: u32,
    board_lost: bool,
    closed: bool,
    downloads_started: usize,
    opened: Vec<usize>,
    failed_captures: usize,
}

pub struct FakeBoard {
    pins: Vec<FakePin>,
    opts: FakeOptions,
    state: Mutex<State>,
}

impl FakeBoard {
    pub fn new(pins: Vec<FakePin>) -> Self {
        Self::with_options(pins, FakeOptions::default())
    }

    pub fn with_options(pins: Vec<FakePin>, opts: FakeOptions) -> Self {
        Self {
            pins,
            opts,
            state: Mutex::new(State {
                url: "about:blank".to_string(),
                first_rendered: 0,
                detail: None,
                menu_open: false,
                extra_pages: Vec::new(),
                next_page: 1,
                board_lost: false,
                closed: false,
                downloads_started: 0,
                opened: Vec::new(),
                failed_captures: 0,
            }),
        }
    }

    /// Board of `n` distinct pins, all of `size` bytes.
    pub fn uniform(n: usize, size: usize) -> Self {
        Self::new((0..n).map(|i| FakePin::new(i, size)).collect())
    }

    pub fn failed_captures(&self) -> usize {
        self.state.lock().unwrap().failed_captures
    }

    pub fn downloads_started(&self) -> usize {
        self.state.lock().unwrap().downloads_started
    }

    /// Pin indices in the order their detail view was opened.
    pub fn opened(&self) -> Vec<usize> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn open_pages(&self) -> usize {
        1 + self.state.lock().unwrap().extra_pages.len()
    }

    fn max_first(&self) -> usize {
        self.pins.len().saturating_sub(self.opts.window)
    }

    fn rendered(&self, st: &State) -> std::ops::Range<usize> {
        if st.url != BOARD_URL || st.detail.is_some() {
            return 0..0;
        }
        let end = (st.first_rendered + self.opts.window).min(self.pins.len());
        st.first_rendered..end
    }

    fn close_detail(st: &mut State) {
        st.detail = None;
        st.menu_open = false;
        st.url = BOARD_URL.to_string();
    }

    fn pin_index(id: &str) -> Option<(usize, &str)> {
        let rest = id.strip_prefix("pin:")?;
        let (num, tail) = match rest.split_once('/') {
            Some((n, t)) => (n, t),
            None => (rest, ""),
        };
        Some((num.parse().ok()?, tail))
    }

    fn live(&self) -> Result<std::sync::MutexGuard<'_, State>, BrowserError> {
        let st = self.state.lock().unwrap();
        if st.closed {
            return Err(BrowserError::Closed);
        }
        Ok(st)
    }

    fn matches(&self, st: &State, selector: &str) -> Vec<ElementHandle> {
        let el = |s: &str| vec![ElementHandle(s.to_string())];
        if selector == PIN_SELECTOR {
            return self
                .rendered(st)
                .map(|i| ElementHandle(format!("pin:{i}")))
                .collect();
        }
        let Some(open) = st.detail else {
            return Vec::new();
        };
        let pin = &self.pins[open];
        if selector == DETAIL_IMAGE_SELECTOR && pin.image_appears {
            return el("detail-img");
        }
        if selector == self.opts.menu_selector {
            return el("menu");
        }
        if selector == self.opts.download_selector && st.menu_open && pin.has_download_action {
            return el("download");
        }
        if self.opts.close_selector.as_deref() == Some(selector) {
            return el("close");
        }
        Vec::new()
    }
}

struct FakeDownload {
    name: String,
    size: usize,
    hang: bool,
    as_directory: bool,
}

#[async_trait]
impl PendingDownload for FakeDownload {
    fn suggested_name(&self) -> String {
        self.name.clone()
    }

    async fn save_as(&mut self, path: &Path) -> Result<(), BrowserError> {
        if self.as_directory {
            std::fs::create_dir(path)?;
            std::fs::write(path.join("fragment"), b"x")?;
            return Ok(());
        }
        if self.hang {
            std::fs::write(path, vec![1u8; self.size / 2])?;
            std::future::pending::<()>().await;
        }
        std::fs::write(path, vec![1u8; self.size])?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for FakeBoard {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        let mut st = self.live()?;
        st.detail = None;
        st.menu_open = false;
        st.first_rendered = 0;
        st.url = if st.board_lost {
            LOGIN_URL.to_string()
        } else {
            url.to_string()
        };
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.live()?.url.clone())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let mut st = self.live()?;
        if script == "window.scrollY" {
            return Ok(serde_json::json!(st.first_rendered as f64 * ROW_HEIGHT));
        }
        if script.starts_with("window.scrollBy") && st.url == BOARD_URL {
            let step = (self.opts.window / 2).max(1);
            st.first_rendered = (st.first_rendered + step).min(self.max_first());
        } else if let Some(rest) = script.strip_prefix("window.scrollTo(0, ") {
            let y: f64 = rest.trim_end_matches(')').trim().parse().unwrap_or(0.0);
            st.first_rendered = ((y / ROW_HEIGHT) as usize).min(self.max_first());
        }
        Ok(serde_json::Value::Null)
    }

    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let mut st = self.live()?;
        if selector == PIN_SELECTOR && st.failed_captures < self.opts.failing_captures {
            st.failed_captures += 1;
            return Err(BrowserError::Protocol("pin grid detached".to_string()));
        }
        Ok(self.matches(&st, selector))
    }

    async fn locate_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        let st = self.live()?;
        let Some((i, "")) = Self::pin_index(&parent.0) else {
            return Err(BrowserError::Stale(parent.0.clone()));
        };
        if !self.rendered(&st).contains(&i) {
            return Err(BrowserError::Stale(parent.0.clone()));
        }
        let found = if selector == PIN_LINK_SELECTOR && self.pins[i].link.is_some() {
            vec![ElementHandle(format!("pin:{i}/link"))]
        } else if selector == "img" {
            vec![ElementHandle(format!("pin:{i}/img"))]
        } else {
            Vec::new()
        };
        Ok(found)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let st = self.live()?;
        if self.matches(&st, selector).is_empty() {
            return Err(BrowserError::Timeout {
                what: selector.to_string(),
                after: timeout,
            });
        }
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let st = self.live()?;
        if element.0 == "detail-img" {
            return match (st.detail, name) {
                (Some(i), "src") => Ok(self.pins[i].detail_src.clone()),
                (Some(_), _) => Ok(None),
                (None, _) => Err(BrowserError::Stale(element.0.clone())),
            };
        }
        let Some((i, part)) = Self::pin_index(&element.0) else {
            return Ok(None);
        };
        if !self.rendered(&st).contains(&i) {
            return Err(BrowserError::Stale(element.0.clone()));
        }
        Ok(match (part, name) {
            ("link", "href") => self.pins[i].link.clone(),
            ("img", "src") => Some(self.pins[i].thumbnail.clone()),
            _ => None,
        })
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let st = self.live()?;
        match Self::pin_index(&element.0) {
            Some((i, "")) if self.rendered(&st).contains(&i) => Ok(()),
            _ => Err(BrowserError::Stale(element.0.clone())),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let mut st = self.live()?;
        if let Some((i, "")) = Self::pin_index(&element.0) {
            if !self.rendered(&st).contains(&i) {
                return Err(BrowserError::Stale(element.0.clone()));
            }
            st.detail = Some(i);
            st.menu_open = false;
            st.url = format!("https://www.pinterest.com/pin/{i}/");
            st.opened.push(i);
            if self.pins[i].opens_popup {
                let id = PageId(format!("popup-{}", st.next_page));
                st.next_page += 1;
                st.extra_pages.push(id);
            }
            if self.pins[i].loses_board {
                st.board_lost = true;
            }
            return Ok(());
        }
        match element.0.as_str() {
            "menu" if st.detail.is_some() => {
                st.menu_open = true;
                Ok(())
            }
            "close" if st.detail.is_some() => {
                if !st.board_lost {
                    Self::close_detail(&mut st);
                }
                Ok(())
            }
            _ => Err(BrowserError::Stale(element.0.clone())),
        }
    }

    async fn press_key(&self, key: &str) -> Result<(), BrowserError> {
        let mut st = self.live()?;
        if key == "Escape" && self.opts.escape_closes && !st.board_lost && st.detail.is_some() {
            Self::close_detail(&mut st);
        }
        Ok(())
    }

    async fn trigger_download(
        &self,
        action: &ElementHandle,
        _timeout: Duration,
    ) -> Result<Box<dyn PendingDownload>, BrowserError> {
        let mut st = self.live()?;
        let Some(i) = st.detail else {
            return Err(BrowserError::Stale(action.0.clone()));
        };
        if action.0 != "download" || !st.menu_open || !self.pins[i].has_download_action {
            return Err(BrowserError::Stale(action.0.clone()));
        }
        st.menu_open = false;
        st.downloads_started += 1;
        let pin = &self.pins[i];
        Ok(Box::new(FakeDownload {
            name: pin.suggested_name.clone(),
            size: pin.size,
            hang: pin.hangs_on_save,
            as_directory: pin.saves_as_directory,
        }))
    }

    async fn go_back(&self, _timeout: Duration) -> Result<(), BrowserError> {
        let mut st = self.live()?;
        if self.opts.back_closes && !st.board_lost && st.detail.is_some() {
            Self::close_detail(&mut st);
        }
        Ok(())
    }

    fn primary_page(&self) -> PageId {
        PageId("main".to_string())
    }

    async fn list_open_pages(&self) -> Result<Vec<PageId>, BrowserError> {
        let st = self.live()?;
        let mut pages = vec![self.primary_page()];
        pages.extend(st.extra_pages.iter().cloned());
        Ok(pages)
    }

    async fn close_page(&self, page: &PageId) -> Result<(), BrowserError> {
        let mut st = self.live()?;
        st.extra_pages.retain(|p| p != page);
        Ok(())
    }

    async fn bring_to_front(&self, _page: &PageId) -> Result<(), BrowserError> {
        self.live()?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
