//! Per-pin download transaction.
//!
//! ```text
//! OPEN_DETAIL -> WAIT_IMAGE -> EXTRACT_HASH -> (ledger hit: SKIP)
//!   | LOCATE_MENU -> LOCATE_DOWNLOAD_ACTION -> TRIGGER_DOWNLOAD -> MEASURE_SIZE
//!   -> (below threshold: DISCARD | otherwise: COMMIT) -> RETURN_TO_BOARD
//! ```
//!
//! Per-pin failures come back as `DownloadOutcome` values. Only a lost board
//! view, a ledger write failure or an unusable output directory escape as
//! `CrawlError`. `RETURN_TO_BOARD` runs on every path.

mod state;

pub use state::TxState;

use std::path::{Path, PathBuf};

use crate::browser::{bounded, close_stray_pages, BrowserError, BrowserSession, ElementHandle};
use crate::config::{SessionConfig, Timeouts};
use crate::content_hash::{ContentHash, ImageDescriptor};
use crate::enumerator::PinHandle;
use crate::error::CrawlError;
use crate::ledger::{Disposition, EntryMeta, Ledger};
use crate::locator::{LocatorChain, ResolveError, SiteProfile, UiStep};
use crate::navigator::PageNavigator;
use crate::outcome::{classify_extraction_error, classify_ui_error, DownloadOutcome};
use crate::pacing::Pacing;
use crate::storage::TempArtifact;
use crate::url_model::saved_filename;

/// Settings shared by every transaction of a session.
#[derive(Debug, Clone)]
pub struct TransactionSettings {
    pub output_dir: PathBuf,
    pub size_threshold_bytes: u64,
    pub timeouts: Timeouts,
    pub site: SiteProfile,
    pub pacing: Pacing,
}

impl TransactionSettings {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            output_dir: cfg.output_dir.clone(),
            size_threshold_bytes: cfg.size_threshold_bytes,
            timeouts: cfg.timeouts.clone(),
            site: cfg.site.clone(),
            pacing: cfg.pacing,
        }
    }
}

/// Early exit from the transaction body: either a per-pin outcome or a session-fatal error.
enum Stop {
    Outcome(DownloadOutcome),
    Fatal(CrawlError),
}

impl From<CrawlError> for Stop {
    fn from(e: CrawlError) -> Self {
        Stop::Fatal(e)
    }
}

/// One pin, one pass through the state machine.
pub struct DownloadTransaction<'a> {
    settings: &'a TransactionSettings,
    pin: PinHandle,
    state: TxState,
    hash: Option<ContentHash>,
}

impl<'a> DownloadTransaction<'a> {
    pub fn new(settings: &'a TransactionSettings, pin: PinHandle) -> Self {
        Self {
            settings,
            pin,
            state: TxState::Pending,
            hash: None,
        }
    }

    /// Run the transaction to completion, always returning to the board.
    pub async fn run(
        mut self,
        session: &dyn BrowserSession,
        navigator: &PageNavigator,
        ledger: &mut Ledger,
    ) -> Result<DownloadOutcome, CrawlError> {
        if let Err(e) = close_stray_pages(session, self.settings.timeouts.action()).await {
            tracing::warn!("could not clean up stray tabs: {}", e);
        }

        let body = match self.process(session, ledger).await {
            Ok(outcome) | Err(Stop::Outcome(outcome)) => Ok(outcome),
            Err(Stop::Fatal(e)) => Err(e),
        };

        self.enter(TxState::ReturnToBoard);
        let returned = navigator.return_to_board(session, self.pin.scroll_y).await;
        self.enter(TxState::Done);

        let outcome = body?;
        match &self.hash {
            Some(h) => tracing::info!(pin = %self.pin.key, hash = %h, "{}", outcome),
            None => tracing::info!(pin = %self.pin.key, "{}", outcome),
        }
        if let Err(e) = returned {
            tracing::error!(pin = %self.pin.key, "lost the board view after {}: {}", outcome, e);
            return Err(CrawlError::Navigation(e));
        }
        Ok(outcome)
    }

    fn enter(&mut self, next: TxState) {
        tracing::trace!(pin = %self.pin.key, from = ?self.state, to = ?next, "transaction step");
        self.state = next;
    }

    async fn process(
        &mut self,
        session: &dyn BrowserSession,
        ledger: &mut Ledger,
    ) -> Result<DownloadOutcome, Stop> {
        let settings: &'a TransactionSettings = self.settings;
        let t = &settings.timeouts;

        self.enter(TxState::OpenDetail);
        let pin_el = self.pin.element.clone();
        bounded("scroll pin into view", t.action(), session.scroll_into_view(&pin_el))
            .await
            .map_err(|e| ui_stop(UiStep::OpenDetail, &e))?;
        bounded("open pin", t.action(), session.click(&pin_el))
            .await
            .map_err(|e| ui_stop(UiStep::OpenDetail, &e))?;

        self.enter(TxState::WaitImage);
        session
            .wait_for(&settings.site.detail_image, t.image())
            .await
            .map_err(|e| Stop::Outcome(classify_extraction_error(&e)))?;

        self.enter(TxState::ExtractHash);
        let descriptor = self.extract_descriptor(session).await?;
        let hash = descriptor.content_hash();
        self.hash = Some(hash.clone());

        if let Some(prior) = ledger.lookup(&hash) {
            tracing::debug!(hash = %hash, "already in ledger as {}", prior.as_str());
            return Ok(DownloadOutcome::SkippedDuplicate);
        }

        self.enter(TxState::LocateMenu);
        let menu = self.resolve(session, UiStep::Menu).await?;
        bounded("open menu", t.action(), session.click(&menu))
            .await
            .map_err(|e| ui_stop(UiStep::Menu, &e))?;
        settings.pacing.settle().await;

        self.enter(TxState::LocateDownloadAction);
        let action = self.resolve(session, UiStep::DownloadAction).await?;

        self.enter(TxState::TriggerDownload);
        let mut pending = bounded(
            "download start",
            t.download(),
            session.trigger_download(&action, t.download()),
        )
        .await
        .map_err(|e| ui_stop(UiStep::DownloadAction, &e))?;

        let filename = saved_filename(&hash, &pending.suggested_name());
        let final_path = settings.output_dir.join(&filename);
        let artifact = TempArtifact::prepare(&final_path).map_err(|e| output_dir_error(&settings.output_dir, e))?;
        bounded("save download", t.download(), pending.save_as(artifact.temp_path()))
            .await
            .map_err(|e| Stop::Outcome(classify_extraction_error(&e)))?;

        self.enter(TxState::MeasureSize);
        let size = artifact.size().map_err(|e| {
            tracing::warn!(hash = %hash, "downloaded artifact unreadable: {}", e);
            Stop::Outcome(DownloadOutcome::FailedExtraction)
        })?;

        if size < settings.size_threshold_bytes {
            self.enter(TxState::Discard);
            artifact
                .discard()
                .map_err(|e| output_dir_error(&settings.output_dir, e))?;
            ledger.record(&hash, Disposition::SkippedTooSmall, EntryMeta::too_small(size))
                .map_err(CrawlError::from)?;
            tracing::debug!(hash = %hash, size, threshold = settings.size_threshold_bytes, "below size threshold");
            return Ok(DownloadOutcome::SkippedTooSmall);
        }

        self.enter(TxState::Commit);
        let saved = artifact
            .commit()
            .map_err(|e| output_dir_error(&settings.output_dir, e))?;
        ledger
            .record(&hash, Disposition::Downloaded, EntryMeta::downloaded(size, filename))
            .map_err(CrawlError::from)?;
        tracing::debug!(path = %saved.display(), size, "committed");
        Ok(DownloadOutcome::Downloaded)
    }

    async fn extract_descriptor(&self, session: &dyn BrowserSession) -> Result<ImageDescriptor, Stop> {
        let t = &self.settings.timeouts;
        let selector = &self.settings.site.detail_image;
        let images = bounded("locate detail image", t.action(), session.locate(selector))
            .await
            .map_err(|e| Stop::Outcome(classify_extraction_error(&e)))?;
        let img: &ElementHandle = images
            .first()
            .ok_or(Stop::Outcome(DownloadOutcome::FailedExtraction))?;
        let src = bounded("read image src", t.action(), session.attribute(img, "src"))
            .await
            .map_err(|e| Stop::Outcome(classify_extraction_error(&e)))?;
        match src {
            Some(s) if !s.trim().is_empty() => Ok(ImageDescriptor::new(s.trim())),
            _ => Err(Stop::Outcome(DownloadOutcome::FailedExtraction)),
        }
    }

    async fn resolve(&self, session: &dyn BrowserSession, step: UiStep) -> Result<ElementHandle, Stop> {
        let site = &self.settings.site;
        let strategies = match step {
            UiStep::Menu => &site.menu,
            UiStep::DownloadAction => &site.download_action,
            UiStep::Close => &site.close,
            UiStep::OpenDetail => return Ok(self.pin.element.clone()),
        };
        LocatorChain::new(step, strategies)
            .resolve(session, self.settings.timeouts.locator())
            .await
            .map_err(|e| match e {
                ResolveError::Unresolved(u) => {
                    tracing::warn!(pin = %self.pin.key, "{}", u);
                    Stop::Outcome(DownloadOutcome::FailedUIElement)
                }
                ResolveError::Browser(e) => ui_stop(step, &e),
            })
    }
}

fn ui_stop(step: UiStep, e: &BrowserError) -> Stop {
    Stop::Outcome(classify_ui_error(step, e))
}

fn output_dir_error(dir: &Path, source: std::io::Error) -> Stop {
    Stop::Fatal(CrawlError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}
