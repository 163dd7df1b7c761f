//! Session orchestration: ledger load, board open, enumeration, teardown.
//!
//! Exactly one page is driven and pins are processed strictly one after the
//! other. The browser is closed on every exit path, including interrupts and
//! fatal errors.

use std::future::Future;
use thiserror::Error;

use crate::browser::BrowserSession;
use crate::config::SessionConfig;
use crate::enumerator::PinEnumerator;
use crate::error::CrawlError;
use crate::ledger::{Ledger, LedgerCounts};
use crate::navigator::PageNavigator;
use crate::report::{SessionEnd, SessionReport};
use crate::transaction::TransactionSettings;

/// Result of a session that ran to a normal end.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub report: SessionReport,
    pub end: SessionEnd,
    /// Ledger totals after the run (all sessions, not just this one).
    pub ledger: LedgerCounts,
}

/// A session-fatal error, with whatever was tallied before it happened.
#[derive(Debug, Error)]
#[error("session aborted after {} pins: {source}", .report.total_seen())]
pub struct SessionAborted {
    pub report: SessionReport,
    #[source]
    pub source: CrawlError,
}

/// Crawl the configured board until enumeration ends, a fatal error occurs,
/// or `interrupt` resolves.
///
/// On interrupt the in-flight transaction is dropped mid-step; its temporary
/// artifact (if any) is removed by its guard and the ledger needs no flush
/// because every mutation was already written through.
pub async fn run_session<I>(
    session: &dyn BrowserSession,
    config: &SessionConfig,
    interrupt: I,
) -> Result<SessionSummary, SessionAborted>
where
    I: Future<Output = ()>,
{
    let mut report = SessionReport::new();
    let result = prepare_and_crawl(session, config, &mut report, interrupt).await;

    if let Err(e) = session.close().await {
        tracing::warn!("closing browser failed: {}", e);
    }

    match result {
        Ok((end, ledger)) => {
            let t = report.totals();
            tracing::info!(
                ?end,
                downloaded = t.downloaded,
                skipped_duplicate = t.skipped_duplicate,
                skipped_small = t.skipped_small,
                failed = t.failed,
                total = t.total_seen,
                "session finished"
            );
            Ok(SessionSummary { report, end, ledger })
        }
        Err(source) => {
            tracing::error!("session aborted: {}", source);
            Err(SessionAborted { report, source })
        }
    }
}

async fn prepare_and_crawl<I>(
    session: &dyn BrowserSession,
    config: &SessionConfig,
    report: &mut SessionReport,
    interrupt: I,
) -> Result<(SessionEnd, LedgerCounts), CrawlError>
where
    I: Future<Output = ()>,
{
    std::fs::create_dir_all(&config.output_dir).map_err(|source| CrawlError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;
    let mut ledger = Ledger::load(&config.ledger_path(), &config.output_dir)?;
    let navigator = PageNavigator::new(
        &config.board_url,
        &config.site.pin,
        config.site.close.clone(),
        config.timeouts.clone(),
        &config.scroll,
        config.pacing,
    )?;
    let settings = TransactionSettings::from_config(config);
    let mut enumerator = PinEnumerator::from_config(config);

    let end = tokio::select! {
        r = crawl(session, &navigator, &mut enumerator, &settings, &mut ledger, report) => r?,
        _ = interrupt => {
            tracing::warn!("interrupted, abandoning the in-flight pin");
            SessionEnd::Interrupted
        }
    };
    Ok((end, ledger.counts()))
}

async fn crawl(
    session: &dyn BrowserSession,
    navigator: &PageNavigator,
    enumerator: &mut PinEnumerator,
    settings: &TransactionSettings,
    ledger: &mut Ledger,
    report: &mut SessionReport,
) -> Result<SessionEnd, CrawlError> {
    navigator.open_board(session).await?;
    enumerator.run(session, navigator, settings, ledger, report).await
}
