//! `pinvault reconcile` – fold on-disk evidence into the ledger file.

use anyhow::{Context, Result};
use pinvault_core::config::SessionConfig;

use super::open_ledger;

pub async fn run_reconcile(cfg: &SessionConfig) -> Result<()> {
    let ledger = open_ledger(cfg)?;
    ledger
        .persist()
        .with_context(|| format!("writing ledger {}", ledger.path().display()))?;
    let counts = ledger.counts();
    println!(
        "Reconciled {}: {} downloaded, {} skipped.",
        ledger.path().display(),
        counts.downloaded,
        counts.skipped
    );
    Ok(())
}
