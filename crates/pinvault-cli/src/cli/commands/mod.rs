//! CLI command handlers, one file per command.

mod check;
mod config;
mod hash;
mod reconcile;
mod status;

pub use check::run_check;
pub use config::run_config;
pub use hash::run_hash;
pub use reconcile::run_reconcile;
pub use status::run_status;

use anyhow::{Context, Result};
use pinvault_core::config::SessionConfig;
use pinvault_core::ledger::Ledger;

/// Load the ledger for `cfg`, merging files already in the output directory.
fn open_ledger(cfg: &SessionConfig) -> Result<Ledger> {
    let path = cfg.ledger_path();
    Ledger::load(&path, &cfg.output_dir)
        .with_context(|| format!("loading ledger {}", path.display()))
}
