//! `pinvault config` – show where settings come from and what they resolve to.

use anyhow::Result;
use pinvault_core::config::SessionConfig;

use crate::cli::config_file;

pub async fn run_config(cfg: &SessionConfig) -> Result<()> {
    println!("config file: {}", config_file::config_path()?.display());
    println!("ledger:      {}", cfg.ledger_path().display());
    // Debug output of Credentials redacts the password.
    println!("{:#?}", cfg);
    Ok(())
}
