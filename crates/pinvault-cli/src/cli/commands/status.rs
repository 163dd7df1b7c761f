//! `pinvault status` – ledger totals, optionally every entry.

use anyhow::Result;
use pinvault_core::config::SessionConfig;

use super::open_ledger;

pub async fn run_status(cfg: &SessionConfig, list: bool) -> Result<()> {
    let ledger = open_ledger(cfg)?;
    let counts = ledger.counts();
    println!("ledger:     {}", ledger.path().display());
    println!("output dir: {}", cfg.output_dir.display());
    println!("downloaded: {}", counts.downloaded);
    println!("skipped:    {}", counts.skipped);

    if !list {
        return Ok(());
    }
    if ledger.is_empty() {
        println!("No entries in ledger.");
        return Ok(());
    }
    println!();
    println!("{:<14} {:<18} {:<10} {}", "HASH", "STATUS", "SIZE", "FILE");
    for e in ledger.entries() {
        let size = e
            .size_bytes
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} {:<18} {:<10} {}",
            e.content_hash,
            e.status.as_str(),
            size,
            e.saved_filename.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
