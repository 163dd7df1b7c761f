//! `pinvault check <url>` – would this image be skipped as a duplicate?

use anyhow::Result;
use pinvault_core::config::SessionConfig;
use pinvault_core::content_hash::ImageDescriptor;

use super::open_ledger;

pub async fn run_check(cfg: &SessionConfig, url: &str) -> Result<()> {
    let hash = ImageDescriptor::new(url.trim()).content_hash();
    let ledger = open_ledger(cfg)?;
    match ledger.entry(&hash) {
        Some(e) => {
            let file = e.saved_filename.as_deref().unwrap_or("-");
            println!("{}  {}  {}", hash, e.status.as_str(), file);
        }
        None => println!("{}  new", hash),
    }
    Ok(())
}
