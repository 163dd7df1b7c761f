//! `pinvault hash <url>` – print the dedup key of an image URL.

use anyhow::Result;
use pinvault_core::content_hash::ImageDescriptor;

pub async fn run_hash(url: &str) -> Result<()> {
    let url = url.trim();
    println!("{}  {}", ImageDescriptor::new(url).content_hash(), url);
    Ok(())
}
