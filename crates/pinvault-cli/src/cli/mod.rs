//! CLI for the pinvault board image downloader.
//!
//! Crawling itself needs a live browser session and is driven through
//! `pinvault_core::session::run_session`; the commands here inspect and
//! maintain the ledger of an output directory.

mod commands;
mod config_file;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pinvault_core::config::SessionConfig;
use std::path::PathBuf;

use commands::{run_check, run_config, run_hash, run_reconcile, run_status};

/// Top-level CLI for pinvault.
#[derive(Debug, Parser)]
#[command(name = "pinvault")]
#[command(about = "pinvault: board image downloader with a content-addressed ledger", long_about = None)]
pub struct Cli {
    /// Output directory (overrides config file and PINVAULT_OUTPUT_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Ledger file (default: <output-dir>/.pinvault-ledger.json).
    #[arg(long, global = true, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Board URL (overrides config file and PINVAULT_BOARD_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub board_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show ledger totals for the output directory.
    Status {
        /// Also list every ledger entry.
        #[arg(long)]
        list: bool,
    },

    /// Show whether an image URL is already recorded in the ledger.
    Check {
        /// Full-size image URL as shown in the pin's detail view.
        url: String,
    },

    /// Print the content hash used as the dedup key for an image URL.
    Hash {
        /// Full-size image URL.
        url: String,
    },

    /// Merge image files found in the output directory into the ledger and save it.
    Reconcile,

    /// Print the resolved session configuration (password redacted).
    Config,
}

impl Cli {
    /// Command-line flags win over file and environment settings.
    pub fn apply_overrides(&self, cfg: &mut SessionConfig) {
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(ledger) = &self.ledger {
            cfg.ledger_path = Some(ledger.clone());
        }
        if let Some(url) = &self.board_url {
            cfg.board_url = url.clone();
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let file_cfg = config_file::load_or_init()?;
        let mut cfg = file_cfg.into_session_config();
        config_file::apply_env(&mut cfg, |key| std::env::var(key).ok())?;
        cli.apply_overrides(&mut cfg);
        tracing::debug!("resolved config: {:?}", cfg);

        match cli.command {
            CliCommand::Status { list } => run_status(&cfg, list).await?,
            CliCommand::Check { url } => run_check(&cfg, &url).await?,
            CliCommand::Hash { url } => run_hash(&url).await?,
            CliCommand::Reconcile => run_reconcile(&cfg).await?,
            CliCommand::Config => run_config(&cfg).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
