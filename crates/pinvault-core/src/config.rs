//! Session configuration consumed once at startup.
//!
//! The core never reads files or environment variables; the CLI (or any other
//! embedder) builds a `SessionConfig` and hands it to `session::run_session`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::locator::SiteProfile;
use crate::pacing::Pacing;

/// Default minimum artifact size: 70 KiB.
pub const DEFAULT_SIZE_THRESHOLD_BYTES: u64 = 71_680;

/// Ledger file name used when `ledger_path` is not set.
pub const DEFAULT_LEDGER_FILENAME: &str = ".pinvault-ledger.json";

/// Account credentials. Only carried for the external login flow.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-step timeouts in milliseconds. Every page interaction is bounded by one of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timeouts {
    /// Full page navigation (`goto`, history back).
    pub navigation_ms: u64,
    /// Detail-view image appearing after a pin is opened.
    pub image_ms: u64,
    /// Visibility wait for a single locator strategy.
    pub locator_ms: u64,
    /// Download event after the download action is clicked.
    pub download_ms: u64,
    /// Clicks, script evaluation, element queries.
    pub action_ms: u64,
    /// Pin grid appearing after the board is (re)opened or scrolled.
    pub board_ready_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            image_ms: 5_000,
            locator_ms: 1_000,
            download_ms: 30_000,
            action_ms: 10_000,
            board_ready_ms: 10_000,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn image(&self) -> Duration {
        Duration::from_millis(self.image_ms)
    }

    pub fn locator(&self) -> Duration {
        Duration::from_millis(self.locator_ms)
    }

    pub fn download(&self) -> Duration {
        Duration::from_millis(self.download_ms)
    }

    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn board_ready(&self) -> Duration {
        Duration::from_millis(self.board_ready_ms)
    }
}

/// Scroll loop parameters for pin discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollSettings {
    /// Upper bound on scroll iterations; boards that never converge end with a partial result.
    pub max_iterations: u32,
    /// Scroll increment as a fraction of the viewport height.
    pub viewport_fraction: f64,
    /// Attempts for the initial board navigation (first included).
    pub open_attempts: u32,
    /// Attempts for each recapture of the rendered pins (first included).
    pub capture_attempts: u32,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            viewport_fraction: 1.0,
            open_attempts: 3,
            capture_attempts: 3,
        }
    }
}

/// Everything one crawl session needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub board_url: String,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub headless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default = "default_size_threshold")]
    pub size_threshold_bytes: u64,
    /// Ledger JSON location; defaults to `<output_dir>/.pinvault-ledger.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub scroll: ScrollSettings,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub site: SiteProfile,
}

fn default_size_threshold() -> u64 {
    DEFAULT_SIZE_THRESHOLD_BYTES
}

impl SessionConfig {
    /// Config with defaults for everything except the board and output directory.
    pub fn new(board_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            board_url: board_url.into(),
            output_dir: output_dir.into(),
            headless: false,
            credentials: None,
            size_threshold_bytes: DEFAULT_SIZE_THRESHOLD_BYTES,
            ledger_path: None,
            timeouts: Timeouts::default(),
            scroll: ScrollSettings::default(),
            pacing: Pacing::default(),
            site: SiteProfile::default(),
        }
    }

    /// Resolved ledger path.
    pub fn ledger_path(&self) -> PathBuf {
        resolve_ledger_path(&self.output_dir, self.ledger_path.as_deref())
    }
}

/// Ledger path for an output directory, honoring an explicit override.
pub fn resolve_ledger_path(output_dir: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => output_dir.join(DEFAULT_LEDGER_FILENAME),
    }
}
