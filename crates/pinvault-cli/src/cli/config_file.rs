//! Settings file `~/.config/pinvault/config.toml` plus `PINVAULT_*` environment overrides.

use anyhow::{bail, Context, Result};
use pinvault_core::config::{
    Credentials, ScrollSettings, SessionConfig, Timeouts, DEFAULT_SIZE_THRESHOLD_BYTES,
};
use pinvault_core::locator::SiteProfile;
use pinvault_core::pacing::Pacing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// On-disk settings. Every field is optional in the file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub board_url: String,
    pub output_dir: PathBuf,
    pub headless: bool,
    pub size_threshold_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub timeouts: Timeouts,
    pub scroll: ScrollSettings,
    pub pacing: Pacing,
    pub site: SiteProfile,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            board_url: String::new(),
            output_dir: PathBuf::from("pinvault-images"),
            headless: false,
            size_threshold_bytes: DEFAULT_SIZE_THRESHOLD_BYTES,
            ledger_path: None,
            username: None,
            password: None,
            timeouts: Timeouts::default(),
            scroll: ScrollSettings::default(),
            pacing: Pacing::default(),
            site: SiteProfile::default(),
        }
    }
}

impl FileConfig {
    pub fn into_session_config(self) -> SessionConfig {
        let mut cfg = SessionConfig::new(self.board_url, self.output_dir);
        cfg.headless = self.headless;
        cfg.size_threshold_bytes = self.size_threshold_bytes;
        cfg.ledger_path = self.ledger_path;
        cfg.credentials = match (self.username, self.password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };
        cfg.timeouts = self.timeouts;
        cfg.scroll = self.scroll;
        cfg.pacing = self.pacing;
        cfg.site = self.site;
        cfg
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pinvault")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load the settings file, creating one with defaults if none exists.
pub fn load_or_init() -> Result<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FileConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FileConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

/// Apply `PINVAULT_*` variables on top of `cfg`. `lookup` is `std::env::var` outside tests.
pub fn apply_env(cfg: &mut SessionConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("PINVAULT_BOARD_URL") {
        cfg.board_url = url.trim().to_string();
    }
    if let Some(dir) = get("PINVAULT_OUTPUT_DIR") {
        cfg.output_dir = PathBuf::from(dir.trim());
    }
    if let Some(v) = get("PINVAULT_HEADLESS") {
        cfg.headless = parse_bool(&v).with_context(|| format!("PINVAULT_HEADLESS={v}"))?;
    }
    if let Some(v) = get("PINVAULT_SIZE_THRESHOLD") {
        cfg.size_threshold_bytes = v
            .trim()
            .parse()
            .with_context(|| format!("PINVAULT_SIZE_THRESHOLD={v} is not a byte count"))?;
    }

    let username = get("PINVAULT_USERNAME");
    let password = get("PINVAULT_PASSWORD");
    if username.is_some() || password.is_some() {
        let existing = cfg.credentials.take();
        let (old_user, old_pass) = match existing {
            Some(c) => (Some(c.username), Some(c.password)),
            None => (None, None),
        };
        cfg.credentials = match (username.or(old_user), password.or(old_pass)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };
    }
    Ok(())
}

fn parse_bool(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true/false, got {other:?}"),
    }
}
