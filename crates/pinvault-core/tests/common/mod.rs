#![allow(dead_code)]

pub mod fake_board;

use pinvault_core::config::SessionConfig;
use pinvault_core::pacing::Pacing;
use std::path::Path;

/// Session config pointing at the fake board, with no settle delays.
pub fn test_config(output_dir: &Path) -> SessionConfig {
    let mut cfg = SessionConfig::new(fake_board::BOARD_URL, output_dir);
    cfg.pacing = Pacing::immediate();
    cfg.scroll.open_attempts = 1;
    cfg.timeouts.locator_ms = 20;
    cfg.timeouts.image_ms = 50;
    cfg.timeouts.download_ms = 5_000;
    cfg
}

/// Files in `dir` whose name starts with `prefix`.
pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(prefix))
        .collect();
    names.sort();
    names
}

/// Leftover `.part` temporaries in `dir`.
pub fn temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".part"))
        .collect()
}
