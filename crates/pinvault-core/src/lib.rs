pub mod config;
pub mod logging;

// Crawl pipeline: enumerator -> transaction -> ledger, driven by session.
pub mod browser;
pub mod content_hash;
pub mod enumerator;
pub mod error;
pub mod ledger;
pub mod locator;
pub mod navigator;
pub mod outcome;
pub mod pacing;
pub mod report;
pub mod session;
pub mod storage;
pub mod transaction;
pub mod url_model;
