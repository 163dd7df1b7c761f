//! Session totals.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::outcome::DownloadOutcome;

/// How the session's enumeration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// A scroll pass surfaced no pin not already seen.
    Exhausted,
    /// The scroll iteration cap was reached first; the result is partial.
    IterationLimit,
    /// The operator stopped the run.
    Interrupted,
}

/// Counter per outcome for every transaction the session ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    counts: BTreeMap<DownloadOutcome, u64>,
}

/// Final numbers exposed to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub downloaded: u64,
    pub skipped_duplicate: u64,
    pub skipped_small: u64,
    pub failed: u64,
    pub total_seen: u64,
}

impl SessionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: DownloadOutcome) {
        *self.counts.entry(outcome).or_insert(0) += 1;
    }

    pub fn count(&self, outcome: DownloadOutcome) -> u64 {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    pub fn downloaded(&self) -> u64 {
        self.count(DownloadOutcome::Downloaded)
    }

    pub fn skipped_duplicate(&self) -> u64 {
        self.count(DownloadOutcome::SkippedDuplicate)
    }

    pub fn skipped_small(&self) -> u64 {
        self.count(DownloadOutcome::SkippedTooSmall)
    }

    pub fn failed(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(o, _)| o.is_failure())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn total_seen(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Non-zero failure counters by kind.
    pub fn failures(&self) -> impl Iterator<Item = (DownloadOutcome, u64)> + '_ {
        self.counts
            .iter()
            .filter(|(o, n)| o.is_failure() && **n > 0)
            .map(|(o, n)| (*o, *n))
    }

    pub fn totals(&self) -> ReportTotals {
        ReportTotals {
            downloaded: self.downloaded(),
            skipped_duplicate: self.skipped_duplicate(),
            skipped_small: self.skipped_small(),
            failed: self.failed(),
            total_seen: self.total_seen(),
        }
    }
}
