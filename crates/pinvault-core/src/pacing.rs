//! Settle delays with random jitter.
//!
//! Jitter only makes the crawl look less mechanical to the host site; nothing
//! depends on it for correctness or ordering.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base delay plus a uniformly random extra of up to `jitter_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Pacing {
    pub settle_ms: u64,
    pub jitter_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            jitter_ms: 750,
        }
    }
}

impl Pacing {
    /// No delays at all (tests, local fixtures).
    pub const fn immediate() -> Self {
        Self {
            settle_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Next settle duration.
    pub fn next_delay(&self) -> Duration {
        let extra = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.settle_ms.saturating_add(extra))
    }

    /// Sleep for one settle delay. Returns immediately when the delay is zero.
    pub async fn settle(&self) {
        let d = self.next_delay();
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}
