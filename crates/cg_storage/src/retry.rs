use std::time::Duration;

use tracing::{debug, warn};

use cg_core::config::{BackoffConfig, RetrievalConfig};
use cg_core::{Chunk, RetrievalIndex};

/// Delay inserted after a failed retrieval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the `failures`-th consecutive failure (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 1u32.checked_shl(failures.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

impl From<BackoffConfig> for Backoff {
    fn from(config: BackoffConfig) -> Self {
        match config {
            BackoffConfig::None => Backoff::None,
            BackoffConfig::Fixed { delay_ms } => Backoff::Fixed(Duration::from_millis(delay_ms)),
            BackoffConfig::Exponential { base_ms, max_ms } => Backoff::Exponential {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
            },
        }
    }
}

/// Retries a failed query with one fewer requested result each time, from
/// `initial_k` down to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradingRetry {
    pub initial_k: usize,
    pub backoff: Backoff,
}

impl Default for DegradingRetry {
    fn default() -> Self {
        Self {
            initial_k: 5,
            backoff: Backoff::None,
        }
    }
}

impl DegradingRetry {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            initial_k: config.initial_k,
            backoff: config.backoff.into(),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.initial_k + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieved {
    pub chunks: Vec<Chunk>,
    /// The `k` of the attempt that succeeded; `None` once every attempt failed.
    pub k: Option<usize>,
    pub attempts: usize,
}

impl Retrieved {
    pub fn is_degraded(&self) -> bool {
        self.k.is_none()
    }
}

/// Best-effort query: never fails, falls back to an empty evidence set.
pub async fn query_degrading(index: &dyn RetrievalIndex, text: &str, policy: &DegradingRetry) -> Retrieved {
    let mut attempts = 0;

    for k in (0..=policy.initial_k).rev() {
        attempts += 1;
        match index.query(text, k).await {
            Ok(chunks) => {
                debug!("Retrieved {} chunks for {:?} with k={}", chunks.len(), text, k);
                return Retrieved {
                    chunks,
                    k: Some(k),
                    attempts,
                };
            }
            Err(e) => {
                warn!("⚠️ Retrieval for {:?} failed with k={}: {}", text, k, e);
                if k > 0 {
                    let delay = policy.backoff.delay(attempts as u32);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    warn!(
        "⚠️ All {} retrieval attempts for {:?} failed, continuing without evidence",
        attempts, text
    );
    Retrieved {
        chunks: Vec::new(),
        k: None,
        attempts,
    }
}
