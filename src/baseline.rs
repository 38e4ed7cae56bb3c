//! Rolling baselines: the median of the most recent per-scan medians.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::aggregate::percentile;
use crate::config::DEFAULT_BASELINE_WINDOW;
use crate::error::{Result, ScannerError};
use crate::models::ScanKey;

/// Supplies the historical reference price for a scan key.
pub trait BaselineProvider {
    /// Median of the last `window` successful scans' medians for `key`, or
    /// `None` when there is no history.
    fn baseline(&self, key: &ScanKey, window: usize) -> Result<Option<Decimal>>;
}

impl<T: BaselineProvider + ?Sized> BaselineProvider for &T {
    fn baseline(&self, key: &ScanKey, window: usize) -> Result<Option<Decimal>> {
        (**self).baseline(key, window)
    }
}

/// Median of the newest `window` entries of `medians` (oldest first).
pub fn rolling_median(medians: &[Decimal], window: usize) -> Option<Decimal> {
    let start = medians.len().saturating_sub(window);
    let mut recent = medians[start..].to_vec();
    recent.sort();
    percentile(&recent, 50)
}

// ---------------------------------------------------------------------------
// InMemoryBaselines
// ---------------------------------------------------------------------------

/// Per-key median history kept in memory.
///
/// Each key keeps only its newest `limit` medians, so baselines asked for a
/// wider window are computed over at most `limit` scans.
#[derive(Debug)]
pub struct InMemoryBaselines {
    history: RwLock<HashMap<ScanKey, Vec<Decimal>>>,
    limit: usize,
}

impl Default for InMemoryBaselines {
    fn default() -> Self {
        Self::with_limit(DEFAULT_BASELINE_WINDOW)
    }
}

impl InMemoryBaselines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` medians per key (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            history: RwLock::default(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append one scan's median for `key`, dropping the oldest beyond the
    /// limit.
    pub fn record(&self, key: &ScanKey, median: Decimal) -> Result<()> {
        let mut history = self
            .history
            .write()
            .map_err(|_| ScannerError::InvalidArgument("baseline history poisoned".into()))?;
        let medians = history.entry(key.clone()).or_default();
        medians.push(median);
        if medians.len() > self.limit {
            let excess = medians.len() - self.limit;
            medians.drain(..excess);
        }
        Ok(())
    }

    /// Number of medians recorded for `key`.
    pub fn len(&self, key: &ScanKey) -> usize {
        self.history
            .read()
            .map(|h| h.get(key).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.history.read().map(|h| h.is_empty()).unwrap_or(true)
    }
}

impl BaselineProvider for InMemoryBaselines {
    fn baseline(&self, key: &ScanKey, window: usize) -> Result<Option<Decimal>> {
        let history = self
            .history
            .read()
            .map_err(|_| ScannerError::InvalidArgument("baseline history poisoned".into()))?;
        Ok(history
            .get(key)
            .and_then(|medians| rolling_median(medians, window)))
    }
}
