use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AggregatedStats — Price summary for one scan
// ---------------------------------------------------------------------------

/// Statistics derived from the offers of a single scan.
///
/// Every monetary field is absent when no priced offer exists. `stdev` also
/// needs at least two offers, and `mode` is absent unless one rounded price
/// occurs strictly more often than every other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    pub offer_count: usize,
    pub seller_count: usize,
    pub min: Option<Decimal>,
    pub p10: Option<Decimal>,
    pub p25: Option<Decimal>,
    pub median: Option<Decimal>,
    pub p75: Option<Decimal>,
    pub p90: Option<Decimal>,
    pub max: Option<Decimal>,
    pub trimmed_mean: Option<Decimal>,
    pub iqr: Option<Decimal>,
    pub stdev: Option<Decimal>,
    pub mean: Option<Decimal>,
    pub mode: Option<Decimal>,
}

impl AggregatedStats {
    pub fn is_empty(&self) -> bool {
        self.offer_count == 0
    }

    /// The seven order statistics, lowest first, when all are present.
    pub fn quantiles(&self) -> Option<[Decimal; 7]> {
        Some([
            self.min?,
            self.p10?,
            self.p25?,
            self.median?,
            self.p75?,
            self.p90?,
            self.max?,
        ])
    }
}
