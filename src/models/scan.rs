use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::deal::DealCandidate;
use super::offer::Offer;
use super::stats::AggregatedStats;

// ---------------------------------------------------------------------------
// ScanKey — Identity of a tracked item for baseline lookups
// ---------------------------------------------------------------------------

/// Item/variant/country/foil key. Baselines are only ever computed from
/// scans with exactly the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanKey {
    /// Item identifier, e.g. a card number.
    pub item: String,
    /// Variant identifier, e.g. a set code.
    pub variant: String,
    /// Seller country filter the page was scanned with.
    pub country: String,
    pub foil: bool,
}

impl ScanKey {
    pub fn new(
        item: impl Into<String>,
        variant: impl Into<String>,
        country: impl Into<String>,
        foil: bool,
    ) -> Self {
        Self {
            item: item.into(),
            variant: variant.into(),
            country: country.into(),
            foil,
        }
    }
}

impl fmt::Display for ScanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.variant, self.item, self.country)?;
        if self.foil {
            f.write_str("/foil")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Extraction — Output of the offer extractor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub product_id: Option<String>,
    pub offers: Vec<Offer>,
}

// ---------------------------------------------------------------------------
// ScanReport — Everything one scan produces, ready for persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub product_id: Option<String>,
    pub offers: Vec<Offer>,
    pub stats: AggregatedStats,
    pub baseline: Option<Decimal>,
    pub deals: Vec<DealCandidate>,
}

impl ScanReport {
    pub fn has_offers(&self) -> bool {
        !self.offers.is_empty()
    }
}
