use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::offer::Offer;

// ---------------------------------------------------------------------------
// DealCandidate — An offer priced well below its baseline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealCandidate {
    pub offer: Offer,
    /// Historical reference price the offer was compared against.
    pub baseline: Decimal,
    /// Signed fraction `(price - baseline) / baseline`; negative is cheaper.
    pub discount_pct: Decimal,
    /// Display text for alerting.
    pub reason: String,
}

impl DealCandidate {
    /// The compared price (the offer's total).
    pub fn price(&self) -> Decimal {
        self.offer.price_basis()
    }
}
