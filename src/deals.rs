use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::models::{Condition, DealCandidate, Offer};
use crate::parse::condition_meets_minimum;

// ---------------------------------------------------------------------------
// DealPolicy — Thresholds deciding which offers are alert-worthy
// ---------------------------------------------------------------------------

/// Deal detection rules.
///
/// An offer is a deal when its price is at or below
/// `baseline * (1 - threshold)` and neither its seller rating nor its
/// condition is known to fall short of the minimums. Missing rating or
/// condition data does not disqualify an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPolicy {
    /// Fraction below baseline, e.g. `0.15` for 15%.
    pub threshold: Decimal,
    pub min_seller_rating: f64,
    pub min_condition: Condition,
}

impl Default for DealPolicy {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for DealPolicy {
    fn from(config: &ScanConfig) -> Self {
        Self {
            threshold: config.deal_threshold,
            min_seller_rating: config.min_seller_rating,
            min_condition: config.min_condition.clone(),
        }
    }
}

impl DealPolicy {
    /// Highest price that still counts as a deal against `baseline`.
    pub fn threshold_price(&self, baseline: Decimal) -> Decimal {
        baseline * (Decimal::ONE - self.threshold)
    }

    fn rating_ok(&self, offer: &Offer) -> bool {
        offer
            .seller_rating()
            .map_or(true, |rating| rating >= self.min_seller_rating)
    }

    fn condition_ok(&self, offer: &Offer) -> bool {
        offer.condition().is_none()
            || condition_meets_minimum(offer.condition(), &self.min_condition)
    }

    /// Whether `offer` qualifies against a precomputed threshold price.
    pub fn qualifies(&self, offer: &Offer, threshold_price: Decimal) -> bool {
        offer.price_basis() <= threshold_price && self.rating_ok(offer) && self.condition_ok(offer)
    }

    /// Deals among `offers`, in input order.
    ///
    /// Returns an empty list when there is no (positive) baseline.
    pub fn detect(&self, offers: &[Offer], baseline: Option<Decimal>) -> Vec<DealCandidate> {
        let Some(baseline) = baseline else {
            tracing::debug!("no baseline, skipping deal detection");
            return Vec::new();
        };
        if baseline <= Decimal::ZERO {
            tracing::debug!(%baseline, "non-positive baseline, skipping deal detection");
            return Vec::new();
        }

        let threshold_price = self.threshold_price(baseline);
        let deals: Vec<DealCandidate> = offers
            .iter()
            .filter(|offer| self.qualifies(offer, threshold_price))
            .map(|offer| candidate(offer, baseline))
            .collect();

        for deal in &deals {
            tracing::info!(
                position = deal.offer.position(),
                price = %deal.price(),
                %baseline,
                "deal detected"
            );
        }
        deals
    }
}

/// Signed discount `(price - baseline) / baseline`, rounded to 4 places.
pub fn discount_fraction(price: Decimal, baseline: Decimal) -> Decimal {
    ((price - baseline) / baseline)
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

fn candidate(offer: &Offer, baseline: Decimal) -> DealCandidate {
    let price = offer.price_basis();
    let discount_pct = discount_fraction(price, baseline);
    let currency = offer.currency();
    let reason = format!(
        "Price {:.2} {} is {:.1}% below baseline {:.2} {}",
        price,
        currency,
        discount_pct.abs() * Decimal::ONE_HUNDRED,
        baseline,
        currency
    );

    DealCandidate {
        offer: offer.clone(),
        baseline,
        discount_pct,
        reason,
    }
}
