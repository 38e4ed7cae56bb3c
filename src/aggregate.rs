//! Price statistics over the offers of one scan.
//!
//! All arithmetic is done in [`Decimal`]; reported values are rounded to
//! cents. Empty input is not an error and yields an empty
//! [`AggregatedStats`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::{BTreeMap, HashSet};

use crate::models::{AggregatedStats, Offer};
use crate::parse::round_money;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Compute the statistics record for `offers`.
pub fn aggregate(offers: &[Offer]) -> AggregatedStats {
    let mut stats = AggregatedStats {
        offer_count: offers.len(),
        seller_count: seller_count(offers),
        ..AggregatedStats::default()
    };

    let mut prices: Vec<Decimal> = offers.iter().map(Offer::price_basis).collect();
    if prices.is_empty() {
        return stats;
    }
    prices.sort();

    stats.min = prices.first().copied().map(round_money);
    stats.max = prices.last().copied().map(round_money);
    stats.p10 = percentile(&prices, 10);
    stats.p25 = percentile(&prices, 25);
    stats.median = percentile(&prices, 50);
    stats.p75 = percentile(&prices, 75);
    stats.p90 = percentile(&prices, 90);
    stats.iqr = match (stats.p25, stats.p75) {
        (Some(p25), Some(p75)) => Some(p75 - p25),
        _ => None,
    };
    stats.mean = mean(&prices).map(round_money);
    stats.stdev = sample_stdev(&prices).map(round_money);
    stats.trimmed_mean = trimmed_mean(&prices);
    stats.mode = mode(&prices);

    tracing::debug!(
        offers = stats.offer_count,
        sellers = stats.seller_count,
        median = ?stats.median,
        "aggregated scan"
    );
    stats
}

/// Number of distinct sellers, by id, else by name. Offers with neither are
/// not counted.
pub fn seller_count(offers: &[Offer]) -> usize {
    offers
        .iter()
        .filter_map(Offer::seller_identity)
        .collect::<HashSet<_>>()
        .len()
}

/// Linearly interpolated percentile of ascending `sorted` values.
///
/// `p` is clamped to `[0, 100]`. With rank `k = (n - 1) * p / 100`, floor
/// `f` and `c = f + 1`, the result is `v[f] * (c - k) + v[c] * (k - f)`, or
/// the maximum when `c` falls past the end. Rounded to cents.
pub fn percentile(sorted: &[Decimal], p: impl Into<Decimal>) -> Option<Decimal> {
    let n = sorted.len();
    match n {
        0 => return None,
        1 => return Some(round_money(sorted[0])),
        _ => {}
    }

    let p = p.into().clamp(Decimal::ZERO, HUNDRED);
    let k = Decimal::from(n - 1) * p / HUNDRED;
    let f = k.floor();
    let c = f + Decimal::ONE;

    let f_idx = f.to_usize().unwrap_or(0);
    let c_idx = f_idx + 1;
    if c_idx >= n {
        return Some(round_money(sorted[n - 1]));
    }

    Some(round_money(sorted[f_idx] * (c - k) + sorted[c_idx] * (k - f)))
}

/// Arithmetic mean, unrounded.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

/// Sample standard deviation; needs at least two values. Unrounded.
pub fn sample_stdev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let squares: Decimal = values.iter().map(|v| (*v - avg) * (*v - avg)).sum();
    (squares / Decimal::from(values.len() - 1)).sqrt()
}

/// Mean after dropping 10% of the values (by count) from each tail.
///
/// Fewer than three values give the plain mean. At least one value is
/// dropped per tail otherwise, unless that would leave nothing.
pub fn trimmed_mean(values: &[Decimal]) -> Option<Decimal> {
    let n = values.len();
    if n < 3 {
        return mean(values).map(round_money);
    }

    let mut sorted = values.to_vec();
    sorted.sort();

    let trim = (n / 10).max(1);
    let kept = if 2 * trim >= n {
        &sorted[..]
    } else {
        &sorted[trim..n - trim]
    };
    mean(kept).map(round_money)
}

/// The most frequent cent-rounded value, when it is unique.
pub fn mode(values: &[Decimal]) -> Option<Decimal> {
    let mut counts: BTreeMap<Decimal, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(round_money(*v)).or_default() += 1;
    }

    let top = counts.values().copied().max()?;
    if top < 2 {
        return None;
    }
    let mut leaders = counts.iter().filter(|(_, count)| **count == top);
    match (leaders.next(), leaders.next()) {
        (Some((value, _)), None) => Some(*value),
        _ => None,
    }
}
