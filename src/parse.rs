//! Locale-tolerant value parsers.
//!
//! Every parser returns `None` on malformed input instead of failing, so a
//! single unreadable fragment never aborts extraction of an offer.

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::Condition;

/// Smallest accepted item or shipping price (0.01).
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest accepted item or shipping price (10000.00).
pub const MAX_PRICE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

static NUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid regex"));

static PERCENT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid regex"));

const CURRENCY_WORDS: [&str; 3] = ["EUR", "USD", "GBP"];

/// Full condition names, longest first so that `NEAR MINT` wins over `MINT`
/// and `LIGHT PLAYED` over `PLAYED`.
const CONDITION_NAMES: [(&str, Condition); 9] = [
    ("LIGHTLY PLAYED", Condition::LightPlayed),
    ("LIGHT PLAYED", Condition::LightPlayed),
    ("NEAR MINT", Condition::NearMint),
    ("EXCELLENT", Condition::Excellent),
    ("PLAYED", Condition::Played),
    ("LIGHT", Condition::LightPlayed),
    ("GOOD", Condition::Good),
    ("POOR", Condition::Poor),
    ("MINT", Condition::Mint),
];

const CONDITION_CODES: [(&str, Condition); 7] = [
    ("MT", Condition::Mint),
    ("NM", Condition::NearMint),
    ("EX", Condition::Excellent),
    ("GD", Condition::Good),
    ("LP", Condition::LightPlayed),
    ("PL", Condition::Played),
    ("PO", Condition::Poor),
];

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Round to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `value` lies in the accepted price range `[0.01, 10000.00]`.
pub fn in_price_range(value: Decimal) -> bool {
    (MIN_PRICE..=MAX_PRICE).contains(&value)
}

/// Parse a price fragment such as `"2,50 €"`, `"10.99 EUR"` or `"1.234,56 €"`.
///
/// Currency symbols, currency words and whitespace are removed, then the
/// first numeric run is read. When both `.` and `,` occur, the last one is
/// the decimal separator; a separator that repeats is a thousands separator.
/// The result is rounded to 2 decimal places.
pub fn parse_money(text: &str) -> Option<Decimal> {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(*c, '€' | '$' | '£'))
        .collect();
    for word in CURRENCY_WORDS {
        cleaned = cleaned.replace(word, "");
    }

    let run = NUMERIC_RUN.find(&cleaned)?.as_str();
    let normalized = normalize_separators(run.trim_end_matches(['.', ',']));
    Decimal::from_str(&normalized).ok().map(round_money)
}

fn normalize_separators(run: &str) -> String {
    let last_dot = run.rfind('.');
    let last_comma = run.rfind(',');

    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) if run.matches('.').count() == 1 => Some('.'),
        (None, Some(_)) if run.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    run.chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal_sep => Some('.'),
            '.' | ',' => None,
            digit => Some(digit),
        })
        .collect()
}

/// Detect the currency of a price fragment. Defaults to EUR.
pub fn detect_currency(text: &str) -> &'static str {
    let upper = text.to_uppercase();
    if text.contains('€') || upper.contains("EUR") {
        "EUR"
    } else if text.contains('$') || upper.contains("USD") {
        "USD"
    } else if text.contains('£') || upper.contains("GBP") {
        "GBP"
    } else {
        "EUR"
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Read the first number in `text` as a percentage, e.g. `"98,5%"` → `98.5`.
///
/// The value is not clamped to `[0, 100]`.
pub fn parse_percentage(text: &str) -> Option<f64> {
    let run = PERCENT_RUN.find(text)?.as_str().replace(',', ".");
    run.parse().ok()
}

/// Keep only the digits of `text` and read them as an integer.
///
/// `"1.234 Sales"` → `1234`; returns `None` when no digit is present.
pub fn parse_int(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Normalize free condition text to a [`Condition`].
///
/// Tries an exact code or name first, then a short code appearing as a
/// separate word, then a full name anywhere in the text. Non-blank text that
/// matches nothing is kept verbatim as [`Condition::Other`], truncated.
pub fn normalize_condition(text: &str) -> Option<Condition> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(condition) = Condition::from_code(trimmed) {
        return Some(condition);
    }

    let upper = trimmed.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for (code, condition) in CONDITION_CODES {
        if words.contains(&code) {
            return Some(condition);
        }
    }

    let spaced = format!(" {} ", words.join(" "));
    for (name, condition) in CONDITION_NAMES {
        if spaced.contains(&format!(" {name} ")) {
            return Some(condition);
        }
    }

    Some(Condition::from(text.to_string()))
}

/// Rank of a condition code or name; unknown text ranks 0.
pub fn condition_rank(code: &str) -> u8 {
    Condition::from_code(code).map_or(0, |c| c.rank())
}

/// Whether `condition` is at least `minimum`. An absent condition never
/// meets a minimum.
pub fn condition_meets_minimum(condition: Option<&Condition>, minimum: &Condition) -> bool {
    condition.is_some_and(|c| c.meets(minimum))
}
