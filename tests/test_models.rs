//! Tests for the record types: `Offer` construction, `Condition` and
//! `ScanKey`.

mod common;

use cardmarket_scanner::models::flags;
use cardmarket_scanner::{AggregatedStats, Condition, Offer, ScanKey, ScannerError};
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Offer
// ---------------------------------------------------------------------------

#[test]
fn test_offer_total_includes_shipping() {
    let offer = Offer::builder(1, dec!(2.50))
        .shipping(dec!(1.50))
        .build()
        .unwrap();
    assert_eq!(offer.total(), dec!(4.00));
    assert_eq!(offer.price_basis(), dec!(4.00));
    assert!(offer.total() >= offer.price_item());
}

#[test]
fn test_offer_total_without_shipping() {
    let offer = common::offer(1, dec!(3.00));
    assert_eq!(offer.shipping(), None);
    assert_eq!(offer.total(), dec!(3.00));
    assert_eq!(offer.currency(), "EUR");
}

#[test]
fn test_offer_prices_rounded_to_cents() {
    let offer = Offer::builder(1, dec!(2.505))
        .shipping(dec!(0.994))
        .build()
        .unwrap();
    assert_eq!(offer.price_item(), dec!(2.51));
    assert_eq!(offer.shipping(), Some(dec!(0.99)));
    assert_eq!(offer.total(), dec!(3.50));
}

#[test]
fn test_offer_rejects_out_of_range_price() {
    for price in [dec!(0), dec!(-1), dec!(10000.01)] {
        let err = Offer::builder(1, price).build().unwrap_err();
        assert!(matches!(err, ScannerError::InvalidArgument(_)), "{price}");
    }
    assert!(Offer::builder(1, dec!(10000)).build().is_ok());
}

#[test]
fn test_offer_rejects_position_zero_and_negative_shipping() {
    assert!(Offer::builder(0, dec!(1)).build().is_err());
    assert!(Offer::builder(1, dec!(1))
        .shipping(dec!(-0.50))
        .build()
        .is_err());
}

#[test]
fn test_offer_zero_quantity_dropped() {
    let offer = Offer::builder(1, dec!(1)).quantity(0u32).build().unwrap();
    assert_eq!(offer.quantity(), None);
}

#[test]
fn test_offer_flags_and_identity() {
    let offer = Offer::builder(2, dec!(1))
        .seller_name(Some("Shop"))
        .seller_id(Some("shop-id"))
        .flag(flags::PROFESSIONAL)
        .build()
        .unwrap();
    assert!(offer.has_flag(flags::PROFESSIONAL));
    assert!(!offer.has_flag(flags::ON_VACATION));
    assert_eq!(offer.seller_identity(), Some("shop-id"));

    let anonymous = common::offer(3, dec!(1));
    assert_eq!(anonymous.seller_identity(), None);
}

#[test]
fn test_offer_serde_recomputes_total() {
    let json = serde_json::json!({
        "position": 4,
        "priceItem": "2.00",
        "shipping": "1.25",
        "total": "99.99",
        "condition": "EX",
        "isFoil": true,
        "flags": ["onVacation"]
    });
    let offer: Offer = serde_json::from_value(json).unwrap();
    assert_eq!(offer.total(), dec!(3.25));
    assert_eq!(offer.condition(), Some(&Condition::Excellent));
    assert!(offer.is_foil());
    assert!(offer.has_flag(flags::ON_VACATION));
}

#[test]
fn test_offer_serde_rejects_invalid_price() {
    let json = serde_json::json!({ "position": 1, "priceItem": "0" });
    assert!(serde_json::from_value::<Offer>(json).is_err());
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

#[test]
fn test_condition_codes_and_order() {
    let known = Condition::KNOWN;
    let codes: Vec<&str> = known.iter().map(|c| c.code()).collect();
    assert_eq!(codes, ["MT", "NM", "EX", "GD", "LP", "PL", "PO"]);
    assert!(known.windows(2).all(|w| w[0].rank() > w[1].rank()));
}

#[test]
fn test_condition_serializes_as_code() {
    let json = serde_json::to_value(Condition::NearMint).unwrap();
    assert_eq!(json, serde_json::json!("NM"));

    let other: Condition = serde_json::from_value(serde_json::json!("Graded 9")).unwrap();
    assert_eq!(other, Condition::Other("Graded 9".into()));
    assert_eq!(other.rank(), 0);
}

// ---------------------------------------------------------------------------
// ScanKey / AggregatedStats
// ---------------------------------------------------------------------------

#[test]
fn test_scan_key_display() {
    assert_eq!(ScanKey::new("12", "OGN", "DE", false).to_string(), "OGN/12/DE");
    assert_eq!(ScanKey::new("12", "OGN", "DE", true).to_string(), "OGN/12/DE/foil");
}

#[test]
fn test_scan_keys_differ_by_foil() {
    assert_ne!(
        ScanKey::new("12", "OGN", "DE", false),
        ScanKey::new("12", "OGN", "DE", true)
    );
}

#[test]
fn test_empty_stats() {
    let stats = AggregatedStats::default();
    assert!(stats.is_empty());
    assert_eq!(stats.quantiles(), None);
}
