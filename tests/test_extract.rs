//! Tests for offer extraction against saved product pages.

mod common;

use cardmarket_scanner::extract::product_id;
use cardmarket_scanner::models::flags;
use cardmarket_scanner::{Condition, Offer, OfferExtractor};
use rust_decimal_macros::dec;
use scraper::Html;

fn sample_offers() -> Vec<Offer> {
    OfferExtractor::new(150)
        .extract(&common::fixture("sample_product_page.html"))
        .offers
}

// ---------------------------------------------------------------------------
// Structured page
// ---------------------------------------------------------------------------

#[test]
fn test_sample_page_offer_count_and_product_id() {
    let extraction = OfferExtractor::new(150).extract(&common::fixture("sample_product_page.html"));
    assert_eq!(extraction.product_id.as_deref(), Some("12345"));
    assert_eq!(extraction.offers.len(), 8);
}

#[test]
fn test_positions_are_gapless_after_discarded_row() {
    let offers = sample_offers();
    let positions: Vec<u32> = offers.iter().map(Offer::position).collect();
    assert_eq!(positions, (1..=8).collect::<Vec<_>>());

    // The unpriced row sits between BudgetBinder and QuickShip.
    assert_eq!(offers[3].seller_name(), Some("BudgetBinder"));
    assert_eq!(offers[4].seller_name(), Some("QuickShip"));
    assert!(offers.iter().all(|o| o.seller_name() != Some("AskFirst")));
}

#[test]
fn test_first_offer_fields() {
    let offers = sample_offers();
    let first = &offers[0];

    assert_eq!(first.price_item(), dec!(2.50));
    assert_eq!(first.shipping(), Some(dec!(1.50)));
    assert_eq!(first.total(), dec!(4.00));
    assert_eq!(first.currency(), "EUR");
    assert_eq!(first.quantity(), Some(3));
    assert_eq!(first.condition(), Some(&Condition::NearMint));
    assert_eq!(first.language(), Some("English"));
    assert!(!first.is_foil());
    assert_eq!(first.seller_name(), Some("TopSeller123"));
    assert_eq!(first.seller_id(), Some("TopSeller123"));
    assert_eq!(first.seller_country(), Some("DE"));
    assert_eq!(first.seller_rating(), Some(98.5));
    assert_eq!(first.seller_sales(), Some(1234));
    assert_eq!(
        first.article_url(),
        Some("https://www.cardmarket.com/de/Riftbound/Article/98765001")
    );
    assert_eq!(first.article_id(), Some("98765001"));
    assert!(first.flags().is_empty());
}

#[test]
fn test_fields_are_read_per_row() {
    let offers = sample_offers();
    let second = &offers[1];

    assert_eq!(second.price_item(), dec!(3.00));
    assert_eq!(second.shipping(), None);
    assert_eq!(second.total(), dec!(3.00));
    assert_eq!(second.quantity(), Some(5));
    assert_eq!(second.condition(), Some(&Condition::Mint));
    assert_eq!(second.language(), Some("French"));
    assert_eq!(second.seller_country(), Some("FR"));
    assert_eq!(second.article_id(), Some("98765002"));
}

#[test]
fn test_conditions_and_languages() {
    let offers = sample_offers();
    let conditions: Vec<&str> = offers
        .iter()
        .map(|o| o.condition().map_or("", |c| c.code()))
        .collect();
    assert_eq!(conditions, ["NM", "MT", "EX", "GD", "PL", "NM", "EX", "NM"]);

    assert_eq!(offers[3].language(), Some("German"));
    assert_eq!(offers[4].language(), Some("Spanish"));
    assert_eq!(offers[7].language(), Some("Japanese"));
}

#[test]
fn test_flags_and_foil() {
    let offers = sample_offers();

    let pro = &offers[5];
    assert!(pro.has_flag(flags::PROFESSIONAL));
    assert!(pro.has_flag(flags::ON_VACATION));
    assert!(!pro.has_flag(flags::POWERSELLER));
    assert_eq!(pro.seller_rating(), Some(100.0));
    assert_eq!(pro.seller_sales(), Some(9870));

    let foils: Vec<u32> = offers.iter().filter(|o| o.is_foil()).map(Offer::position).collect();
    assert_eq!(foils, [8]);
}

#[test]
fn test_unreadable_rating_is_absent() {
    let offers = sample_offers();
    let unrated = &offers[6];
    assert_eq!(unrated.seller_name(), Some("NoRatingShop"));
    assert_eq!(unrated.seller_rating(), None);
    assert_eq!(unrated.price_item(), dec!(3.20));
}

#[test]
fn test_max_offers_caps_examined_containers() {
    let extraction = OfferExtractor::new(3).extract(&common::fixture("sample_product_page.html"));
    assert_eq!(extraction.offers.len(), 3);

    // The unpriced fifth row is never reached with a cap of 5.
    let capped = OfferExtractor::new(5).extract(&common::fixture("sample_product_page.html"));
    assert_eq!(capped.offers.len(), 4);
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

#[test]
fn test_markup_drift_falls_back_to_price_text() {
    let offers = OfferExtractor::new(150)
        .extract(&common::fixture("markup_drift_page.html"))
        .offers;
    assert_eq!(offers.len(), 3);

    assert_eq!(offers[0].price_item(), dec!(3.20));
    assert_eq!(offers[0].shipping(), Some(dec!(1.00)));
    assert_eq!(offers[0].total(), dec!(4.20));
    assert_eq!(offers[0].condition(), Some(&Condition::NearMint));

    assert_eq!(offers[1].total(), dec!(4.10));
    assert_eq!(offers[1].shipping(), None);
    assert_eq!(offers[1].condition(), Some(&Condition::Excellent));

    assert_eq!(offers[2].total(), dec!(2.80));
    assert_eq!(offers[2].condition(), Some(&Condition::Played));
}

#[test]
fn test_markup_drift_reads_thousands_grouped_amounts() {
    let html = r#"<table>
        <tr><td>Big Shop</td><td>1.234,56 €</td></tr>
        <tr><td>Small</td><td>3,00 €</td></tr>
        <tr><td>Crate Seller</td><td>2.000,00 €</td><td>+ 1.250,00 €</td></tr>
    </table>"#;
    let offers = OfferExtractor::new(150).extract(html).offers;
    let prices: Vec<_> = offers.iter().map(Offer::price_item).collect();
    assert_eq!(prices, [dec!(1234.56), dec!(3.00), dec!(2000.00)]);
    assert_eq!(offers[2].shipping(), Some(dec!(1250.00)));
    assert_eq!(offers[2].total(), dec!(3250.00));
}

#[test]
fn test_wrapper_container_is_not_an_offer() {
    let html = r#"<div class="article-table">
        <div class="article-line">
            <a href="/en/Riftbound/Users/Alpha">Alpha</a>
            <span class="color-primary">2,00 €</span>
        </div>
        <div class="article-line">
            <a href="/en/Riftbound/Users/Beta">Beta</a>
            <span class="color-primary">3,00 €</span>
        </div>
    </div>"#;
    let offers = OfferExtractor::new(150).extract(html).offers;
    let prices: Vec<_> = offers.iter().map(Offer::price_item).collect();
    assert_eq!(prices, [dec!(2.00), dec!(3.00)]);
    assert_eq!(offers[1].position(), 2);
    assert_eq!(offers[1].seller_name(), Some("Beta"));
}

#[test]
fn test_out_of_range_amounts_fall_through_to_next_strategy() {
    let html = r#"<div class="table-body">
        <div class="article-row">
            <span class="price-container"><span class="font-weight-bold">0,00 €</span></span>
            <span class="color-primary">2,50 €</span>
            <span class="shipping-price">+ 0,00 €</span>
            <span title="Versandkosten">+ 1,20 €</span>
        </div>
        <div class="article-row">
            <span class="price-container"><span class="font-weight-bold">20.000,00 €</span></span>
            <span class="color-primary">3,10 €</span>
            <span class="shipping-price">+ 12.000,00 €</span>
            <span title="Versandkosten">+ 2,00 €</span>
        </div>
    </div>"#;
    let offers = OfferExtractor::new(150).extract(html).offers;
    assert_eq!(offers.len(), 2);

    assert_eq!(offers[0].price_item(), dec!(2.50));
    assert_eq!(offers[0].shipping(), Some(dec!(1.20)));
    assert_eq!(offers[1].price_item(), dec!(3.10));
    assert_eq!(offers[1].shipping(), Some(dec!(2.00)));
    assert_eq!(offers[1].total(), dec!(5.10));
}

#[test]
fn test_foil_needs_whole_word_without_negation() {
    let html = r#"<div class="table-body">
        <div class="article-row"><span class="color-primary">2,00 €</span><span class="product-comments">Non-Foil, crisp</span></div>
        <div class="article-row"><span class="color-primary">2,10 €</span><span class="non-foil" data-original-title="Non-Foil"></span></div>
        <div class="article-row"><span class="color-primary">2,20 €</span><span class="product-comments">slightly foiled corners</span></div>
        <div class="article-row"><span class="color-primary">2,30 €</span><span class="product-comments">Holo</span></div>
        <div class="article-row"><span class="color-primary">2,40 €</span><span class="is-foil"></span></div>
    </div>"#;
    let offers = OfferExtractor::new(150).extract(html).offers;
    let foil: Vec<bool> = offers.iter().map(Offer::is_foil).collect();
    assert_eq!(foil, [false, false, false, true, true]);
}

#[test]
fn test_page_without_offers() {
    let extraction = OfferExtractor::new(150).extract(&common::fixture("no_offers_page.html"));
    assert!(extraction.offers.is_empty());
    assert_eq!(extraction.product_id.as_deref(), Some("777"));
}

#[test]
fn test_empty_and_garbage_input() {
    let extractor = OfferExtractor::new(150);
    assert!(extractor.extract("").offers.is_empty());
    assert!(extractor.extract("<<<not html>>>").offers.is_empty());
}

#[test]
fn test_product_id_from_canonical_link() {
    let extraction = OfferExtractor::new(150).extract(&common::fixture("price_ladder_page.html"));
    assert_eq!(extraction.product_id.as_deref(), Some("67890"));
}

#[test]
fn test_product_id_prefers_og_url() {
    let doc = Html::parse_document(
        r#"<html><head>
        <meta property="og:url" content="https://www.cardmarket.com/en/Riftbound/Products/111">
        <link rel="canonical" href="https://www.cardmarket.com/en/Riftbound/Products/222">
        </head><body></body></html>"#,
    );
    assert_eq!(product_id(&doc).as_deref(), Some("111"));
}

#[test]
fn test_product_id_absent() {
    let doc = Html::parse_document("<html><head><title>x</title></head></html>");
    assert_eq!(product_id(&doc), None);
}

#[test]
fn test_inline_row_with_english_number_format() {
    let html = r#"<div class="article-row">
        <span class="price-container"><span class="font-weight-bold">1,234.50 €</span></span>
        <span class="seller-name"><a href="/en/Riftbound/Users/Big%20Shop?tab=offers">Big Shop</a></span>
    </div>"#;
    let offers = OfferExtractor::new(150).extract(html).offers;
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].price_item(), dec!(1234.50));
    assert_eq!(offers[0].seller_id(), Some("Big%20Shop"));
    assert_eq!(offers[0].seller_name(), Some("Big Shop"));
}
