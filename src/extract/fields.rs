//! Per-field extraction strategies.
//!
//! Each function runs a short cascade over one offer container: structural
//! lookups in priority order, then a scan of the container's text. The first
//! strategy yielding a value wins; a field nobody finds is `None`.

use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

use super::selectors;
use crate::config::CARDMARKET_BASE;
use crate::models::{flags, Condition};
use crate::parse::{in_price_range, normalize_condition, parse_int, parse_money, parse_percentage};

const LANGUAGES: [(&str, &str); 26] = [
    ("english", "English"),
    ("englisch", "English"),
    ("en", "English"),
    ("german", "German"),
    ("deutsch", "German"),
    ("de", "German"),
    ("french", "French"),
    ("französisch", "French"),
    ("fr", "French"),
    ("spanish", "Spanish"),
    ("spanisch", "Spanish"),
    ("es", "Spanish"),
    ("italian", "Italian"),
    ("italienisch", "Italian"),
    ("it", "Italian"),
    ("japanese", "Japanese"),
    ("japanisch", "Japanese"),
    ("jp", "Japanese"),
    ("ja", "Japanese"),
    ("chinese", "Chinese"),
    ("chinesisch", "Chinese"),
    ("korean", "Korean"),
    ("koreanisch", "Korean"),
    ("portuguese", "Portuguese"),
    ("portugiesisch", "Portuguese"),
    ("pt", "Portuguese"),
];

/// Seller link details: display name and the id from the profile URL.
#[derive(Debug, Default)]
pub(crate) struct SellerLink {
    pub name: Option<String>,
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// All text below `el`, one space between text nodes.
pub(crate) fn full_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First value `read` produces from the first match of each selector, in
/// order.
fn first_match<'a, T>(
    el: ElementRef<'a>,
    strategies: &[(&'static str, Selector)],
    read: impl Fn(ElementRef<'a>) -> Option<T>,
) -> Option<T> {
    strategies
        .iter()
        .filter_map(|(_, selector)| el.select(selector).next())
        .find_map(read)
}

fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn title_of<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    attr(el, "data-original-title").or_else(|| attr(el, "title"))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn priced(text: &str) -> Option<Decimal> {
    parse_money(text).filter(|p| in_price_range(*p))
}

// ---------------------------------------------------------------------------
// Price, shipping, quantity
// ---------------------------------------------------------------------------

pub(crate) fn price(el: ElementRef<'_>, text: &str) -> Option<Decimal> {
    first_match(el, &selectors::PRICE, |e| priced(&full_text(e))).or_else(|| {
        selectors::PRICE_TEXT
            .captures_iter(text)
            .find_map(|caps| priced(&caps[1]))
    })
}

pub(crate) fn shipping(el: ElementRef<'_>, text: &str) -> Option<Decimal> {
    first_match(el, &selectors::SHIPPING, |e| priced(&full_text(e))).or_else(|| {
        selectors::SHIPPING_TEXT
            .captures_iter(text)
            .find_map(|caps| priced(&caps[1]))
    })
}

pub(crate) fn quantity(el: ElementRef<'_>) -> Option<u32> {
    first_match(el, &selectors::QUANTITY, |e| {
        let raw = attr(e, "value")
            .map(str::to_string)
            .unwrap_or_else(|| full_text(e));
        parse_int(&raw)
            .filter(|q| *q > 0)
            .and_then(|q| u32::try_from(q).ok())
    })
}

// ---------------------------------------------------------------------------
// Condition, language, foil
// ---------------------------------------------------------------------------

fn known_condition(text: &str) -> Option<Condition> {
    normalize_condition(text).filter(|c| !matches!(c, Condition::Other(_)))
}

pub(crate) fn condition(el: ElementRef<'_>, text: &str) -> Option<Condition> {
    // Every element of a strategy is inspected: condition badges often share
    // selectors with unrelated tooltips.
    let structural = selectors::CONDITION
        .iter()
        .flat_map(|(_, selector)| el.select(selector))
        .find_map(|e| {
            title_of(e)
                .and_then(known_condition)
                .or_else(|| known_condition(&full_text(e)))
        });

    structural
        .or_else(|| {
            selectors::CONDITION_TEXT
                .find(text)
                .and_then(|m| normalize_condition(m.as_str()))
        })
        .or_else(|| {
            el.select(&selectors::CONDITION_CLASS)
                .next()
                .and_then(|e| normalize_condition(&full_text(e)))
        })
}

pub(crate) fn language(el: ElementRef<'_>) -> Option<String> {
    first_match(el, &selectors::LANGUAGE, |e| {
        let haystack = [
            title_of(e).unwrap_or_default(),
            attr(e, "alt").unwrap_or_default(),
            attr(e, "src").unwrap_or_default(),
            full_text(e).as_str(),
        ]
        .join(" ")
        .to_lowercase();

        haystack
            .split(|c: char| !c.is_alphabetic())
            .find_map(|word| {
                LANGUAGES
                    .iter()
                    .find(|(key, _)| *key == word)
                    .map(|(_, name)| name.to_string())
            })
    })
}

/// `foil`, `holo` or `holographic` as a word, not negated by `non-`.
fn names_foil(text: &str) -> bool {
    selectors::FOIL_WORD
        .captures_iter(text)
        .any(|caps| caps.get(1).is_none())
}

pub(crate) fn is_foil(el: ElementRef<'_>, text: &str) -> bool {
    let marked = |e: ElementRef<'_>| {
        names_foil(attr(e, "class").unwrap_or_default())
            || attr(e, "data-original-title").is_some_and(names_foil)
    };
    marked(el) || names_foil(text) || el.select(&selectors::FOIL_MARKER).any(marked)
}

// ---------------------------------------------------------------------------
// Seller
// ---------------------------------------------------------------------------

pub(crate) fn seller_link(el: ElementRef<'_>) -> SellerLink {
    first_match(el, &selectors::SELLER_LINK, |e| {
        let name = non_empty(full_text(e));
        let id = attr(e, "href")
            .and_then(|href| selectors::SELLER_ID.captures(href))
            .map(|caps| caps[1].to_string());
        if name.is_none() && id.is_none() {
            return None;
        }
        Some(SellerLink { name, id })
    })
    .unwrap_or_default()
}

pub(crate) fn seller_rating(el: ElementRef<'_>) -> Option<f64> {
    first_match(el, &selectors::SELLER_RATING, |e| {
        attr(e, "title")
            .and_then(parse_percentage)
            .or_else(|| parse_percentage(&full_text(e)))
    })
}

pub(crate) fn seller_sales(el: ElementRef<'_>) -> Option<u64> {
    first_match(el, &selectors::SELLER_SALES, |e| {
        parse_int(&full_text(e)).or_else(|| attr(e, "title").and_then(parse_int))
    })
}

pub(crate) fn seller_country(el: ElementRef<'_>) -> Option<String> {
    first_match(el, &selectors::SELLER_COUNTRY, |e| {
        let haystack = format!(
            "{} {}",
            attr(e, "class").unwrap_or_default(),
            attr(e, "src").unwrap_or_default()
        );
        let caps = selectors::COUNTRY_CODE.captures(&haystack)?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_uppercase())
    })
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

fn absolute_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{CARDMARKET_BASE}{href}")
    } else {
        format!("{CARDMARKET_BASE}/{href}")
    }
}

/// Article URL (absolute) and numeric article id.
pub(crate) fn article(el: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let url = first_match(el, &selectors::ARTICLE_LINK, |e| {
        attr(e, "href").map(absolute_url)
    });

    let id = url
        .as_deref()
        .and_then(|u| selectors::ARTICLE_ID.captures(u))
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            selectors::ARTICLE_ID_ATTRS
                .iter()
                .find_map(|name| attr(el, name).map(str::to_string))
        });

    (url, id)
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

pub(crate) fn offer_flags(el: ElementRef<'_>, text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let markers: [(&Selector, &str); 3] = [
        (&*selectors::PROFESSIONAL, flags::PROFESSIONAL),
        (&*selectors::POWERSELLER, flags::POWERSELLER),
        (&*selectors::ON_VACATION, flags::ON_VACATION),
    ];
    for (selector, flag) in markers {
        if el.select(selector).next().is_some() {
            found.insert(flag.to_string());
        }
    }
    if text.to_lowercase().contains("first edition") {
        found.insert(flags::FIRST_EDITION.to_string());
    }
    found
}

// ---------------------------------------------------------------------------
// Document level
// ---------------------------------------------------------------------------

/// Numeric product id from the `og:url` meta tag, else the canonical link.
pub fn product_id(document: &Html) -> Option<String> {
    let from = |selector: &Selector, name: &str| {
        document
            .select(selector)
            .filter_map(|e| e.value().attr(name))
            .find_map(|value| selectors::PRODUCT_ID.captures(value))
            .map(|caps| caps[1].to_string())
    };

    from(&*selectors::OG_URL, "content").or_else(|| from(&*selectors::CANONICAL, "href"))
}
