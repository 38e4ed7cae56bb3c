//! Shared fixtures for the scanner integration tests.
//!
//! Provides saved product pages from `tests/fixtures/`, quick offer
//! constructors, and a canned [`Fetcher`] that serves fixed pages without
//! touching the network.

#![allow(dead_code)]

use cardmarket_scanner::{Condition, FetchedPage, Fetcher, Offer, Result, ScannerError};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Load an HTML fixture by file name.
pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {path}: {e}"))
}

/// A bare offer: price only, no seller or condition data.
pub fn offer(position: u32, price: Decimal) -> Offer {
    Offer::builder(position, price).build().unwrap()
}

/// An offer with the fields deal detection looks at.
pub fn rated_offer(
    position: u32,
    price: Decimal,
    rating: Option<f64>,
    condition: Option<Condition>,
) -> Offer {
    Offer::builder(position, price)
        .seller_name(Some(format!("seller-{position}")))
        .seller_rating(rating)
        .condition(condition)
        .build()
        .unwrap()
}

/// Offers at the given prices, positions 1..n, one seller each.
pub fn ladder(prices: &[Decimal]) -> Vec<Offer> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            Offer::builder(i as u32 + 1, *price)
                .seller_name(Some(format!("seller-{}", i + 1)))
                .seller_rating(99.0)
                .condition(Condition::NearMint)
                .build()
                .unwrap()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// StaticFetcher
// ---------------------------------------------------------------------------

/// Serves canned pages by URL and counts requests. Unknown URLs fail.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, FetchedPage>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: String, status: u16) -> Self {
        self.pages
            .insert(url.to_string(), FetchedPage::new(html, Some(status)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScannerError::Fetch(format!("no canned page for {url}")))
    }
}
