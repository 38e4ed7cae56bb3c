//! Offer extraction from Cardmarket product pages.
//!
//! Containers are located with an ordered list of structural selectors; the
//! first selector that matches anything wins. When none match, containers are
//! synthesized from text nodes holding a currency amount. Each container is
//! then read field by field, and only a missing price discards it.

mod fields;
mod selectors;

pub use fields::product_id;

use scraper::{ElementRef, Html};
use std::collections::HashSet;

use crate::models::{Extraction, Offer};
use crate::parse::detect_currency;

/// Extracts offers from one HTML document.
#[derive(Debug, Clone, Copy)]
pub struct OfferExtractor {
    max_offers: usize,
}

impl OfferExtractor {
    /// Create an extractor that examines at most `max_offers` containers.
    pub fn new(max_offers: usize) -> Self {
        Self { max_offers }
    }

    pub fn max_offers(&self) -> usize {
        self.max_offers
    }

    /// Parse `html` and extract its offers and product id.
    pub fn extract(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);
        Extraction {
            product_id: product_id(&document),
            offers: self.offers(&document),
        }
    }

    /// Offers of an already parsed document, in page order with gapless
    /// 1-based positions.
    pub fn offers(&self, document: &Html) -> Vec<Offer> {
        let containers = find_containers(document);
        let mut offers = Vec::new();

        for (index, container) in containers.into_iter().take(self.max_offers).enumerate() {
            let position = offers.len() as u32 + 1;
            match read_offer(container, position) {
                Some(offer) => offers.push(offer),
                None => tracing::debug!(candidate = index + 1, "discarded candidate without a valid price"),
            }
        }

        tracing::debug!(count = offers.len(), "extracted offers");
        offers
    }
}

/// Locate offer containers, structural selectors first, then by content.
fn find_containers(document: &Html) -> Vec<ElementRef<'_>> {
    for (css, selector) in selectors::OFFER_CONTAINERS.iter() {
        let found: Vec<_> = document.select(selector).collect();
        if !found.is_empty() {
            let found = innermost(found);
            tracing::debug!(selector = *css, count = found.len(), "offer containers found");
            return found;
        }
    }

    let mut seen = HashSet::new();
    let mut containers = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !selectors::AMOUNT_TEXT.is_match(text) {
            continue;
        }
        let block = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| selectors::BLOCK_TAGS.contains(&el.value().name()));
        if let Some(block) = block {
            if seen.insert(block.id()) {
                containers.push(block);
            }
        }
    }

    tracing::debug!(count = containers.len(), "offer containers synthesized from price text");
    containers
}

/// Drop matches that wrap another match, so a wrapper around several rows
/// is not read as an offer of its own.
fn innermost(found: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = found.iter().map(|el| el.id()).collect();
    found
        .into_iter()
        .filter(|el| !el.descendants().skip(1).any(|node| ids.contains(&node.id())))
        .collect()
}

/// Read one container. `None` when it carries no valid item price.
fn read_offer(container: ElementRef<'_>, position: u32) -> Option<Offer> {
    let text = fields::full_text(container);
    let price = fields::price(container, &text)?;

    let seller = fields::seller_link(container);
    let (article_url, article_id) = fields::article(container);

    let built = Offer::builder(position, price)
        .shipping(fields::shipping(container, &text))
        .currency(detect_currency(&text))
        .quantity(fields::quantity(container))
        .condition(fields::condition(container, &text))
        .language(fields::language(container))
        .foil(fields::is_foil(container, &text))
        .seller_name(seller.name)
        .seller_id(seller.id)
        .seller_country(fields::seller_country(container))
        .seller_rating(fields::seller_rating(container))
        .seller_sales(fields::seller_sales(container))
        .article_url(article_url)
        .article_id(article_id)
        .flags(fields::offer_flags(container, &text))
        .build();

    match built {
        Ok(offer) => Some(offer),
        Err(e) => {
            tracing::debug!(position, error = %e, "offer rejected");
            None
        }
    }
}
