use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::condition::Condition;
use crate::error::{Result, ScannerError};
use crate::parse::{round_money, MAX_PRICE};

/// Currency assumed when none can be detected on the page.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Well-known entries of [`Offer::flags`].
pub mod flags {
    pub const PROFESSIONAL: &str = "professional";
    pub const POWERSELLER: &str = "powerseller";
    pub const ON_VACATION: &str = "onVacation";
    pub const FIRST_EDITION: &str = "firstEdition";
}

// ---------------------------------------------------------------------------
// Offer — One marketplace listing observed at scan time
// ---------------------------------------------------------------------------

/// A single seller's listing, as extracted from one product page.
///
/// Offers are immutable once built. `total` is derived at construction time
/// (`price_item + shipping`, or `price_item` alone) so `total >= price_item`
/// always holds. Construct through [`Offer::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "OfferBuilder")]
pub struct Offer {
    position: u32,
    price_item: Decimal,
    shipping: Option<Decimal>,
    total: Decimal,
    currency: String,
    quantity: Option<u32>,
    condition: Option<Condition>,
    language: Option<String>,
    is_foil: bool,
    seller_name: Option<String>,
    seller_id: Option<String>,
    seller_country: Option<String>,
    seller_rating: Option<f64>,
    seller_sales: Option<u64>,
    article_url: Option<String>,
    article_id: Option<String>,
    flags: BTreeSet<String>,
}

impl Offer {
    /// Start building an offer at the given 1-based page position.
    pub fn builder(position: u32, price_item: Decimal) -> OfferBuilder {
        OfferBuilder::new(position, price_item)
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn price_item(&self) -> Decimal {
        self.price_item
    }

    pub fn shipping(&self) -> Option<Decimal> {
        self.shipping
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    /// The price used for statistics and deal detection.
    ///
    /// This is the total (item plus shipping when known).
    pub fn price_basis(&self) -> Decimal {
        self.total
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn is_foil(&self) -> bool {
        self.is_foil
    }

    pub fn seller_name(&self) -> Option<&str> {
        self.seller_name.as_deref()
    }

    pub fn seller_id(&self) -> Option<&str> {
        self.seller_id.as_deref()
    }

    pub fn seller_country(&self) -> Option<&str> {
        self.seller_country.as_deref()
    }

    pub fn seller_rating(&self) -> Option<f64> {
        self.seller_rating
    }

    pub fn seller_sales(&self) -> Option<u64> {
        self.seller_sales
    }

    pub fn article_url(&self) -> Option<&str> {
        self.article_url.as_deref()
    }

    pub fn article_id(&self) -> Option<&str> {
        self.article_id.as_deref()
    }

    pub fn flags(&self) -> &BTreeSet<String> {
        &self.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Seller identity used for distinct-seller counting.
    ///
    /// Prefers the seller id and falls back to the seller name.
    pub fn seller_identity(&self) -> Option<&str> {
        self.seller_id().or_else(|| self.seller_name())
    }
}

// ---------------------------------------------------------------------------
// OfferBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Offer`]. Validates the price and computes `total` in
/// [`build()`](OfferBuilder::build).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferBuilder {
    position: u32,
    price_item: Decimal,
    #[serde(default)]
    shipping: Option<Decimal>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    condition: Option<Condition>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    is_foil: bool,
    #[serde(default)]
    seller_name: Option<String>,
    #[serde(default)]
    seller_id: Option<String>,
    #[serde(default)]
    seller_country: Option<String>,
    #[serde(default)]
    seller_rating: Option<f64>,
    #[serde(default)]
    seller_sales: Option<u64>,
    #[serde(default)]
    article_url: Option<String>,
    #[serde(default)]
    article_id: Option<String>,
    #[serde(default)]
    flags: BTreeSet<String>,
}

impl OfferBuilder {
    fn new(position: u32, price_item: Decimal) -> Self {
        Self {
            position,
            price_item,
            shipping: None,
            currency: None,
            quantity: None,
            condition: None,
            language: None,
            is_foil: false,
            seller_name: None,
            seller_id: None,
            seller_country: None,
            seller_rating: None,
            seller_sales: None,
            article_url: None,
            article_id: None,
            flags: BTreeSet::new(),
        }
    }

    pub fn shipping(mut self, shipping: impl Into<Option<Decimal>>) -> Self {
        self.shipping = shipping.into();
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn quantity(mut self, quantity: impl Into<Option<u32>>) -> Self {
        self.quantity = quantity.into();
        self
    }

    pub fn condition(mut self, condition: impl Into<Option<Condition>>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn language(mut self, language: Option<impl Into<String>>) -> Self {
        self.language = language.map(Into::into);
        self
    }

    pub fn foil(mut self, is_foil: bool) -> Self {
        self.is_foil = is_foil;
        self
    }

    pub fn seller_name(mut self, name: Option<impl Into<String>>) -> Self {
        self.seller_name = name.map(Into::into);
        self
    }

    pub fn seller_id(mut self, id: Option<impl Into<String>>) -> Self {
        self.seller_id = id.map(Into::into);
        self
    }

    pub fn seller_country(mut self, country: Option<impl Into<String>>) -> Self {
        self.seller_country = country.map(Into::into);
        self
    }

    pub fn seller_rating(mut self, rating: impl Into<Option<f64>>) -> Self {
        self.seller_rating = rating.into();
        self
    }

    pub fn seller_sales(mut self, sales: impl Into<Option<u64>>) -> Self {
        self.seller_sales = sales.into();
        self
    }

    pub fn article_url(mut self, url: Option<impl Into<String>>) -> Self {
        self.article_url = url.map(Into::into);
        self
    }

    pub fn article_id(mut self, id: Option<impl Into<String>>) -> Self {
        self.article_id = id.map(Into::into);
        self
    }

    /// Add a single flag (see [`flags`]).
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn flags(mut self, flags: BTreeSet<String>) -> Self {
        self.flags = flags;
        self
    }

    /// Validate and build the offer.
    ///
    /// Fails with [`ScannerError::InvalidArgument`] when the position is 0,
    /// the item price lies outside `(0.00, 10000.00]`, or shipping is negative.
    pub fn build(self) -> Result<Offer> {
        if self.position == 0 {
            return Err(ScannerError::InvalidArgument(
                "offer position is 1-based".into(),
            ));
        }

        let price_item = round_money(self.price_item);
        if price_item <= Decimal::ZERO || price_item > MAX_PRICE {
            return Err(ScannerError::InvalidArgument(format!(
                "item price {} outside (0.00, {}]",
                price_item, MAX_PRICE
            )));
        }

        let shipping = self.shipping.map(round_money);
        if let Some(s) = shipping {
            if s < Decimal::ZERO {
                return Err(ScannerError::InvalidArgument(format!(
                    "shipping {} is negative",
                    s
                )));
            }
        }

        let total = match shipping {
            Some(s) => price_item + s,
            None => price_item,
        };

        Ok(Offer {
            position: self.position,
            price_item,
            shipping,
            total,
            currency: self
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            quantity: self.quantity.filter(|q| *q > 0),
            condition: self.condition,
            language: self.language,
            is_foil: self.is_foil,
            seller_name: self.seller_name,
            seller_id: self.seller_id,
            seller_country: self.seller_country,
            seller_rating: self.seller_rating,
            seller_sales: self.seller_sales,
            article_url: self.article_url,
            article_id: self.article_id,
            flags: self.flags,
        })
    }
}

impl TryFrom<OfferBuilder> for Offer {
    type Error = ScannerError;

    fn try_from(builder: OfferBuilder) -> Result<Self> {
        builder.build()
    }
}
