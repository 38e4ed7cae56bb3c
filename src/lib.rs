//! Cardmarket offer scanner.
//!
//! Extracts structured offers from Cardmarket product pages, summarizes
//! their prices and flags offers priced well below a rolling historical
//! baseline. The analysis is pure and synchronous; fetching pages and
//! storing history are separate collaborators ([`fetch`], [`history`]).
//!
//! # Quick start
//!
//! ```no_run
//! use cardmarket_scanner::{FetchConfig, FlareSolverrClient, ScanHistory, ScanKey, Scanner};
//!
//! let scanner = Scanner::builder().build().unwrap();
//! let history = ScanHistory::open_default().unwrap();
//! let client = FlareSolverrClient::new(FetchConfig::default()).unwrap();
//!
//! let key = ScanKey::new("12", "OGN", "DE", false);
//! let url = "https://www.cardmarket.com/de/Riftbound/Products/Singles/Origins/Sett-The-Boss";
//! let report = scanner.scan(&client, &history, &key, url).unwrap();
//! history.record_report(&key, url, Some(200), &report).unwrap();
//!
//! for deal in &report.deals {
//!     println!("{}", deal.reason);
//! }
//! ```

pub mod aggregate;
#[cfg(feature = "async")]
pub mod async_client;
pub mod baseline;
pub mod config;
pub mod deals;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod history;
pub mod models;
pub mod parse;

#[cfg(feature = "async")]
pub use async_client::AsyncScanner;
pub use baseline::{BaselineProvider, InMemoryBaselines};
pub use config::{FetchConfig, ScanConfig};
pub use deals::DealPolicy;
pub use error::{Result, ScannerError};
pub use extract::OfferExtractor;
pub use fetch::{FetchedPage, Fetcher, FlareSolverrClient};
pub use history::ScanHistory;
pub use models::{AggregatedStats, Condition, DealCandidate, Extraction, Offer, ScanKey, ScanReport};

use rust_decimal::Decimal;
use std::fmt;

// ---------------------------------------------------------------------------
// ScannerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Scanner`].
///
/// Use [`Scanner::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](ScannerBuilder::build) to validate the
/// settings.
#[derive(Debug, Clone, Default)]
pub struct ScannerBuilder {
    config: ScanConfig,
}

impl ScannerBuilder {
    /// Replace every setting with `config`.
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Fraction below baseline that makes a deal. Defaults to `0.15`.
    pub fn deal_threshold(mut self, threshold: Decimal) -> Self {
        self.config.deal_threshold = threshold;
        self
    }

    /// Minimum seller rating in percent. Defaults to `90.0`.
    pub fn min_seller_rating(mut self, rating: f64) -> Self {
        self.config.min_seller_rating = rating;
        self
    }

    /// Worst acceptable condition for deals. Defaults to `GD`.
    pub fn min_condition(mut self, condition: Condition) -> Self {
        self.config.min_condition = condition;
        self
    }

    /// Maximum number of offer containers examined per page. Defaults to 150.
    pub fn max_offers(mut self, max_offers: usize) -> Self {
        self.config.max_offers = max_offers;
        self
    }

    /// Number of recent scans the baseline is computed over. Defaults to 48.
    pub fn baseline_window(mut self, window: usize) -> Self {
        self.config.baseline_window = window;
        self
    }

    /// Validate the settings and build the scanner.
    pub fn build(self) -> Result<Scanner> {
        self.config.validate()?;
        Ok(Scanner {
            extractor: OfferExtractor::new(self.config.max_offers),
            policy: DealPolicy::from(&self.config),
            config: self.config,
        })
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// The analysis pipeline: HTML to offers, offers to statistics, and offers
/// plus baseline to deals.
///
/// A `Scanner` holds only configuration and can be shared freely between
/// threads.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    extractor: OfferExtractor,
    policy: DealPolicy,
}

impl Scanner {
    /// Create a new builder for configuring the scanner.
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::default()
    }

    /// Build a scanner from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::builder().config(ScanConfig::from_env()?).build()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn policy(&self) -> &DealPolicy {
        &self.policy
    }

    /// Extract offers and the product id from a page.
    pub fn extract(&self, html: &str) -> Extraction {
        self.extractor.extract(html)
    }

    /// Price statistics for `offers`.
    pub fn aggregate(&self, offers: &[Offer]) -> AggregatedStats {
        aggregate::aggregate(offers)
    }

    /// Deals among `offers` against `baseline`; empty without a baseline.
    pub fn detect_deals(&self, offers: &[Offer], baseline: Option<Decimal>) -> Vec<DealCandidate> {
        self.policy.detect(offers, baseline)
    }

    /// Run the whole pipeline over one page.
    pub fn analyze(&self, html: &str, baseline: Option<Decimal>) -> ScanReport {
        let Extraction { product_id, offers } = self.extract(html);
        let stats = self.aggregate(&offers);
        let deals = self.detect_deals(&offers, baseline);

        tracing::info!(
            product_id = ?product_id,
            offers = offers.len(),
            median = ?stats.median,
            ?baseline,
            deals = deals.len(),
            "analyzed page"
        );

        ScanReport {
            product_id,
            offers,
            stats,
            baseline,
            deals,
        }
    }

    /// Fetch `url`, look up the baseline for `key` and analyze the page.
    ///
    /// A not-found page is a [`ScannerError::NotFound`]. A page without
    /// offers still produces a (empty) report.
    pub fn scan<F, B>(&self, fetcher: &F, baselines: &B, key: &ScanKey, url: &str) -> Result<ScanReport>
    where
        F: Fetcher + ?Sized,
        B: BaselineProvider + ?Sized,
    {
        let page = fetcher.fetch(url)?;
        if page.is_not_found() {
            tracing::warn!(%key, url, status = ?page.http_status, "product page not found");
            return Err(ScannerError::NotFound(format!("{key}: {url}")));
        }

        let baseline = baselines.baseline(key, self.config.baseline_window)?;
        let report = self.analyze(&page.html, baseline);
        if !report.has_offers() {
            tracing::warn!(%key, url, "no offers found on page");
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanner(threshold={}, min_rating={}, min_condition={}, max_offers={}, window={})",
            self.config.deal_threshold,
            self.config.min_seller_rating,
            self.config.min_condition,
            self.config.max_offers,
            self.config.baseline_window
        )
    }
}
