use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ScannerError};
use crate::models::Condition;

pub const CARDMARKET_BASE: &str = "https://www.cardmarket.com";

/// Version tag stored with every recorded scan.
pub const PARSE_VERSION: &str = "v2.0";

pub const DEFAULT_FLARESOLVERR_URL: &str = "http://localhost:8191/v1";
pub const DEFAULT_SESSION_ID: &str = "cardmarket_scanner_session";

pub const DEFAULT_MAX_OFFERS: usize = 150;
pub const DEFAULT_BASELINE_WINDOW: usize = 48;
pub const DEFAULT_MIN_SELLER_RATING: f64 = 90.0;

/// Environment variable names.
pub mod env {
    pub const DEAL_THRESHOLD: &str = "DEAL_THRESHOLD";
    pub const MIN_SELLER_RATING: &str = "MIN_SELLER_RATING";
    pub const MIN_CONDITION: &str = "MIN_CONDITION";
    pub const MAX_OFFERS_PER_SCAN: &str = "MAX_OFFERS_PER_SCAN";
    pub const BASELINE_WINDOW_SCANS: &str = "BASELINE_WINDOW_SCANS";
    pub const FLARESOLVERR_URL: &str = "FLARESOLVERR_URL";
    pub const REQUEST_TIMEOUT_SEC: &str = "REQUEST_TIMEOUT_SEC";
    pub const MAX_RETRIES: &str = "MAX_RETRIES";
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("cardmarket-scanner")
    } else {
        PathBuf::from(".cardmarket-scanner")
    }
}

/// Default location of the scan history database.
pub fn default_history_path() -> PathBuf {
    default_data_dir().join("history.duckdb")
}

fn read_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            ScannerError::Config(format!("{name}: cannot parse {:?}", raw))
        }),
        _ => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

/// Pipeline settings: deal rules, extraction cap and baseline window.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub deal_threshold: Decimal,
    pub min_seller_rating: f64,
    pub min_condition: Condition,
    pub max_offers: usize,
    pub baseline_window: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            deal_threshold: Decimal::new(15, 2),
            min_seller_rating: DEFAULT_MIN_SELLER_RATING,
            min_condition: Condition::Good,
            max_offers: DEFAULT_MAX_OFFERS,
            baseline_window: DEFAULT_BASELINE_WINDOW,
        }
    }
}

impl ScanConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup. Unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let min_condition = match lookup(env::MIN_CONDITION) {
            Some(raw) if !raw.trim().is_empty() => Condition::from_code(&raw).ok_or_else(|| {
                ScannerError::Config(format!("{}: unknown condition {:?}", env::MIN_CONDITION, raw))
            })?,
            _ => defaults.min_condition,
        };

        let config = Self {
            deal_threshold: read_var(&lookup, env::DEAL_THRESHOLD, defaults.deal_threshold)?,
            min_seller_rating: read_var(
                &lookup,
                env::MIN_SELLER_RATING,
                defaults.min_seller_rating,
            )?,
            min_condition,
            max_offers: read_var(&lookup, env::MAX_OFFERS_PER_SCAN, defaults.max_offers)?,
            baseline_window: read_var(
                &lookup,
                env::BASELINE_WINDOW_SCANS,
                defaults.baseline_window,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.deal_threshold < Decimal::ZERO || self.deal_threshold >= Decimal::ONE {
            return Err(ScannerError::InvalidArgument(format!(
                "deal threshold {} outside [0, 1)",
                self.deal_threshold
            )));
        }
        if !self.min_seller_rating.is_finite() {
            return Err(ScannerError::InvalidArgument(
                "minimum seller rating must be finite".into(),
            ));
        }
        if self.max_offers == 0 {
            return Err(ScannerError::InvalidArgument(
                "max offers must be at least 1".into(),
            ));
        }
        if self.baseline_window == 0 {
            return Err(ScannerError::InvalidArgument(
                "baseline window must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FetchConfig
// ---------------------------------------------------------------------------

/// Settings for the FlareSolverr fetch client.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub url: String,
    pub session_id: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FLARESOLVERR_URL.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs = read_var(&lookup, env::REQUEST_TIMEOUT_SEC, defaults.timeout.as_secs())?;
        let max_retries = read_var(&lookup, env::MAX_RETRIES, defaults.max_retries)?;
        if max_retries == 0 {
            return Err(ScannerError::Config(format!(
                "{}: at least one attempt is required",
                env::MAX_RETRIES
            )));
        }

        Ok(Self {
            url: read_var(&lookup, env::FLARESOLVERR_URL, defaults.url)?,
            session_id: defaults.session_id,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            backoff_base: defaults.backoff_base,
        })
    }
}
