//! Async wrapper around [`Scanner`] for use in async runtimes (Tokio, etc.).
//!
//! Page analysis is CPU-bound, so it runs on Tokio's blocking thread pool
//! via [`tokio::task::spawn_blocking`], keeping the event loop free.
//!
//! # Example
//!
//! ```no_run
//! use cardmarket_scanner::AsyncScanner;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let scanner = AsyncScanner::builder().build().await.unwrap();
//!     let html = std::fs::read_to_string("page.html").unwrap();
//!     let report = scanner.analyze(html, None).await.unwrap();
//!     println!("{} offers", report.offers.len());
//! }
//! ```

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::config::ScanConfig;
use crate::error::{Result, ScannerError};
use crate::models::{Extraction, ScanReport};
use crate::Scanner;

fn join_error(e: tokio::task::JoinError) -> ScannerError {
    ScannerError::InvalidArgument(format!("Task join error: {e}"))
}

// ---------------------------------------------------------------------------
// AsyncScannerBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncScanner`].
#[derive(Debug, Clone, Default)]
pub struct AsyncScannerBuilder {
    config: ScanConfig,
}

impl AsyncScannerBuilder {
    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and build the async scanner.
    pub async fn build(self) -> Result<AsyncScanner> {
        let scanner = Scanner::builder().config(self.config).build()?;
        Ok(AsyncScanner {
            inner: Arc::new(scanner),
        })
    }
}

// ---------------------------------------------------------------------------
// AsyncScanner
// ---------------------------------------------------------------------------

/// Async wrapper around [`Scanner`].
///
/// The scanner holds no mutable state, so it is shared through an [`Arc`]
/// without locking.
#[derive(Debug, Clone)]
pub struct AsyncScanner {
    inner: Arc<Scanner>,
}

impl AsyncScanner {
    pub fn builder() -> AsyncScannerBuilder {
        AsyncScannerBuilder::default()
    }

    /// Wrap an existing scanner.
    pub fn from_scanner(scanner: Scanner) -> Self {
        Self {
            inner: Arc::new(scanner),
        }
    }

    pub fn scanner(&self) -> &Scanner {
        &self.inner
    }

    /// Run a sync scanner operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Scanner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let scanner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&scanner))
            .await
            .map_err(join_error)?
    }

    /// Extract offers from `html` on the blocking pool.
    pub async fn extract(&self, html: String) -> Result<Extraction> {
        self.run(move |s| Ok(s.extract(&html))).await
    }

    /// Analyze `html` against `baseline` on the blocking pool.
    pub async fn analyze(&self, html: String, baseline: Option<Decimal>) -> Result<ScanReport> {
        self.run(move |s| Ok(s.analyze(&html, baseline))).await
    }
}
