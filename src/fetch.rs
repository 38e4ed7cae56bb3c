//! Page fetching through a FlareSolverr proxy.
//!
//! The analysis pipeline never touches the network itself; it consumes
//! [`FetchedPage`]s from any [`Fetcher`]. [`FlareSolverrClient`] is the
//! production implementation, with retries and exponential backoff.

use rand::Rng;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Result, ScannerError};

/// Extra time the HTTP call may take beyond FlareSolverr's own timeout.
const HTTP_GRACE: Duration = Duration::from_secs(30);

const NOT_FOUND_MARKERS: [&str; 2] = ["Product not found", "Page not found"];

// ---------------------------------------------------------------------------
// FetchedPage / Fetcher
// ---------------------------------------------------------------------------

/// Raw HTML for one URL plus the upstream HTTP status, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: String,
    pub http_status: Option<u16>,
}

impl FetchedPage {
    pub fn new(html: impl Into<String>, http_status: Option<u16>) -> Self {
        Self {
            html: html.into(),
            http_status,
        }
    }

    /// HTTP 404, or a page telling the visitor the product does not exist.
    pub fn is_not_found(&self) -> bool {
        self.http_status == Some(404)
            || NOT_FOUND_MARKERS
                .iter()
                .any(|marker| self.html.contains(marker))
    }
}

/// Turns a URL into HTML. Implementations handle anti-bot bypass and
/// retries themselves.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        (**self).fetch(url)
    }
}

/// Run `op` up to `max_attempts` times, sleeping `base * 2^attempt` plus
/// random jitter (up to half of `base`) between failures. `op` receives the
/// 0-based attempt number. The last error is returned when every attempt
/// fails.
pub fn retry_with_backoff<T, F>(max_attempts: u32, base: Duration, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 >= attempts => return Err(e),
            Err(e) => {
                let delay = backoff_delay(base, attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after failure"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_cap = (base / 2).as_millis() as u64;
    if jitter_cap == 0 {
        return exponential;
    }
    let jitter = rand::thread_rng().gen_range(0..=jitter_cap);
    exponential.saturating_add(Duration::from_millis(jitter))
}

// ---------------------------------------------------------------------------
// FlareSolverr wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FlareResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
struct Solution {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}

/// Interpret a FlareSolverr `request.get` response body.
///
/// A missing solution status is taken as 200.
pub fn page_from_response(body: &str) -> Result<FetchedPage> {
    let response: FlareResponse = serde_json::from_str(body)?;
    match response {
        FlareResponse {
            status,
            solution: Some(solution),
            ..
        } if status == "ok" => Ok(FetchedPage::new(
            solution.response.unwrap_or_default(),
            Some(solution.status.unwrap_or(200)),
        )),
        FlareResponse { message, .. } => Err(ScannerError::Fetch(
            message.unwrap_or_else(|| "unknown FlareSolverr error".to_string()),
        )),
    }
}

// ---------------------------------------------------------------------------
// FlareSolverrClient
// ---------------------------------------------------------------------------

/// Fetches pages through a FlareSolverr instance using a named session.
pub struct FlareSolverrClient {
    config: FetchConfig,
    client: Client,
    session_active: AtomicBool,
}

impl FlareSolverrClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout.saturating_add(HTTP_GRACE))
            .build()?;
        Ok(Self {
            config,
            client,
            session_active: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn session_active(&self) -> bool {
        self.session_active.load(Ordering::Relaxed)
    }

    fn command(&self, body: serde_json::Value) -> Result<String> {
        let response = self.client.post(&self.config.url).json(&body).send()?;
        Ok(response.text()?)
    }

    /// Replace any existing session with a fresh one. Returns whether
    /// FlareSolverr accepted it.
    pub fn create_session(&self) -> Result<bool> {
        self.destroy_session();
        let body = self.command(serde_json::json!({
            "cmd": "sessions.create",
            "session": self.config.session_id,
        }))?;
        let response: FlareResponse = serde_json::from_str(&body)?;
        let active = response.status == "ok";
        self.session_active.store(active, Ordering::Relaxed);
        if !active {
            tracing::warn!(message = ?response.message, "session creation rejected");
        }
        Ok(active)
    }

    /// Destroy the session. Failures are logged and otherwise ignored.
    pub fn destroy_session(&self) {
        let result = self.command(serde_json::json!({
            "cmd": "sessions.destroy",
            "session": self.config.session_id,
        }));
        if let Err(e) = result {
            tracing::debug!(error = %e, "session destroy failed");
        }
        self.session_active.store(false, Ordering::Relaxed);
    }

    /// One fetch attempt, no retries.
    pub fn fetch_once(&self, url: &str) -> Result<FetchedPage> {
        let body = self.command(serde_json::json!({
            "cmd": "request.get",
            "url": url,
            "session": self.config.session_id,
            "maxTimeout": self.config.timeout.as_millis() as u64,
        }))?;
        page_from_response(&body)
    }
}

impl Fetcher for FlareSolverrClient {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let page = retry_with_backoff(self.config.max_retries, self.config.backoff_base, |_| {
            self.fetch_once(url)
        })?;
        tracing::debug!(url, status = ?page.http_status, bytes = page.html.len(), "fetched page");
        Ok(page)
    }
}
