//! Tests for the fetch layer that need no FlareSolverr instance: response
//! decoding, not-found detection and the retry loop.

use cardmarket_scanner::fetch::{page_from_response, retry_with_backoff};
use cardmarket_scanner::{FetchConfig, FetchedPage, FlareSolverrClient, ScannerError};
use std::cell::Cell;
use std::time::Duration;

// ---------------------------------------------------------------------------
// page_from_response
// ---------------------------------------------------------------------------

#[test]
fn test_ok_response_yields_page() {
    let body = r#"{
        "status": "ok",
        "message": "Challenge not detected!",
        "solution": {"url": "https://www.cardmarket.com/x", "status": 200, "response": "<html>hi</html>"}
    }"#;
    let page = page_from_response(body).unwrap();
    assert_eq!(page.html, "<html>hi</html>");
    assert_eq!(page.http_status, Some(200));
}

#[test]
fn test_missing_solution_status_defaults_to_200() {
    let body = r#"{"status": "ok", "solution": {"response": "<html></html>"}}"#;
    assert_eq!(page_from_response(body).unwrap().http_status, Some(200));
}

#[test]
fn test_error_response_carries_message() {
    let body = r#"{"status": "error", "message": "Error solving the challenge."}"#;
    match page_from_response(body) {
        Err(ScannerError::Fetch(message)) => assert_eq!(message, "Error solving the challenge."),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn test_error_response_without_message() {
    let body = r#"{"status": "error"}"#;
    match page_from_response(body) {
        Err(ScannerError::Fetch(message)) => assert_eq!(message, "unknown FlareSolverr error"),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn test_ok_without_solution_is_an_error() {
    assert!(matches!(
        page_from_response(r#"{"status": "ok"}"#),
        Err(ScannerError::Fetch(_))
    ));
}

#[test]
fn test_malformed_body_is_json_error() {
    assert!(matches!(
        page_from_response("<html>502 Bad Gateway</html>"),
        Err(ScannerError::Json(_))
    ));
}

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

#[test]
fn test_not_found_detection() {
    assert!(FetchedPage::new("", Some(404)).is_not_found());
    assert!(FetchedPage::new("<h1>Product not found</h1>", Some(200)).is_not_found());
    assert!(FetchedPage::new("<h1>Page not found</h1>", None).is_not_found());
    assert!(!FetchedPage::new("<h1>Sett, The Boss</h1>", Some(200)).is_not_found());
}

// ---------------------------------------------------------------------------
// retry_with_backoff
// ---------------------------------------------------------------------------

#[test]
fn test_retry_succeeds_after_failures() {
    let calls = Cell::new(0);
    let result = retry_with_backoff(3, Duration::ZERO, |attempt| {
        calls.set(calls.get() + 1);
        if attempt < 2 {
            Err(ScannerError::Fetch(format!("attempt {attempt}")))
        } else {
            Ok(attempt)
        }
    });
    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_retry_returns_last_error() {
    let calls = Cell::new(0);
    let result: Result<(), _> = retry_with_backoff(3, Duration::ZERO, |attempt| {
        calls.set(calls.get() + 1);
        Err(ScannerError::Fetch(format!("attempt {attempt}")))
    });
    match result {
        Err(ScannerError::Fetch(message)) => assert_eq!(message, "attempt 2"),
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_retry_runs_at_least_once() {
    let calls = Cell::new(0);
    let result = retry_with_backoff(0, Duration::ZERO, |_| {
        calls.set(calls.get() + 1);
        Ok("done")
    });
    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_retry_sleeps_between_attempts() {
    let start = std::time::Instant::now();
    let _ = retry_with_backoff(2, Duration::from_millis(20), |_| {
        Err::<(), _>(ScannerError::Fetch("down".into()))
    });
    assert!(start.elapsed() >= Duration::from_millis(20));
}

// ---------------------------------------------------------------------------
// FlareSolverrClient
// ---------------------------------------------------------------------------

#[test]
fn test_client_construction_does_not_connect() {
    let config = FetchConfig {
        url: "http://127.0.0.1:1/v1".into(),
        ..FetchConfig::default()
    };
    let client = FlareSolverrClient::new(config.clone()).unwrap();
    assert_eq!(client.config(), &config);
    assert!(!client.session_active());
}
