//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Requests to the answer endpoint MUST go through the async client.
//! **Required**: `reqwest::Client`, never `reqwest::blocking`.
//!
//! Reading the config file with `std::fs` happens once before any request
//! and is allowed.

use architectural_enforcement::{report, scan};

#[test]
fn test_no_blocking_http_client() {
    let violations = scan(|code| code.contains("reqwest::blocking"));

    report(
        "CRITICAL: blocking HTTP client found in production code!",
        "Use reqwest::Client with .send().await",
        &violations,
    );
}

#[test]
fn test_no_blocking_stdin_in_cli() {
    let violations = scan(|code| code.contains("std::io::stdin()"));

    report(
        "CRITICAL: blocking stdin read found in production code!",
        "Use tokio::io::stdin() with BufReader::lines()",
        &violations,
    );
}
