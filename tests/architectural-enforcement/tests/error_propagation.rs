//! Integration Test: Error Propagation
//!
//! **Policy**: Production code MUST NOT panic on recoverable errors.
//! **Required**: Return `Result` and propagate with `?`; failures reach the
//! session as data, never as a crash.

use std::fs;

use architectural_enforcement::{report, scan, workspace_root};

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let violations = scan(|code| code.contains(".unwrap()") || code.contains(".expect("));

    report(
        "CRITICAL: unwrap()/expect() found in production code!",
        "Propagate with ? or map the error into the outcome",
        &violations,
    );
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("askdesk/core/Cargo.toml"))
        .unwrap_or_default();

    let forbidden: Vec<&str> = ["ratatui", "crossterm", "clap", "tracing-subscriber"]
        .into_iter()
        .filter(|krate| {
            manifest
                .lines()
                .any(|line| line.trim_start().starts_with(&format!("{krate} ")))
        })
        .collect();

    assert!(
        forbidden.is_empty(),
        "askdesk-core must stay headless; found surface crates: {forbidden:?}"
    );
}
