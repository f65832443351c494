//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT block a thread to wait.
//! **Required**: Retry backoff uses `tokio::time::sleep(..).await`.

use architectural_enforcement::{report, scan};

#[test]
fn test_no_thread_sleep_in_production_code() {
    let violations = scan(|code| code.contains("thread::sleep"));

    report(
        "CRITICAL: thread sleep found in production code!",
        "Use tokio::time::sleep(..).await so paused-clock tests stay deterministic",
        &violations,
    );
}
