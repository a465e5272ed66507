//! Integration test suite for envgen
//!
//! These tests exercise the HTTP stack against local `httpmock` servers and
//! run the `envgen` binary end to end. No test reaches the public internet.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **retry_transport**: retry decorator over real HTTP
//! - **repository_client**: repository API client against a mock API
//! - **resolver**: template classification and loading
//! - **cli**: the `envgen` binary

mod cli;
mod repository_client;
mod resolver;
mod retry_transport;

use envgen_cli::http::RetryPolicy;
use std::time::Duration;

/// Retry policy with millisecond backoff so retry tests stay fast.
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_retries(max_retries)
        .with_backoff(Duration::from_millis(1), Duration::from_millis(5), 2.0)
        .with_jitter(false)
}
