//! Test utilities for envgen
//!
//! This module provides helpers shared by unit tests and the integration
//! suite:
//! - Logging initialisation that cooperates with the test harness
//! - [`ScriptedTransport`], an offline [`Transport`](crate::http::Transport)
//!   with scripted outcomes and call recording
//! - Schema and template fixtures
//!
//! # Example
//!
//! ```rust,no_run
//! use envgen_cli::http::{RequestContext, RetryTransport, Transport};
//! use envgen_cli::test_utils::ScriptedTransport;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let scripted = Arc::new(ScriptedTransport::statuses([503, 200]));
//! let transport = RetryTransport::new(scripted.clone());
//! let request = reqwest::Client::new().get("http://scripted.test/").build().unwrap();
//!
//! transport.send(&RequestContext::background(), request).await.unwrap();
//! assert_eq!(scripted.calls(), 2);
//! # }
//! ```

pub mod fixtures;
pub mod scripted;

pub use fixtures::{LISTING_TEMPLATE, SchemaFixture, write_template};
pub use scripted::{ScriptedOutcome, ScriptedTransport};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `None` the `RUST_LOG` environment
/// variable decides; if it is unset, tests run without logging.
///
/// ```bash
/// RUST_LOG=envgen_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
