//! Global constants used throughout the envgen codebase.
//!
//! This module contains timeout durations, retry parameters, and the
//! coordinates of the standard template repository. Defining them centrally
//! keeps magic numbers discoverable and gives the configuration layer a
//! single source for its defaults.

use std::time::Duration;

/// Default number of retries performed after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (100ms).
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Default upper bound for any single backoff delay (10 seconds).
///
/// Exponential growth of the backoff is capped at this value.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Default growth factor applied to the backoff after each retry.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Timeout for a whole repository API round trip (10 seconds).
///
/// The timeout covers every retry attempt and backoff wait of a single
/// logical request, not just one attempt.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL of the repository REST API.
pub const API_BASE_URL: &str = "https://api.github.com";

/// Base URL for raw repository content.
pub const RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Owner of the repository hosting the standard templates.
pub const STANDARD_REPO_OWNER: &str = "safeblock-dev";

/// Name of the repository hosting the standard templates.
pub const STANDARD_REPO_NAME: &str = "envgen";

/// Branch whose head commit pins standard template downloads.
pub const DEFAULT_BRANCH: &str = "main";

/// Directory of the repository that holds the standard templates.
pub const TEMPLATES_DIR: &str = "templates";

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "ENVGEN_CONFIG_PATH";
