//! User-wide envgen settings.
//!
//! Settings live in a TOML file that is optional; every key has a default.
//!
//! # Location
//!
//! - `--settings <path>` or the `ENVGEN_CONFIG_PATH` environment variable
//! - otherwise **Unix/macOS**: `~/.envgen/config.toml`
//! - otherwise **Windows**: `%LOCALAPPDATA%\envgen\config.toml`
//!
//! # Format
//!
//! ```toml
//! [repository]
//! owner = "safeblock-dev"
//! name = "envgen"
//! api_base = "https://api.github.com"
//! raw_base = "https://raw.githubusercontent.com"
//! branch = "main"
//! timeout_secs = 10
//!
//! [retry]
//! max_retries = 3
//! initial_backoff_ms = 100
//! max_backoff_ms = 10000
//! backoff_multiplier = 2.0
//! jitter = true
//! ```

use crate::constants::{
    API_BASE_URL, API_TIMEOUT, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BRANCH, DEFAULT_INITIAL_BACKOFF,
    DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES, RAW_BASE_URL, STANDARD_REPO_NAME, STANDARD_REPO_OWNER,
};
use crate::http::RetryPolicy;
use crate::repository::{RepositoryClient, client_retry_policy};
use crate::template::Resolver;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Global configuration loaded from the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Where standard templates are published.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// How repository requests are retried.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// The `[repository]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    pub api_base: String,
    pub raw_base: String,
    /// Branch whose head commit pins downloads.
    pub branch: String,
    /// Bound on a whole request round trip, retries included.
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: STANDARD_REPO_OWNER.to_string(),
            name: STANDARD_REPO_NAME.to_string(),
            api_base: API_BASE_URL.to_string(),
            raw_base: RAW_BASE_URL.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            timeout_secs: API_TIMEOUT.as_secs(),
        }
    }
}

/// The `[retry]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF.as_millis() as u64,
            max_backoff_ms: DEFAULT_MAX_BACKOFF.as_millis() as u64,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Build the repository retry policy with these values, normalised.
    ///
    /// Keeps the repository predicate (which also retries `429`) and the
    /// warning logged before each retry.
    #[must_use]
    pub fn to_policy(&self) -> RetryPolicy {
        client_retry_policy()
            .with_max_retries(self.max_retries)
            .with_backoff(
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
                self.backoff_multiplier,
            )
            .with_jitter(self.jitter)
            .normalized()
    }
}

impl GlobalConfig {
    /// Load from `path` if given, else from the default location.
    ///
    /// A missing file yields defaults in both cases.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file, which must exist.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// Platform-specific default settings path.
    ///
    /// - **Windows**: `%LOCALAPPDATA%\envgen\config.toml`
    /// - **Unix/macOS**: `~/.envgen/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("envgen")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".envgen")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Build a repository client from the `[repository]` and `[retry]` tables.
    ///
    /// # Errors
    ///
    /// Fails if owner or name is empty, or the HTTP client cannot be built.
    pub fn repository_client(&self) -> Result<RepositoryClient> {
        let repository = &self.repository;
        let timeout = if repository.timeout_secs == 0 {
            API_TIMEOUT
        } else {
            Duration::from_secs(repository.timeout_secs)
        };

        let client = RepositoryClient::new(&repository.owner, &repository.name)
            .context("Failed to create repository client")?
            .with_api_base(&repository.api_base)
            .with_raw_base(&repository.raw_base)
            .with_branch(&repository.branch)
            .with_timeout(timeout)
            .with_retry_policy(self.retry.to_policy());

        Ok(client)
    }

    /// Build a template resolver backed by [`Self::repository_client`].
    pub fn resolver(&self) -> Result<Resolver> {
        Ok(Resolver::from_client(self.repository_client()?))
    }
}
