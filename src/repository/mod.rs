//! Typed client for the repository hosting the standard templates.
//!
//! [`RepositoryClient`] speaks a small subset of a GitHub-style REST API:
//!
//! - `GET {api_base}/repos/{owner}/{repo}/commits/{branch}` → `{"sha": ...}`
//! - `GET {api_base}/repos/{owner}/{repo}/contents/{path}` → directory listing
//! - `GET {raw_base}/{owner}/{repo}/{commit}/{path}` → raw file bytes
//!
//! Downloads by path are pinned to the branch's head commit at the time of the
//! call, so a template and its reported URL always name the same revision.
//!
//! # Request funnel
//!
//! Every call goes through one private funnel that sends the request over the
//! retrying transport and accepts exactly `200 OK`. Any other status becomes
//! [`EnvgenError::UnexpectedStatus`] and the response is dropped. The whole
//! round trip, including retries, backoff waits and the body read, is bounded
//! by the client-level timeout in addition to the caller's
//! [`RequestContext`].
//!
//! # Example
//!
//! ```rust,no_run
//! use envgen_cli::http::RequestContext;
//! use envgen_cli::repository::RepositoryClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RepositoryClient::new("safeblock-dev", "envgen")?;
//! let ctx = RequestContext::background();
//!
//! for entry in client.list_directory(&ctx, "templates").await? {
//!     println!("{} ({:?})", entry.name, entry.kind);
//! }
//! # Ok(())
//! # }
//! ```

use crate::constants::{API_BASE_URL, API_TIMEOUT, DEFAULT_BRANCH, RAW_BASE_URL, TEMPLATES_DIR};
use crate::core::EnvgenError;
use crate::http::{
    ReqwestTransport, RequestContext, RetryPolicy, RetryTransport, Transport, TransportError,
    default_retry_condition,
};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Kind of a directory-listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    #[serde(rename = "dir")]
    Directory,
    /// Symlinks, submodules and anything else.
    #[serde(other)]
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryContent {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Present for files only.
    #[serde(default)]
    pub download_url: Option<String>,
}

impl RepositoryContent {
    /// Whether the entry is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == ContentKind::File
    }
}

#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
}

/// The retry policy repository requests use unless told otherwise.
///
/// Retries transport errors, server errors and `429 Too Many Requests`, and
/// logs a warning before each retry.
#[must_use]
pub fn client_retry_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_retry_condition(|status, error| {
            default_retry_condition(status, error) || status == Some(StatusCode::TOO_MANY_REQUESTS)
        })
        .with_retry_callback(|attempt, status, error| match (status, error) {
            (_, Some(err)) => warn!("Repository request failed, retrying (attempt {attempt}): {err}"),
            (Some(status), None) => {
                warn!("Repository request returned {status}, retrying (attempt {attempt})");
            }
            (None, None) => warn!("Retrying repository request (attempt {attempt})"),
        })
}

/// Client for one repository.
///
/// Holds only immutable configuration and a shared transport, so it can be
/// used from several tasks at once.
#[derive(Clone)]
pub struct RepositoryClient {
    transport: Arc<dyn Transport>,
    http: ReqwestTransport,
    policy: RetryPolicy,
    owner: String,
    repo: String,
    api_base: String,
    raw_base: String,
    branch: String,
    timeout: Duration,
}

impl fmt::Debug for RepositoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("branch", &self.branch)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RepositoryClient {
    /// Create a client for `owner/repo` with the default transport.
    ///
    /// # Errors
    ///
    /// [`EnvgenError::EmptyOwner`] if `owner` is empty, otherwise
    /// [`EnvgenError::EmptyRepo`] if `repo` is empty.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, EnvgenError> {
        let owner = owner.into();
        let repo = repo.into();
        if owner.is_empty() {
            return Err(EnvgenError::EmptyOwner);
        }
        if repo.is_empty() {
            return Err(EnvgenError::EmptyRepo);
        }

        let http = ReqwestTransport::new().map_err(EnvgenError::HttpClient)?;
        let policy = client_retry_policy();

        Ok(Self {
            transport: Arc::new(RetryTransport::with_policy(http.clone(), policy.clone())),
            http,
            policy,
            owner,
            repo,
            api_base: API_BASE_URL.to_string(),
            raw_base: RAW_BASE_URL.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            timeout: API_TIMEOUT,
        })
    }

    /// Use a different API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different raw content base URL.
    #[must_use]
    pub fn with_raw_base(mut self, raw_base: impl Into<String>) -> Self {
        self.raw_base = raw_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Resolve the head commit of `branch` instead of `main`.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Bound each operation by `timeout` instead of the default ten seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send requests through `transport` as-is.
    ///
    /// The transport is not wrapped in a [`RetryTransport`]; wrap it first if
    /// retries are wanted.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Retry with `policy` over the client's HTTP transport.
    ///
    /// Replaces any transport set with [`Self::with_transport`]. The
    /// connection pool is kept.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self.rebuild_transport();
        self
    }

    /// Send requests over `http`, sharing its connection pool, with the
    /// current retry policy.
    ///
    /// Replaces any transport set with [`Self::with_transport`].
    #[must_use]
    pub fn with_http(mut self, http: ReqwestTransport) -> Self {
        self.http = http;
        self.rebuild_transport();
        self
    }

    fn rebuild_transport(&mut self) {
        self.transport = Arc::new(RetryTransport::with_policy(self.http.clone(), self.policy.clone()));
    }

    /// The HTTP transport retries are layered on.
    pub const fn http(&self) -> &ReqwestTransport {
        &self.http
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn raw_base(&self) -> &str {
        &self.raw_base
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// SHA of the head commit of the configured branch.
    pub async fn latest_commit(&self, ctx: &RequestContext) -> Result<String, EnvgenError> {
        let url =
            format!("{}/repos/{}/{}/commits/{}", self.api_base, self.owner, self.repo, self.branch);
        let commit: Commit = self.fetch_json(ctx, &url, "get latest commit").await?;
        debug!("Latest commit of {}/{}@{}: {}", self.owner, self.repo, self.branch, commit.sha);
        Ok(commit.sha)
    }

    /// Entries of the directory at `path`.
    pub async fn list_directory(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<Vec<RepositoryContent>, EnvgenError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        );
        self.fetch_json(ctx, &url, "get contents").await
    }

    /// Text of the file at `path`, as of the branch's head commit.
    pub async fn download_file(&self, ctx: &RequestContext, path: &str) -> Result<String, EnvgenError> {
        let commit = self.latest_commit(ctx).await?;
        let url = self.raw_url(&commit, path);
        self.download_from_url(ctx, &url).await
    }

    /// Text served at an arbitrary URL.
    pub async fn download_from_url(&self, ctx: &RequestContext, url: &str) -> Result<String, EnvgenError> {
        self.fetch_text(ctx, url, "get file").await
    }

    /// Commit-pinned raw URL of the standard template `name`. Does not fetch it.
    pub async fn standard_template_url(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<String, EnvgenError> {
        let commit = self.latest_commit(ctx).await?;
        Ok(self.raw_url(&commit, &format!("{TEMPLATES_DIR}/{name}")))
    }

    fn raw_url(&self, commit: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base,
            self.owner,
            self.repo,
            commit,
            path.trim_start_matches('/')
        )
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        url: &str,
        operation: &str,
    ) -> Result<T, EnvgenError> {
        self.bounded(url, async {
            let response = self.do_request(ctx, url, operation).await?;
            let body = read_body(ctx, response, url, operation).await?;
            serde_json::from_slice(&body).map_err(|source| EnvgenError::Decode {
                url: url.to_string(),
                source,
            })
        })
        .await
    }

    async fn fetch_text(
        &self,
        ctx: &RequestContext,
        url: &str,
        operation: &str,
    ) -> Result<String, EnvgenError> {
        self.bounded(url, async {
            let response = self.do_request(ctx, url, operation).await?;
            let body = read_body(ctx, response, url, operation).await?;
            Ok(String::from_utf8_lossy(&body).into_owned())
        })
        .await
    }

    /// Apply the client-level timeout to a whole round trip.
    async fn bounded<T>(
        &self,
        url: &str,
        operation: impl Future<Output = Result<T, EnvgenError>>,
    ) -> Result<T, EnvgenError> {
        tokio::time::timeout(self.timeout, operation).await.map_err(|_| EnvgenError::Timeout {
            url: url.to_string(),
            timeout: self.timeout,
        })?
    }

    /// Send a GET and accept only `200 OK`.
    async fn do_request(
        &self,
        ctx: &RequestContext,
        url: &str,
        operation: &str,
    ) -> Result<reqwest::Response, EnvgenError> {
        let parsed = Url::parse(url).map_err(|err| EnvgenError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        let response = match self.transport.send(ctx, reqwest::Request::new(Method::GET, parsed)).await
        {
            Ok(response) => response,
            Err(TransportError::Cancelled(cause)) => return Err(EnvgenError::Cancelled(cause)),
            Err(source) => {
                return Err(EnvgenError::Transport {
                    operation: operation.to_string(),
                    source,
                });
            }
        };

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            drop(response);
            return Err(EnvgenError::UnexpectedStatus {
                status,
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

async fn read_body(
    ctx: &RequestContext,
    response: reqwest::Response,
    url: &str,
    operation: &str,
) -> Result<Vec<u8>, EnvgenError> {
    tokio::select! {
        biased;
        cause = ctx.done() => Err(EnvgenError::Cancelled(cause)),
        body = response.bytes() => body.map(|bytes| bytes.to_vec()).map_err(|source| {
            EnvgenError::Transport {
                operation: operation.to_string(),
                source: TransportError::Request {
                    url: url.to_string(),
                    source,
                },
            }
        }),
    }
}
