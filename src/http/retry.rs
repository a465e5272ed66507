//! Retrying transport decorator with exponential backoff.
//!
//! [`RetryTransport`] wraps any [`Transport`] and re-sends requests whose
//! outcome the [`RetryPolicy`] considers transient. Attempts are strictly
//! sequential; between attempts the transport waits for a backoff delay that
//! grows geometrically up to a ceiling, optionally spread by jitter drawn from
//! the operating system's random source.
//!
//! # Behaviour
//!
//! - The outcome of the final attempt is returned as-is. There is no synthetic
//!   "retries exhausted" error; a caller that keeps getting `500` sees the last
//!   `500` response.
//! - A request whose body is a one-shot stream cannot be replayed. When such a
//!   request fails, the failure is returned immediately.
//! - The backoff wait races the [`RequestContext`]. A context that finishes
//!   during the wait aborts the loop with [`TransportError::Cancelled`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use envgen_cli::http::{ReqwestTransport, RequestContext, RetryPolicy, RetryTransport, Transport};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let policy = RetryPolicy::default()
//!     .with_max_retries(5)
//!     .with_backoff(Duration::from_millis(50), Duration::from_secs(2), 2.0);
//! let base = ReqwestTransport::new()?;
//! let transport = RetryTransport::with_policy(base.clone(), policy);
//!
//! let ctx = RequestContext::background().with_timeout(Duration::from_secs(10));
//! let request = base.client().get("https://example.com").build()?;
//! let response = transport.send(&ctx, request).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use super::{RequestContext, Transport, TransportError};
use crate::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES,
};
use futures::future::BoxFuture;
use rand::RngCore;
use rand::rngs::OsRng;
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Decides whether an attempt's outcome should be retried.
///
/// Receives the response status for completed round trips, or the transport
/// error for failed ones. Exactly one of the two is `Some`.
pub type RetryCondition =
    Arc<dyn Fn(Option<StatusCode>, Option<&TransportError>) -> bool + Send + Sync>;

/// Observer invoked before each retry with the 1-based retry index.
pub type RetryCallback = Arc<dyn Fn(u32, Option<StatusCode>, Option<&TransportError>) + Send + Sync>;

/// Retry on any transport error or a server error status (>= 500).
#[must_use]
pub fn default_retry_condition(status: Option<StatusCode>, error: Option<&TransportError>) -> bool {
    error.is_some() || status.is_some_and(|status| status.as_u16() >= 500)
}

/// Configuration of a [`RetryTransport`].
///
/// Values are plain configuration; the transport never mutates them. Invalid
/// values are repaired by [`RetryPolicy::normalized`] rather than rejected.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Nominal delay before the first retry.
    pub initial_backoff: Duration,
    /// Ceiling for the nominal delay.
    pub max_backoff: Duration,
    /// Growth factor of the nominal delay, at least 1.0.
    pub backoff_multiplier: f64,
    /// Spread each delay uniformly over `[base - base/2, base + base/2]`.
    pub jitter: bool,
    retry_condition: RetryCondition,
    on_retry: Option<RetryCallback>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter: true,
            retry_condition: Arc::new(default_retry_condition),
            on_retry: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_backoff", &self.initial_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter", &self.jitter)
            .field("on_retry", &self.on_retry.is_some())
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Set the number of retries after the first attempt.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial delay, the delay ceiling and the growth factor.
    #[must_use]
    pub const fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the retry predicate.
    #[must_use]
    pub fn with_retry_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(Option<StatusCode>, Option<&TransportError>) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Arc::new(condition);
        self
    }

    /// Install an observer called before every retry.
    #[must_use]
    pub fn with_retry_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, Option<StatusCode>, Option<&TransportError>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Repair out-of-range values.
    ///
    /// Zero durations and multipliers below 1.0 (or NaN) fall back to the
    /// defaults, then `max_backoff` is raised to at least `initial_backoff`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.initial_backoff.is_zero() {
            self.initial_backoff = DEFAULT_INITIAL_BACKOFF;
        }
        if self.max_backoff.is_zero() {
            self.max_backoff = DEFAULT_MAX_BACKOFF;
        }
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0) {
            self.backoff_multiplier = DEFAULT_BACKOFF_MULTIPLIER;
        }
        self.max_backoff = self.max_backoff.max(self.initial_backoff);
        self
    }

    /// Ask the predicate whether an outcome is retryable.
    #[must_use]
    pub fn should_retry(&self, status: Option<StatusCode>, error: Option<&TransportError>) -> bool {
        (self.retry_condition)(status, error)
    }

    /// The delay actually waited for a nominal delay of `base`.
    ///
    /// Without jitter this is `base`. With jitter it is uniform in
    /// `[base - base/2, base + base/2]`; if the random source fails the
    /// nominal delay is used.
    #[must_use]
    pub fn backoff_delay(&self, base: Duration) -> Duration {
        if !self.jitter {
            return base;
        }

        let half = base / 2;
        let span = u64::try_from(half.as_nanos()).unwrap_or(u64::MAX).saturating_mul(2);
        if span == 0 {
            return base;
        }

        let mut bytes = [0u8; 8];
        if OsRng.try_fill_bytes(&mut bytes).is_err() {
            return base;
        }
        let offset = u64::from_le_bytes(bytes) % span;

        base - half + Duration::from_nanos(offset)
    }

    /// Nominal delay following `current`: `min(current * multiplier, max_backoff)`.
    #[must_use]
    pub fn next_backoff(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_multiplier)
            .map_or(self.max_backoff, |next| next.min(self.max_backoff))
    }

    fn notify_retry(&self, retry: u32, status: Option<StatusCode>, error: Option<&TransportError>) {
        if let Some(callback) = &self.on_retry {
            callback(retry, status, error);
        }
    }
}

/// A [`Transport`] that retries transient failures of an inner transport.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryTransport<T> {
    /// Wrap `inner` with the default policy.
    pub fn new(inner: T) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    /// Wrap `inner` with `policy`, normalising it first.
    pub fn with_policy(inner: T, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy: policy.normalized(),
        }
    }

    /// The effective (normalised) policy.
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The wrapped transport.
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, TransportError> {
        let mut current = request;
        let mut backoff = self.policy.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            // `None` means the body is a one-shot stream.
            let replay = current.try_clone();

            debug!("Sending {} {} (attempt {})", current.method(), current.url(), attempt + 1);
            let outcome = self.inner.send(ctx, current).await;

            let (status, error) = match &outcome {
                Ok(response) => (Some(response.status()), None),
                Err(err) => (None, Some(err)),
            };

            if attempt >= self.policy.max_retries
                || error.is_some_and(TransportError::is_cancelled)
                || !self.policy.should_retry(status, error)
            {
                return outcome;
            }

            let Some(next) = replay else {
                debug!("Request body cannot be replayed, not retrying");
                return outcome;
            };

            self.policy.notify_retry(attempt + 1, status, error);
            // Releases the connection held by a discarded response.
            drop(outcome);

            let delay = self.policy.backoff_delay(backoff);
            debug!("Retry {} of {} in {:?}", attempt + 1, self.policy.max_retries, delay);

            tokio::select! {
                biased;
                cause = ctx.done() => return Err(TransportError::Cancelled(cause)),
                () = tokio::time::sleep(delay) => {}
            }

            backoff = self.policy.next_backoff(backoff);
            current = next;
            attempt += 1;
        }
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: reqwest::Request,
    ) -> BoxFuture<'a, Result<reqwest::Response, TransportError>> {
        Box::pin(self.execute(ctx, request))
    }
}
