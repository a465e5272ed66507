//! HTTP transport abstractions.
//!
//! Everything that talks to the network goes through the [`Transport`] trait.
//! The production implementation is [`ReqwestTransport`], a thin wrapper over a
//! shared [`reqwest::Client`]; [`RetryTransport`] decorates any transport with
//! exponential backoff. Dependents receive an explicitly constructed transport
//! instead of reaching for a global client.
//!
//! # Module Structure
//!
//! - [`context`] - [`RequestContext`] and [`CancellationToken`]
//! - [`retry`] - [`RetryPolicy`] and the [`RetryTransport`] decorator

pub mod context;
pub mod retry;

pub use context::{CancelCause, CancellationToken, RequestContext};
pub use retry::{
    RetryCallback, RetryCondition, RetryPolicy, RetryTransport, default_retry_condition,
};

use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failure of a single transport round trip.
///
/// A response with an error status is not a `TransportError`; statuses are
/// interpreted by the caller.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The underlying HTTP client failed to complete the request.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Target URL of the request
        url: String,
        /// Error reported by the HTTP client
        #[source]
        source: reqwest::Error,
    },

    /// A connection-level failure reported by a custom transport.
    #[error("connection to {url} failed: {reason}")]
    Connection {
        /// Target URL of the request
        url: String,
        /// Description of the failure
        reason: String,
    },

    /// The request context finished before the round trip completed.
    #[error("{0}")]
    Cancelled(CancelCause),
}

impl TransportError {
    /// Check whether this error came from the request context rather than the network.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Something that can perform one HTTP round trip.
///
/// Implementations must be safe to share between tasks and must honour the
/// context: once `ctx` is done an in-flight `send` should resolve promptly with
/// [`TransportError::Cancelled`].
pub trait Transport: Send + Sync {
    /// Send `request` and return the response, whatever its status.
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: reqwest::Request,
    ) -> BoxFuture<'a, Result<reqwest::Response, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: reqwest::Request,
    ) -> BoxFuture<'a, Result<reqwest::Response, TransportError>> {
        (**self).send(ctx, request)
    }
}

/// Base transport backed by a pooled [`reqwest::Client`].
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with a fresh client identifying itself as envgen.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("envgen/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
        })
    }

    /// Wrap an existing client, sharing its pool.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    /// The client requests are executed on.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: reqwest::Request,
    ) -> BoxFuture<'a, Result<reqwest::Response, TransportError>> {
        Box::pin(async move {
            if let Some(cause) = ctx.err() {
                return Err(TransportError::Cancelled(cause));
            }

            let url = request.url().to_string();
            debug!("{} {}", request.method(), url);

            tokio::select! {
                biased;
                cause = ctx.done() => Err(TransportError::Cancelled(cause)),
                result = self.client.execute(request) => result.map_err(|source| {
                    TransportError::Request {
                        url,
                        source,
                    }
                }),
            }
        })
    }
}
