//! A scripted [`Transport`] for exercising retry and client logic offline.

use crate::http::{RequestContext, Transport, TransportError};
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// What a [`ScriptedTransport`] answers for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// A response with this status and an empty body.
    Status(u16),
    /// A response with this status and body.
    Body(u16, String),
    /// A [`TransportError::Connection`] with this reason.
    Failure(String),
}

/// Answers calls from a queue of outcomes, repeating the last one forever.
///
/// Every call is counted and its URL recorded, whatever the outcome. The
/// context is checked before answering, like a real transport would.
///
/// # Example
///
/// ```rust,no_run
/// use envgen_cli::test_utils::ScriptedTransport;
///
/// let transport = ScriptedTransport::statuses([500, 500, 200]);
/// // Third call and every later one answers 200.
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    urls: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    /// Script arbitrary outcomes.
    pub fn new(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Script empty-bodied responses with the given statuses.
    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self::new(statuses.into_iter().map(ScriptedOutcome::Status))
    }

    /// Number of calls answered so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs of every call, in order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn next_outcome(&self) -> Option<ScriptedOutcome> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

fn response(status: u16, body: String) -> Result<reqwest::Response, TransportError> {
    let response = http::Response::builder().status(status).body(body).map_err(|err| {
        TransportError::Connection {
            url: String::new(),
            reason: err.to_string(),
        }
    })?;
    Ok(reqwest::Response::from(response))
}

impl Transport for ScriptedTransport {
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
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap_or_else(PoisonError::into_inner).push(url.clone());

            match self.next_outcome() {
                Some(ScriptedOutcome::Status(status)) => response(status, String::new()),
                Some(ScriptedOutcome::Body(status, body)) => response(status, body),
                Some(ScriptedOutcome::Failure(reason)) => Err(TransportError::Connection {
                    url,
                    reason,
                }),
                None => Err(TransportError::Connection {
                    url,
                    reason: "no scripted outcome".to_string(),
                }),
            }
        })
    }
}
