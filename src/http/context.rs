//! Request contexts carrying cancellation and deadlines.
//!
//! A [`RequestContext`] threads through every transport attempt, backoff wait
//! and repository call of one logical operation. It combines a shared
//! [`CancellationToken`] with an optional deadline; whichever fires first ends
//! the operation with the matching [`CancelCause`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a context finished before the work it guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// The context's token was cancelled explicitly.
    Cancelled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// A cloneable cancellation signal shared by every holder.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled yet.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
        }
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation scope for one logical operation.
///
/// # Examples
///
/// ```rust,no_run
/// use envgen_cli::http::RequestContext;
/// use std::time::Duration;
///
/// let ctx = RequestContext::background().with_timeout(Duration::from_secs(30));
/// let child = ctx.clone();
///
/// // Cancelling either clone cancels both.
/// child.cancel();
/// assert!(ctx.err().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never done unless cancelled explicitly.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Bound this context by `timeout` from now.
    ///
    /// An earlier existing deadline is kept. A timeout too large to represent
    /// leaves the context unchanged.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Bound this context by an absolute deadline.
    ///
    /// An earlier existing deadline is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        });
        self
    }

    /// The deadline bounding this context, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The token shared by this context and its clones.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Report why the context is done without waiting, or `None` if it is live.
    #[must_use]
    pub fn err(&self) -> Option<CancelCause> {
        if self.token.is_cancelled() {
            return Some(CancelCause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Wait until the context is cancelled or its deadline passes.
    ///
    /// Never completes for a background context that is never cancelled, so it
    /// is meant to be raced against real work with `tokio::select!`.
    pub async fn done(&self) -> CancelCause {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => CancelCause::Cancelled,
            () = deadline => CancelCause::DeadlineExceeded,
        }
    }
}
