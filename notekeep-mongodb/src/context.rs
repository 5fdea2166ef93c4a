//! Per-operation deadlines and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{NoteError, NoteResult, Operation};

/// Deadline and cancellation signal for store operations.
///
/// Every store operation takes a context and races the round trip against
/// it, failing with [`NoteError::Timeout`] or [`NoteError::Cancelled`] as
/// soon as either fires. Contexts are cheap to clone; clones share the
/// cancellation token.
///
/// ```rust,ignore
/// let token = CancellationToken::new();
/// let ctx = OpContext::background()
///     .with_timeout(Duration::from_secs(5))
///     .with_cancellation(token.clone());
///
/// let note = store.find_by_id(&ctx, id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl OpContext {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now, or at the existing deadline if that is sooner.
    ///
    /// A timeout too large to represent as an instant sets no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Expire at `deadline`, or at the existing deadline if that is sooner.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Abort when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check whether the cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fill in `timeout` as the deadline when none is set.
    pub(crate) fn or_timeout(&self, timeout: Option<Duration>) -> Self {
        match (self.deadline, timeout) {
            (None, Some(timeout)) => self.clone().with_timeout(timeout),
            _ => self.clone(),
        }
    }

    /// Run `fut` for `operation`, aborting on deadline or cancellation.
    pub(crate) async fn run<T, F>(&self, operation: Operation, fut: F) -> NoteResult<T>
    where
        F: Future<Output = NoteResult<T>>,
    {
        if self.is_cancelled() {
            return Err(NoteError::cancelled(operation));
        }

        let started = Instant::now();

        let cancelled = async {
            match self.cancel {
                Some(ref token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(NoteError::cancelled(operation)),
            _ = expired => Err(NoteError::timeout(
                operation,
                format!("deadline exceeded after {}ms", started.elapsed().as_millis()),
            )),
            result = fut => result,
        }
    }
}
