//! Per-request deadline and cancellation.
//!
//! A [`RequestContext`] is created by the transport for each inbound request
//! and passed by reference into every collaborator call. The auth core never
//! makes its own; it only races suspension points against the one it got.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a context stopped accepting work.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// The request deadline passed
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Deadline and cancellation signal for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every context derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the request.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl RequestContext {
    /// Context with no deadline that can never be cancelled.
    #[must_use]
    pub const fn background() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    /// Context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// Cancellable context plus the handle that cancels it.
    #[must_use]
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel: Some(rx),
        };
        (ctx, CancelHandle { tx })
    }

    /// Tighten the deadline to at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// unchanged.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.deadline_at(deadline),
            None => self,
        }
    }

    /// Tighten the deadline to at most `deadline`. An earlier deadline wins.
    #[must_use]
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        });
        self
    }

    /// Current deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Non-blocking check: `Err` if the context is already done.
    ///
    /// # Errors
    ///
    /// Returns the reason the context is done.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(ContextError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` until it completes or the context is done.
    ///
    /// `fut` is dropped as soon as the context is done, so whatever it was
    /// waiting on is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the context finishes first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ContextError> {
        self.check()?;

        tokio::select! {
            biased;
            () = self.cancelled() => Err(ContextError::Cancelled),
            () = self.expired() => Err(ContextError::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }

    /// Resolves once the context is cancelled. Pends forever otherwise.
    pub async fn cancelled(&self) {
        match &self.cancel {
            Some(rx) => {
                let mut rx = rx.clone();
                let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
                if handle_dropped {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = RequestContext::background();
        let out = ctx.run(async { 42 }).await;
        assert_eq!(out, Ok(42));
    }

    #[tokio::test]
    async fn test_deadline_interrupts_slow_future() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));
        let out = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(out, Err(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let (ctx, handle) = RequestContext::cancellable();
        let task = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.run(std::future::pending::<()>()).await }
        });

        handle.cancel();
        let out = task.await.unwrap();
        assert_eq!(out, Err(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_never_polls_future() {
        let (ctx, handle) = RequestContext::cancellable();
        handle.cancel();

        let mut polled = false;
        let out = ctx.run(async { polled = true }).await;

        assert_eq!(out, Err(ContextError::Cancelled));
        assert!(!polled);
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = RequestContext::cancellable();
        drop(handle);

        assert!(ctx.check().is_ok());
        assert_eq!(ctx.run(async { "done" }).await, Ok("done"));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::background()
            .deadline_at(now + Duration::from_secs(5))
            .deadline_at(now + Duration::from_secs(30));

        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let ctx = RequestContext::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(ctx.check().is_ok());

        let bounded = RequestContext::with_timeout(Duration::from_secs(1)).timeout(Duration::MAX);
        assert!(bounded.deadline().is_some());
    }

    #[tokio::test]
    async fn test_expired_deadline_fails_check() {
        let ctx = RequestContext::background().deadline_at(Instant::now());
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }
}
