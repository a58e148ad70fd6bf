//! Cancellation and deadline propagation for screening calls

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller context handed to every source call
///
/// Cancelling the token, or reaching the deadline, makes every
/// [`ScreeningContext::run`] wrapped future resolve promptly with
/// [`Error::Cancelled`] or [`Error::DeadlineExceeded`].
#[derive(Debug, Clone, Default)]
pub struct ScreeningContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ScreeningContext {
    /// Context without deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by an existing token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Tighten the deadline to at most `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Tighten the deadline; a later deadline than the current one is ignored
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Child context: cancelled with its parent, cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancellation token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancel this context and all its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Run `fut`, giving up on cancellation or deadline
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = sleep_until(self.deadline) => Err(Error::DeadlineExceeded),
            result = fut => result,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = ScreeningContext::new();
        let value = ctx.run(async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_deadline() {
        let ctx = ScreeningContext::new().with_timeout(Duration::from_millis(10));
        let started = std::time::Instant::now();
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, Error>(())
            })
            .await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(ctx.is_expired());
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_child() {
        let parent = ScreeningContext::new();
        let child = parent.child();

        let canceller = parent.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = child
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, Error>(())
            })
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_deadline_only_tightens() {
        let now = Instant::now();
        let ctx = ScreeningContext::new()
            .with_deadline(now + Duration::from_millis(50))
            .with_deadline(now + Duration::from_secs(50));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_millis(50)));
    }

    #[test]
    fn test_child_cancel_leaves_parent() {
        let parent = ScreeningContext::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_external_token_cancels() {
        let token = CancellationToken::new();
        let ctx = ScreeningContext::with_token(token.clone());
        assert!(!ctx.is_cancelled());

        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.token().is_cancelled());
        let result = ctx.run(async { Ok::<_, Error>(()) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_remaining() {
        assert_eq!(ScreeningContext::new().remaining(), None);

        let ctx = ScreeningContext::new().with_timeout(Duration::from_secs(60));
        let remaining = ctx.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(50));

        let expired = ScreeningContext::new().with_deadline(Instant::now());
        assert_eq!(expired.remaining(), Some(Duration::ZERO));
    }
}
