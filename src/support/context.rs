//! Per-request cancellation and deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::errors::{DomainError, DomainResult};

/// Carried into every service and repository call.
///
/// Storage futures run through [`RequestContext::guard`], which drops the
/// in-flight query when the token is cancelled or the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub async fn guard<F, T>(&self, operation: &'static str, fut: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(cancelled(operation));
        }

        let raced = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(cancelled(operation)),
                out = fut => out,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, raced)
                .await
                .unwrap_or_else(|_| {
                    Err(DomainError::Cancelled {
                        operation,
                        reason: "deadline exceeded",
                    })
                }),
            None => raced.await,
        }
    }
}

fn cancelled(operation: &'static str) -> DomainError {
    DomainError::Cancelled {
        operation,
        reason: "request cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::errors::ErrorKind;

    #[tokio::test]
    async fn background_passes_result_through() {
        let ctx = RequestContext::background();
        let out = ctx.guard("noop", async { Ok(7) }).await.unwrap();
        assert_eq!(out, 7);
        assert!(!ctx.is_done());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::with_cancellation(token);

        let err = ctx
            .guard("users.get_by_id", async { Ok::<_, DomainError>(()) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(ctx.is_done());
    }

    #[tokio::test]
    async fn cancel_during_query_aborts_it() {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_cancellation(token.clone());

        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, DomainError>(())
        };
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        };

        let (res, _) = tokio::join!(ctx.guard("slow", slow), canceller);
        assert!(matches!(res, Err(DomainError::Cancelled { operation: "slow", .. })));
    }

    #[tokio::test]
    async fn deadline_exceeded_is_cancellation() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));

        let err = ctx
            .guard("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, DomainError>(())
            })
            .await
            .unwrap_err();

        match err {
            DomainError::Cancelled { reason, .. } => assert_eq!(reason, "deadline exceeded"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
