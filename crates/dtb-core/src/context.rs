//! Cancellation + time budget for outbound calls.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    errors::{CancelReason, Error},
    Result,
};

/// Reference budget for one logical step (login, usage query, one bandwidth fetch).
pub const DEFAULT_STEP_BUDGET: Duration = Duration::from_secs(5);

/// Bounds a single outbound call.
///
/// When the budget elapses or the token is cancelled, the wrapped future is dropped,
/// which aborts any in-flight HTTP request.
#[derive(Clone, Debug)]
pub struct CallContext {
    token: CancellationToken,
    budget: Duration,
}

impl CallContext {
    pub fn new(budget: Duration) -> Self {
        Self::with_token(CancellationToken::new(), budget)
    }

    pub fn with_token(token: CancellationToken, budget: Duration) -> Self {
        Self { token, budget }
    }

    /// A fresh budget sharing this context's token.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            budget: self.budget,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled {
                op,
                reason: CancelReason::Cancelled,
            }),
            res = tokio::time::timeout(self.budget, fut) => match res {
                Ok(out) => out,
                Err(_) => Err(Error::Cancelled {
                    op,
                    reason: CancelReason::TimedOut,
                }),
            },
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_BUDGET)
    }
}
