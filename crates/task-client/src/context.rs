//! Per-call cancellation scopes.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use task_protocol::TaskMethod;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tonic::Status;

use crate::error::{TaskError, TaskResult};

/// Options attached to every outgoing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Wait for the connection to become ready instead of failing while it
    /// is (re)connecting. The wait still counts against the call deadline.
    pub wait_for_ready: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            wait_for_ready: true,
        }
    }
}

/// Count of call scopes that are currently alive.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeCounter(Arc<AtomicUsize>);

impl ScopeCounter {
    pub(crate) fn live(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// Scope derived from the caller's token for a single call.
///
/// The child token is cancelled when the context is dropped, so every exit
/// path releases it.
#[derive(Debug)]
pub struct CallContext {
    method: TaskMethod,
    budget: Duration,
    deadline: Instant,
    token: CancellationToken,
    _guard: DropGuard,
    counter: ScopeCounter,
}

impl CallContext {
    pub(crate) fn derive(
        parent: &CancellationToken,
        method: TaskMethod,
        budget: Duration,
        counter: &ScopeCounter,
    ) -> Self {
        let token = parent.child_token();
        let guard = token.clone().drop_guard();
        counter.0.fetch_add(1, Ordering::AcqRel);
        Self {
            method,
            budget,
            deadline: Instant::now() + budget,
            token,
            _guard: guard,
            counter: counter.clone(),
        }
    }

    /// Absolute instant at which the call gives up.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drive `call` until it finishes, the deadline passes, or the scope is
    /// cancelled, whichever comes first.
    pub(crate) async fn run<T, F>(&self, call: F) -> TaskResult<T>
    where
        F: Future<Output = Result<T, Status>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Cancelled),
            outcome = tokio::time::timeout_at(self.deadline, call) => match outcome {
                Ok(result) => result.map_err(TaskError::from),
                Err(_) => Err(TaskError::DeadlineExceeded {
                    method: self.method,
                    deadline: self.budget,
                }),
            },
        }
    }
}

impl Drop for CallContext {
    fn drop(&mut self) {
        self.counter.0.fetch_sub(1, Ordering::AcqRel);
    }
}
