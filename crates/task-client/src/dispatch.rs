//! Request/response dispatch under a class deadline.

use std::sync::Arc;

use prost::Message;
use task_protocol::TaskMethod;
use tokio_util::sync::CancellationToken;
use tonic::Request;
use tracing::{debug, warn};

use crate::context::{CallContext, CallOptions, ScopeCounter};
use crate::deadline::{DeadlinePolicy, OperationClass};
use crate::error::{TaskError, TaskResult};
use crate::transport::TaskTransport;

/// Runs unary calls against a shared transport.
///
/// Holds no mutable state besides the live scope counter, so any number of
/// calls may run through it at once.
pub struct Dispatcher<T> {
    transport: Arc<T>,
    policy: DeadlinePolicy,
    options: CallOptions,
    scopes: ScopeCounter,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            options: self.options,
            scopes: self.scopes.clone(),
        }
    }
}

impl<T: TaskTransport> Dispatcher<T> {
    pub(crate) fn new(transport: Arc<T>, policy: DeadlinePolicy) -> Self {
        Self {
            transport,
            policy,
            options: CallOptions::default(),
            scopes: ScopeCounter::default(),
        }
    }

    pub fn policy(&self) -> &DeadlinePolicy {
        &self.policy
    }

    pub fn options(&self) -> CallOptions {
        self.options
    }

    /// Number of call scopes currently alive.
    pub fn in_flight(&self) -> usize {
        self.scopes.live()
    }

    /// Invoke `method` once, bounded by its class deadline and by `parent`.
    ///
    /// Remote failures come back as [`TaskError::Rpc`] with the status
    /// untouched; no retry is attempted.
    pub async fn call<Req, Resp>(
        &self,
        parent: &CancellationToken,
        method: TaskMethod,
        request: Req,
    ) -> TaskResult<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let class = OperationClass::of(method);
        let budget = self.policy.deadline_for(class);
        let ctx = CallContext::derive(parent, method, budget, &self.scopes);

        debug!(method = method.name(), class = class.as_str(), ?budget, "dispatching call");

        let mut request = Request::new(request);
        request.set_timeout(budget);

        let transport = &self.transport;
        let options = self.options;
        let outcome = ctx
            .run(async move {
                if options.wait_for_ready {
                    transport.ready().await?;
                }
                transport.unary(method, request).await
            })
            .await;

        match outcome {
            Ok(response) => Ok(response.into_inner()),
            Err(err) => {
                if let TaskError::DeadlineExceeded { .. } = err {
                    warn!(method = method.name(), ?budget, "call deadline exceeded");
                } else {
                    debug!(method = method.name(), error = %err, "call failed");
                }
                Err(err)
            }
        }
    }
}
