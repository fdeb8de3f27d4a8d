//! Health probes.

use task_protocol::{DetailedHealthCheckRequest, DetailedHealthCheckResponse, TaskMethod};
use tokio_util::sync::CancellationToken;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::{HealthCheckRequest, HealthCheckResponse};
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::error::TaskResult;
use crate::transport::TaskTransport;

/// Component name the simple probe asks about.
pub const HEALTH_COMPONENT: &str = "TaskService";

/// Point-in-time health probes; nothing is cached.
pub struct HealthMonitor<T> {
    dispatcher: Dispatcher<T>,
}

impl<T> Clone for HealthMonitor<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<T: TaskTransport> HealthMonitor<T> {
    pub(crate) fn new(dispatcher: Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// `true` only when the server reports `SERVING`.
    ///
    /// Any other status, including values this client does not know, is
    /// `false`. Transport failures are errors.
    pub async fn check(&self, parent: &CancellationToken) -> TaskResult<bool> {
        let request = HealthCheckRequest {
            service: HEALTH_COMPONENT.to_string(),
        };
        let response: HealthCheckResponse = self
            .dispatcher
            .call(parent, TaskMethod::HealthCheck, request)
            .await?;

        let serving = is_serving(response.status);
        debug!(status = response.status, serving, "health check");
        Ok(serving)
    }

    /// Per-subsystem status, returned as the server sent it.
    pub async fn detailed_check(
        &self,
        parent: &CancellationToken,
        request: DetailedHealthCheckRequest,
    ) -> TaskResult<DetailedHealthCheckResponse> {
        self.dispatcher
            .call(parent, TaskMethod::DetailedHealthCheck, request)
            .await
    }
}

fn is_serving(status: i32) -> bool {
    matches!(ServingStatus::try_from(status), Ok(ServingStatus::Serving))
}
