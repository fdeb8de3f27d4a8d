//! Task client error types.

use std::time::Duration;

use task_protocol::TaskMethod;
use thiserror::Error;
use tonic::{Code, Status};

use crate::deadline::OperationClass;

/// Result type for task client operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors that can occur while talking to the task service.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The server address could not be parsed.
    #[error("invalid task service address {address:?}: {message}")]
    InvalidAddress { address: String, message: String },

    /// The connection to the server could not be established.
    #[error("failed to connect to task service at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// A deadline policy entry is zero or too long.
    #[error("invalid deadline for {class} operations: {deadline:?}")]
    InvalidDeadline {
        class: OperationClass,
        deadline: Duration,
    },

    /// The connect timeout is not a positive duration.
    #[error("invalid connect timeout: {timeout:?}")]
    InvalidConnectTimeout { timeout: Duration },

    /// The call did not complete within its class deadline.
    #[error("{method} exceeded its {deadline:?} deadline")]
    DeadlineExceeded {
        method: TaskMethod,
        deadline: Duration,
    },

    /// The caller's cancellation scope was cancelled.
    #[error("call cancelled by caller")]
    Cancelled,

    /// The remote call failed. The status is passed through untouched.
    #[error(transparent)]
    Rpc(#[from] Status),

    /// The stream opened but the handshake frame could not be delivered.
    #[error("{method} handshake failed: {status}")]
    Handshake { method: TaskMethod, status: Status },

    /// A send was attempted on a session whose outbound side is gone.
    #[error("{0} session is closed for sending")]
    SessionClosed(TaskMethod),
}

impl TaskError {
    /// Whether the failure is a deadline expiry, local or server-reported.
    pub fn is_deadline_exceeded(&self) -> bool {
        match self {
            TaskError::DeadlineExceeded { .. } => true,
            TaskError::Rpc(status) => status.code() == Code::DeadlineExceeded,
            _ => false,
        }
    }

    /// The underlying gRPC status, if the failure came from the remote side.
    pub fn status(&self) -> Option<&Status> {
        match self {
            TaskError::Rpc(status) | TaskError::Handshake { status, .. } => Some(status),
            _ => None,
        }
    }
}
