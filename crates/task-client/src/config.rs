//! Client configuration.
//!
//! The library does not read files or the environment. Applications embed
//! [`ClientConfig`] in their own settings and hand it to
//! [`Client::open_with_config`](crate::Client::open_with_config).

use std::time::Duration;

use serde::Deserialize;

use crate::deadline::DeadlinePolicy;
use crate::error::{TaskError, TaskResult};

/// Default task service address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// Default time allowed for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Settings for [`Client`](crate::Client).
///
/// ```toml
/// address = "unix:///run/task/task.sock"
/// connect_timeout_secs = 2
///
/// [deadlines]
/// process = 1200
/// containerd = 600
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port`, `http://host:port` or `unix:///path`.
    pub address: String,
    pub connect_timeout_secs: u64,
    pub deadlines: DeadlinePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            deadlines: DeadlinePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_deadlines(mut self, deadlines: DeadlinePolicy) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Reject a zero connect timeout or an invalid deadline table.
    pub fn validate(&self) -> TaskResult<()> {
        if self.connect_timeout_secs == 0 {
            return Err(TaskError::InvalidConnectTimeout {
                timeout: self.connect_timeout(),
            });
        }
        self.deadlines.validate()
    }
}
