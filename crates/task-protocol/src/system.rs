//! Daemon configuration and detailed health payloads.

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetConfigRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetConfigResponse {
    /// Daemon configuration, JSON encoded.
    #[prost(string, tag = "1")]
    pub json: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DetailedHealthCheckRequest {}

/// Status of one daemon subsystem (checkpoint engine, GPU plugin, ...).
#[derive(Clone, PartialEq, prost::Message)]
pub struct SubsystemHealth {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bool, tag = "2")]
    pub healthy: bool,
    #[prost(string, tag = "3")]
    pub version: String,
    #[prost(string, tag = "4")]
    pub detail: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DetailedHealthCheckResponse {
    #[prost(string, repeated, tag = "1")]
    pub unhealthy_reasons: Vec<String>,
    #[prost(message, repeated, tag = "2")]
    pub subsystems: Vec<SubsystemHealth>,
}

impl DetailedHealthCheckResponse {
    /// Whether the daemon reported no unhealthy reasons and no failing subsystem.
    pub fn is_healthy(&self) -> bool {
        self.unhealthy_reasons.is_empty() && self.subsystems.iter().all(|s| s.healthy)
    }
}
