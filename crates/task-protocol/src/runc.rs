//! Runc payloads.

use crate::process::CriuOpts;

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncGetPausePidArgs {
    /// Path of the OCI bundle whose pause container is queried.
    #[prost(string, tag = "1")]
    pub bundle_path: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncGetPausePidResp {
    #[prost(int64, tag = "1")]
    pub pause_pid: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncDumpArgs {
    /// Runc state root, e.g. `/run/runc`.
    #[prost(string, tag = "1")]
    pub root: String,
    #[prost(string, tag = "2")]
    pub checkpoint_path: String,
    #[prost(string, tag = "3")]
    pub container_id: String,
    #[prost(message, optional, tag = "4")]
    pub criu_opts: Option<CriuOpts>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncDumpResp {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(string, tag = "2")]
    pub checkpoint_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncRestoreArgs {
    #[prost(string, tag = "1")]
    pub container_id: String,
    #[prost(string, tag = "2")]
    pub image_path: String,
    #[prost(string, tag = "3")]
    pub bundle: String,
    #[prost(bool, tag = "4")]
    pub detach: bool,
    #[prost(bool, tag = "5")]
    pub is_k3s: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncRestoreResp {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(int32, tag = "2")]
    pub pid: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncQueryArgs {
    #[prost(string, tag = "1")]
    pub root: String,
    #[prost(string, tag = "2")]
    pub namespace: String,
    #[prost(string, repeated, tag = "3")]
    pub container_names: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncContainer {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub bundle: String,
    #[prost(string, tag = "3")]
    pub container_name: String,
    #[prost(int64, tag = "4")]
    pub pid: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RuncQueryResp {
    #[prost(message, repeated, tag = "1")]
    pub containers: Vec<RuncContainer>,
}
