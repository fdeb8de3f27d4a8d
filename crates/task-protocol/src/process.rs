//! Generic process payloads.
//!
//! Also carries the CRI-O root filesystem dump and image push payloads,
//! which run under the process deadline.

use std::collections::HashMap;

// ============================================================================
// Shared enums
// ============================================================================

/// Where checkpoint images live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum CheckpointStorage {
    /// Checkpoint stays on the host that produced it.
    Local = 0,
    /// Checkpoint is uploaded to remote storage.
    Remote = 1,
}

/// Lifecycle state of a managed process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProcessState {
    Unknown = 0,
    Running = 1,
    Checkpointed = 2,
    Restored = 3,
    Exited = 4,
}

/// Options forwarded to the checkpoint engine.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CriuOpts {
    #[prost(bool, tag = "1")]
    pub leave_running: bool,
    #[prost(bool, tag = "2")]
    pub tcp_established: bool,
    #[prost(bool, tag = "3")]
    pub shell_job: bool,
    #[prost(bool, tag = "4")]
    pub file_locks: bool,
}

// ============================================================================
// Start
// ============================================================================

/// Start a new managed process.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StartArgs {
    /// Command line to execute.
    #[prost(string, tag = "1")]
    pub task: String,
    #[prost(string, tag = "2")]
    pub working_dir: String,
    #[prost(map = "string, string", tag = "3")]
    pub env: HashMap<String, String>,
    #[prost(uint32, tag = "4")]
    pub uid: u32,
    #[prost(uint32, tag = "5")]
    pub gid: u32,
    /// Job identifier; generated server-side when empty.
    #[prost(string, tag = "6")]
    pub jid: String,
    #[prost(string, tag = "7")]
    pub log_output_file: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StartResp {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(int32, tag = "2")]
    pub pid: i32,
    #[prost(string, tag = "3")]
    pub jid: String,
}

/// Handshake and follow-up frames of the start attach stream.
///
/// The first frame must carry `args`; later frames carry stdin only.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StartAttachArgs {
    #[prost(message, optional, tag = "1")]
    pub args: Option<StartArgs>,
    #[prost(string, tag = "2")]
    pub stdin: String,
}

/// Output frame of an attached process.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StartAttachResp {
    #[prost(string, tag = "1")]
    pub stdout: String,
    #[prost(string, tag = "2")]
    pub stderr: String,
    /// Set on the final frame once the process has exited.
    #[prost(int32, optional, tag = "3")]
    pub exit_code: Option<i32>,
}

// ============================================================================
// Dump / Restore
// ============================================================================

/// Checkpoint a running process. Also used for Kata VM dumps.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DumpArgs {
    #[prost(int32, tag = "1")]
    pub pid: i32,
    /// Directory the checkpoint is written to.
    #[prost(string, tag = "2")]
    pub dir: String,
    #[prost(enumeration = "CheckpointStorage", tag = "3")]
    pub storage: i32,
    #[prost(string, tag = "4")]
    pub jid: String,
    #[prost(message, optional, tag = "5")]
    pub criu_opts: Option<CriuOpts>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DumpResp {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(string, tag = "2")]
    pub checkpoint_id: String,
    #[prost(string, tag = "3")]
    pub upload_id: String,
}

/// Restore a process from a checkpoint. Also used for Kata VM restores.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RestoreArgs {
    #[prost(enumeration = "CheckpointStorage", tag = "1")]
    pub storage: i32,
    #[prost(string, tag = "2")]
    pub checkpoint_id: String,
    #[prost(string, tag = "3")]
    pub checkpoint_path: String,
    #[prost(string, tag = "4")]
    pub jid: String,
    #[prost(uint32, tag = "5")]
    pub uid: u32,
    #[prost(uint32, tag = "6")]
    pub gid: u32,
    #[prost(message, optional, tag = "7")]
    pub criu_opts: Option<CriuOpts>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RestoreResp {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(int32, tag = "2")]
    pub new_pid: i32,
}

/// Handshake and follow-up frames of the restore attach stream.
///
/// The first frame must carry `args`; later frames carry stdin only.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RestoreAttachArgs {
    #[prost(message, optional, tag = "1")]
    pub args: Option<RestoreArgs>,
    #[prost(string, tag = "2")]
    pub stdin: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RestoreAttachResp {
    #[prost(string, tag = "1")]
    pub stdout: String,
    #[prost(string, tag = "2")]
    pub stderr: String,
    #[prost(int32, optional, tag = "3")]
    pub exit_code: Option<i32>,
}

// ============================================================================
// Query
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryArgs {
    #[prost(int32, repeated, tag = "1")]
    pub pids: Vec<i32>,
    #[prost(string, repeated, tag = "2")]
    pub jids: Vec<String>,
}

/// A process known to the daemon.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProcessInfo {
    #[prost(int32, tag = "1")]
    pub pid: i32,
    #[prost(string, tag = "2")]
    pub jid: String,
    #[prost(enumeration = "ProcessState", tag = "3")]
    pub state: i32,
    #[prost(string, tag = "4")]
    pub checkpoint_path: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryResp {
    #[prost(message, repeated, tag = "1")]
    pub processes: Vec<ProcessInfo>,
}

// ============================================================================
// CRI-O image distribution
// ============================================================================

/// Dump the writable root filesystem layer of a CRI-O container.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CrioRootfsDumpArgs {
    #[prost(string, tag = "1")]
    pub container_id: String,
    #[prost(string, tag = "2")]
    pub container_storage: String,
    #[prost(string, tag = "3")]
    pub dest: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CrioRootfsDumpResp {
    /// Path of the produced rootfs diff archive.
    #[prost(string, tag = "1")]
    pub dest: String,
}

/// Push a committed image built from a rootfs diff.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CrioImagePushArgs {
    #[prost(string, tag = "1")]
    pub rootfs_diff_path: String,
    #[prost(string, tag = "2")]
    pub original_image_ref: String,
    #[prost(string, tag = "3")]
    pub new_image_ref: String,
    #[prost(string, tag = "4")]
    pub registry_auth_token: String,
    #[prost(string, tag = "5")]
    pub container_storage: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CrioImagePushResp {
    #[prost(string, tag = "1")]
    pub message: String,
}
