//! Wire types for the checkpoint/restore TaskService.
//!
//! The TaskService exposes one gRPC service that fronts several execution
//! backends. This crate holds the typed payloads for each of them and the
//! fixed table mapping every operation to its method path.
//!
//! ## Layout
//!
//! - **process**: generic OS processes, including the attach streams and
//!   CRI-O image distribution calls
//! - **containerd**: containerd-managed containers
//! - **runc**: containers driven directly through runc
//! - **system**: daemon configuration and detailed health
//! - **method**: the method table
//!
//! Kata VM operations reuse the process payloads.

pub mod containerd;
pub mod method;
pub mod process;
pub mod runc;
pub mod system;

pub use containerd::*;
pub use method::{HEALTH_SERVICE, TASK_SERVICE, TaskMethod};
pub use process::*;
pub use runc::*;
pub use system::*;
