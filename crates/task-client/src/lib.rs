//! Client access layer for the checkpoint/restore task service.
//!
//! The task service checkpoints and restores workloads across several
//! backends (plain processes, containerd, runc, Kata VMs) and distributes
//! root filesystem images. This crate is the client side: one shared
//! connection, a per-class deadline on every request/response call, attach
//! sessions that open with a handshake frame, and health probes.
//!
//! ## Architecture
//!
//! ```text
//! Client ──┬── Dispatcher ──────── unary calls, class deadline, wait-for-ready
//!          ├── SessionInitiator ── attach streams, handshake first
//!          └── HealthMonitor ───── Check / DetailedHealthCheck
//!                    │
//!                    ▼
//!            TaskTransport (GrpcTransport: one tonic Channel)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use task_client::{Client, CancellationToken};
//! use task_protocol::DumpArgs;
//!
//! # async fn run() -> task_client::TaskResult<()> {
//! let client = Client::open("127.0.0.1:8080").await?;
//! let ctx = CancellationToken::new();
//!
//! if client.check(&ctx).await? {
//!     let resp = client
//!         .dump(&ctx, DumpArgs { pid: 4242, dir: "/tmp/ckpt".into(), ..Default::default() })
//!         .await?;
//!     println!("checkpoint {}", resp.checkpoint_id);
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod context;
mod deadline;
mod dispatch;
mod error;
mod health;
mod session;
mod transport;

pub use client::{Client, RestoreAttachSession, StartAttachSession};
pub use config::{ClientConfig, DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT_SECS};
pub use context::{CallContext, CallOptions};
pub use deadline::{
    DEFAULT_CONTAINERD_DEADLINE, DEFAULT_PROCESS_DEADLINE, DEFAULT_RUNC_DEADLINE, DeadlinePolicy,
    MAX_DEADLINE, OperationClass,
};
pub use dispatch::Dispatcher;
pub use error::{TaskError, TaskResult};
pub use health::{HEALTH_COMPONENT, HealthMonitor};
pub use session::{DuplexSession, SESSION_BUFFER, SessionInitiator};
pub use transport::{GrpcTransport, InboundStream, OutboundStream, TaskTransport};

pub use tokio_util::sync::CancellationToken;
