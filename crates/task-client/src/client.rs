//! Client facade for the task service.
//!
//! One [`Client`] owns one connection for its whole life. Every method is a
//! thin pass-through to the dispatcher, the session initiator or the health
//! monitor; the facade keeps no per-call state and is safe to share across
//! tasks behind an `Arc`.

use std::sync::Arc;

use task_protocol::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ClientConfig;
use crate::deadline::DeadlinePolicy;
use crate::dispatch::Dispatcher;
use crate::error::TaskResult;
use crate::health::HealthMonitor;
use crate::session::{DuplexSession, SessionInitiator};
use crate::transport::{GrpcTransport, TaskTransport};

/// Session returned by [`Client::attach_start`].
pub type StartAttachSession = DuplexSession<StartAttachArgs, StartAttachResp>;

/// Session returned by [`Client::attach_restore`].
pub type RestoreAttachSession = DuplexSession<RestoreAttachArgs, RestoreAttachResp>;

/// Client for the checkpoint/restore task service.
pub struct Client<T: TaskTransport = GrpcTransport> {
    transport: Arc<T>,
    dispatcher: Dispatcher<T>,
    sessions: SessionInitiator<T>,
    health: HealthMonitor<T>,
}

impl Client<GrpcTransport> {
    /// Connect to `address` with default settings.
    pub async fn open(address: &str) -> TaskResult<Self> {
        Self::open_with_config(&ClientConfig::new(address)).await
    }

    /// Connect using `config`. Fails without producing a client if the
    /// configuration is invalid or the server cannot be reached.
    pub async fn open_with_config(config: &ClientConfig) -> TaskResult<Self> {
        config.validate()?;
        let transport = GrpcTransport::connect(&config.address, config.connect_timeout()).await?;
        Self::with_transport(transport, config.deadlines)
    }
}

impl<T: TaskTransport> Client<T> {
    /// Build a client over an already established transport.
    pub fn with_transport(transport: T, policy: DeadlinePolicy) -> TaskResult<Self> {
        policy.validate()?;
        let transport = Arc::new(transport);
        let dispatcher = Dispatcher::new(Arc::clone(&transport), policy);
        Ok(Self {
            sessions: SessionInitiator::new(Arc::clone(&transport)),
            health: HealthMonitor::new(dispatcher.clone()),
            dispatcher,
            transport,
        })
    }

    pub fn policy(&self) -> &DeadlinePolicy {
        self.dispatcher.policy()
    }

    /// Number of request/response calls whose scope is still alive.
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Release the connection and end any attach sessions still open on it.
    /// Consumes the client, so no call can follow.
    pub async fn close(self) {
        self.transport.close().await;
        info!("Task service client closed");
    }

    // ========================================================================
    // Health
    // ========================================================================

    pub async fn check(&self, ctx: &CancellationToken) -> TaskResult<bool> {
        self.health.check(ctx).await
    }

    pub async fn detailed_check(
        &self,
        ctx: &CancellationToken,
        request: DetailedHealthCheckRequest,
    ) -> TaskResult<DetailedHealthCheckResponse> {
        self.health.detailed_check(ctx, request).await
    }

    // ========================================================================
    // Process
    // ========================================================================

    pub async fn start(&self, ctx: &CancellationToken, args: StartArgs) -> TaskResult<StartResp> {
        self.dispatcher.call(ctx, TaskMethod::Start, args).await
    }

    /// Start a process and stay attached to its stdio.
    ///
    /// `handshake` must describe the process to start.
    pub async fn attach_start(
        &self,
        ctx: &CancellationToken,
        handshake: StartAttachArgs,
    ) -> TaskResult<StartAttachSession> {
        self.sessions
            .open(ctx, TaskMethod::StartAttach, handshake)
            .await
    }

    pub async fn dump(&self, ctx: &CancellationToken, args: DumpArgs) -> TaskResult<DumpResp> {
        self.dispatcher.call(ctx, TaskMethod::Dump, args).await
    }

    pub async fn restore(
        &self,
        ctx: &CancellationToken,
        args: RestoreArgs,
    ) -> TaskResult<RestoreResp> {
        self.dispatcher.call(ctx, TaskMethod::Restore, args).await
    }

    /// Restore a process and stay attached to its stdio.
    pub async fn attach_restore(
        &self,
        ctx: &CancellationToken,
        handshake: RestoreAttachArgs,
    ) -> TaskResult<RestoreAttachSession> {
        self.sessions
            .open(ctx, TaskMethod::RestoreAttach, handshake)
            .await
    }

    pub async fn query(&self, ctx: &CancellationToken, args: QueryArgs) -> TaskResult<QueryResp> {
        self.dispatcher.call(ctx, TaskMethod::Query, args).await
    }

    // ========================================================================
    // CRI-O image distribution
    // ========================================================================

    pub async fn crio_rootfs_dump(
        &self,
        ctx: &CancellationToken,
        args: CrioRootfsDumpArgs,
    ) -> TaskResult<CrioRootfsDumpResp> {
        self.dispatcher
            .call(ctx, TaskMethod::CrioRootfsDump, args)
            .await
    }

    pub async fn crio_image_push(
        &self,
        ctx: &CancellationToken,
        args: CrioImagePushArgs,
    ) -> TaskResult<CrioImagePushResp> {
        self.dispatcher
            .call(ctx, TaskMethod::CrioImagePush, args)
            .await
    }

    // ========================================================================
    // Containerd
    // ========================================================================

    pub async fn containerd_dump(
        &self,
        ctx: &CancellationToken,
        args: ContainerdDumpArgs,
    ) -> TaskResult<ContainerdDumpResp> {
        self.dispatcher
            .call(ctx, TaskMethod::ContainerdDump, args)
            .await
    }

    pub async fn containerd_restore(
        &self,
        ctx: &CancellationToken,
        args: ContainerdRestoreArgs,
    ) -> TaskResult<ContainerdRestoreResp> {
        self.dispatcher
            .call(ctx, TaskMethod::ContainerdRestore, args)
            .await
    }

    pub async fn containerd_query(
        &self,
        ctx: &CancellationToken,
        args: ContainerdQueryArgs,
    ) -> TaskResult<ContainerdQueryResp> {
        self.dispatcher
            .call(ctx, TaskMethod::ContainerdQuery, args)
            .await
    }

    pub async fn containerd_rootfs_dump(
        &self,
        ctx: &CancellationToken,
        args: ContainerdRootfsDumpArgs,
    ) -> TaskResult<ContainerdRootfsDumpResp> {
        self.dispatcher
            .call(ctx, TaskMethod::ContainerdRootfsDump, args)
            .await
    }

    pub async fn containerd_rootfs_restore(
        &self,
        ctx: &CancellationToken,
        args: ContainerdRootfsRestoreArgs,
    ) -> TaskResult<ContainerdRootfsRestoreResp> {
        self.dispatcher
            .call(ctx, TaskMethod::ContainerdRootfsRestore, args)
            .await
    }

    // ========================================================================
    // Runc
    // ========================================================================

    pub async fn runc_get_pause_pid(
        &self,
        ctx: &CancellationToken,
        args: RuncGetPausePidArgs,
    ) -> TaskResult<RuncGetPausePidResp> {
        self.dispatcher
            .call(ctx, TaskMethod::RuncGetPausePid, args)
            .await
    }

    pub async fn runc_dump(
        &self,
        ctx: &CancellationToken,
        args: RuncDumpArgs,
    ) -> TaskResult<RuncDumpResp> {
        self.dispatcher.call(ctx, TaskMethod::RuncDump, args).await
    }

    pub async fn runc_restore(
        &self,
        ctx: &CancellationToken,
        args: RuncRestoreArgs,
    ) -> TaskResult<RuncRestoreResp> {
        self.dispatcher
            .call(ctx, TaskMethod::RuncRestore, args)
            .await
    }

    pub async fn runc_query(
        &self,
        ctx: &CancellationToken,
        args: RuncQueryArgs,
    ) -> TaskResult<RuncQueryResp> {
        self.dispatcher.call(ctx, TaskMethod::RuncQuery, args).await
    }

    // ========================================================================
    // Kata
    // ========================================================================

    pub async fn kata_dump(&self, ctx: &CancellationToken, args: DumpArgs) -> TaskResult<DumpResp> {
        self.dispatcher.call(ctx, TaskMethod::KataDump, args).await
    }

    pub async fn kata_restore(
        &self,
        ctx: &CancellationToken,
        args: RestoreArgs,
    ) -> TaskResult<RestoreResp> {
        self.dispatcher
            .call(ctx, TaskMethod::KataRestore, args)
            .await
    }

    // ========================================================================
    // Config
    // ========================================================================

    pub async fn get_config(
        &self,
        ctx: &CancellationToken,
        request: GetConfigRequest,
    ) -> TaskResult<GetConfigResponse> {
        self.dispatcher
            .call(ctx, TaskMethod::GetConfig, request)
            .await
    }
}
