//! Attach sessions: duplex streams opened with a handshake frame.
//!
//! A session is handed out only after the stream is dispatched and the
//! handshake has been accepted as its first frame. Opening does not wait for
//! the server's response headers: a server may hold them until the process
//! produces output, so refusals that arrive later surface on the first
//! [`DuplexSession::message`]. There is no per-call deadline here; the stream
//! lives for as long as the attached process does, bounded only by the
//! caller's cancellation token.

use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use prost::Message;
use task_protocol::TaskMethod;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tonic::Status;
use tracing::{debug, warn};

use crate::context::CallOptions;
use crate::error::{TaskError, TaskResult};
use crate::transport::{InboundStream, TaskTransport};

/// Outbound frames buffered per session before `send` waits.
pub const SESSION_BUFFER: usize = 16;

/// Live duplex session bound to one attach operation.
///
/// Frames are delivered in order in each direction. Cancelling the parent
/// token ends both directions with [`TaskError::Cancelled`]; dropping the
/// session tears the stream down.
pub struct DuplexSession<Req, Resp> {
    method: TaskMethod,
    outbound: Option<mpsc::Sender<Req>>,
    inbound: InboundStream<Resp>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl<Req, Resp> std::fmt::Debug for DuplexSession<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexSession")
            .field("method", &self.method)
            .field("send_open", &self.outbound.is_some())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl<Req, Resp> DuplexSession<Req, Resp>
where
    Req: Send + 'static,
{
    pub fn method(&self) -> TaskMethod {
        self.method
    }

    /// Queue a frame for the server.
    pub async fn send(&self, message: Req) -> TaskResult<()> {
        let Some(outbound) = self.outbound.as_ref() else {
            return Err(TaskError::SessionClosed(self.method));
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Cancelled),
            sent = outbound.send(message) => {
                sent.map_err(|_| TaskError::SessionClosed(self.method))
            }
        }
    }

    /// Next frame from the server, or `None` once the server closed its side.
    pub async fn message(&mut self) -> TaskResult<Option<Resp>> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Cancelled),
            frame = self.inbound.next() => match frame {
                Some(Ok(message)) => Ok(Some(message)),
                Some(Err(status)) => Err(TaskError::Rpc(status)),
                None => Ok(None),
            },
        }
    }

    /// Half-close: no more frames will be sent, receiving continues.
    pub fn close_send(&mut self) {
        self.outbound = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Opens attach sessions over a shared transport.
pub struct SessionInitiator<T> {
    transport: Arc<T>,
    options: CallOptions,
}

impl<T> Clone for SessionInitiator<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            options: self.options,
        }
    }
}

impl<T: TaskTransport> SessionInitiator<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            options: CallOptions::default(),
        }
    }

    /// Open `method` and send `handshake` as its first frame.
    ///
    /// On any failure no session exists and the half-opened stream is
    /// dropped.
    pub async fn open<Req, Resp>(
        &self,
        parent: &CancellationToken,
        method: TaskMethod,
        handshake: Req,
    ) -> TaskResult<DuplexSession<Req, Resp>>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let token = parent.child_token();
        let guard = token.clone().drop_guard();

        let (outbound, receiver) = mpsc::channel(SESSION_BUFFER);

        let transport = &self.transport;
        let options = self.options;
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => Err(TaskError::Cancelled),
            opened = async move {
                if options.wait_for_ready {
                    transport.ready().await?;
                }
                transport
                    .open_duplex::<Req, Resp>(method, ReceiverStream::new(receiver))
                    .await
            } => opened.map_err(TaskError::from),
        };
        let mut inbound = opened?;

        // The transport drops the receiving end once the stream is gone.
        if outbound.send(handshake).await.is_err() {
            // Prefer the server's reason if it is already waiting.
            let status = match inbound.next().now_or_never() {
                Some(Some(Err(status))) => status,
                _ => Status::unavailable("stream closed before handshake was delivered"),
            };
            warn!(method = method.name(), %status, "attach handshake failed");
            return Err(TaskError::Handshake { method, status });
        }

        debug!(method = method.name(), "attach session established");

        Ok(DuplexSession {
            method,
            outbound: Some(outbound),
            inbound,
            token,
            _guard: guard,
        })
    }
}
