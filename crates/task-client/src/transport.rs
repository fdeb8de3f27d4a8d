//! Transport seam between the client and the RPC substrate.
//!
//! [`TaskTransport`] is the narrow interface the client consumes: readiness,
//! unary calls, and duplex streams, all keyed by [`TaskMethod`].
//! [`GrpcTransport`] implements it over a single tonic [`Channel`], which
//! multiplexes concurrent calls on one HTTP/2 connection and is cloned per
//! call rather than locked. Each duplex stream is driven by its own task so
//! the caller gets the stream before the server has sent response headers.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use prost::Message;
use task_protocol::TaskMethod;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::client::Grpc;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;
use tracing::{debug, info};

use crate::error::{TaskError, TaskResult};

/// Server frames buffered per duplex stream before the driver waits.
const INBOUND_BUFFER: usize = 16;

/// Frames flowing from the client to the server on a duplex stream.
pub type OutboundStream<T> = ReceiverStream<T>;

/// Frames flowing from the server to the client on a duplex stream.
pub type InboundStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// The RPC substrate a client runs on.
///
/// Implementations must be safe to call concurrently through a shared
/// reference; the client never serializes access.
#[async_trait]
pub trait TaskTransport: Send + Sync + 'static {
    /// Resolve once the connection can carry a call.
    async fn ready(&self) -> Result<(), Status>;

    /// Issue one request/response call.
    async fn unary<Req, Resp>(
        &self,
        method: TaskMethod,
        request: Request<Req>,
    ) -> Result<Response<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static;

    /// Open a bidirectional stream fed by `outbound`.
    ///
    /// Returns once the stream is dispatched, without waiting for the
    /// server's response headers. A failure that only shows up later is
    /// yielded as the first item of the inbound stream. Frames are sent in
    /// the order they are queued on `outbound`; dropping `outbound`'s
    /// receiver signals that the stream is gone.
    async fn open_duplex<Req, Resp>(
        &self,
        method: TaskMethod,
        outbound: OutboundStream<Req>,
    ) -> Result<InboundStream<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static;

    /// Release the connection and tear down open streams. Calls made
    /// afterwards are unspecified.
    async fn close(&self) {}
}

/// Where a client connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Plaintext HTTP/2 over TCP.
    Http(String),
    /// HTTP/2 over a Unix domain socket.
    Unix(PathBuf),
}

/// Normalize a user supplied address.
///
/// Accepts `host:port`, `http://host:port` and `unix:///abs/path`. TLS is not
/// offered; the daemon listens in plaintext.
pub(crate) fn parse_target(address: &str) -> TaskResult<Target> {
    let invalid = |message: &str| TaskError::InvalidAddress {
        address: address.to_string(),
        message: message.to_string(),
    };

    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(invalid("address is empty"));
    }

    if let Some(path) = trimmed.strip_prefix("unix://") {
        if !path.starts_with('/') {
            return Err(invalid("unix socket path must be absolute"));
        }
        return Ok(Target::Unix(PathBuf::from(path)));
    }

    match trimmed.split_once("://") {
        Some(("http", "")) => Err(invalid("missing host")),
        Some(("http", _)) => Ok(Target::Http(trimmed.to_string())),
        Some(("https", _)) => Err(invalid("TLS transport is not supported")),
        Some((scheme, _)) => Err(invalid(&format!("unsupported scheme {scheme:?}"))),
        None => Ok(Target::Http(format!("http://{trimmed}"))),
    }
}

/// [`TaskTransport`] over a tonic channel.
///
/// Clones share the connection and the shutdown signal.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    channel: Channel,
    shutdown: CancellationToken,
}

impl GrpcTransport {
    /// Connect eagerly; fails if the server cannot be reached within
    /// `connect_timeout`.
    pub async fn connect(address: &str, connect_timeout: Duration) -> TaskResult<Self> {
        let channel = match parse_target(address)? {
            Target::Http(uri) => connect_http(address, &uri, connect_timeout).await?,
            Target::Unix(path) => connect_unix(address, &path, connect_timeout).await?,
        };
        info!("Connected to task service at {address}");
        Ok(Self::from_channel(channel))
    }

    /// Wrap an existing channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            channel,
            shutdown: CancellationToken::new(),
        }
    }

    /// Fresh client handle sharing the underlying connection.
    ///
    /// The channel's buffer hands out capacity per handle, so the handle
    /// that was polled ready must be the one that issues the call.
    async fn ready_handle(&self) -> Result<Grpc<Channel>, Status> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;
        Ok(grpc)
    }
}

#[async_trait]
impl TaskTransport for GrpcTransport {
    async fn ready(&self) -> Result<(), Status> {
        self.ready_handle().await.map(|_| ())
    }

    async fn unary<Req, Resp>(
        &self,
        method: TaskMethod,
        request: Request<Req>,
    ) -> Result<Response<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.ready_handle().await?;
        let path = PathAndQuery::from_static(method.path());
        grpc.unary(request, path, ProstCodec::<Req, Resp>::default())
            .await
    }

    async fn open_duplex<Req, Resp>(
        &self,
        method: TaskMethod,
        outbound: OutboundStream<Req>,
    ) -> Result<InboundStream<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let grpc = self.ready_handle().await?;
        let (frames, inbound) = mpsc::channel(INBOUND_BUFFER);
        tokio::spawn(drive_duplex::<Req, Resp>(
            grpc,
            method,
            outbound,
            frames,
            self.shutdown.clone(),
        ));
        Ok(Box::pin(ReceiverStream::new(inbound)))
    }

    async fn close(&self) {
        // Stream drivers hold channel clones; the connection goes away with
        // the last one.
        self.shutdown.cancel();
        debug!("Releasing task service channel");
    }
}

/// Run one duplex stream to completion, forwarding server frames to `frames`.
///
/// Stops when the server ends the stream, the receiving side is dropped, or
/// the transport shuts down. Stopping drops the request body, which resets
/// the stream on the wire.
async fn drive_duplex<Req, Resp>(
    mut grpc: Grpc<Channel>,
    method: TaskMethod,
    outbound: OutboundStream<Req>,
    frames: mpsc::Sender<Result<Resp, Status>>,
    shutdown: CancellationToken,
) where
    Req: Message + Send + Sync + 'static,
    Resp: Message + Default + Send + Sync + 'static,
{
    let path = PathAndQuery::from_static(method.path());
    let opened = tokio::select! {
        _ = frames.closed() => return,
        _ = shutdown.cancelled() => {
            let _ = frames.try_send(Err(Status::cancelled("transport closed")));
            return;
        }
        opened = grpc.streaming(
            Request::new(outbound),
            path,
            ProstCodec::<Req, Resp>::default(),
        ) => opened,
    };

    let mut inbound = match opened {
        Ok(response) => response.into_inner(),
        Err(status) => {
            debug!(method = method.name(), %status, "stream refused");
            let _ = frames.send(Err(status)).await;
            return;
        }
    };

    loop {
        let next = tokio::select! {
            _ = frames.closed() => break,
            _ = shutdown.cancelled() => {
                let _ = frames.try_send(Err(Status::cancelled("transport closed")));
                break;
            }
            next = inbound.message() => next,
        };
        let frame = match next {
            Ok(Some(message)) => Ok(message),
            Ok(None) => break,
            Err(status) => Err(status),
        };
        let failed = frame.is_err();
        if frames.send(frame).await.is_err() || failed {
            break;
        }
    }
    debug!(method = method.name(), "stream driver finished");
}

async fn connect_http(address: &str, uri: &str, connect_timeout: Duration) -> TaskResult<Channel> {
    let endpoint = Endpoint::from_shared(uri.to_string()).map_err(|e| {
        TaskError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        }
    })?;

    endpoint
        .connect_timeout(connect_timeout)
        .connect()
        .await
        .map_err(|source| TaskError::Connect {
            address: address.to_string(),
            source,
        })
}

#[cfg(unix)]
async fn connect_unix(
    address: &str,
    socket_path: &Path,
    connect_timeout: Duration,
) -> TaskResult<Channel> {
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;

    let socket_path = socket_path.to_path_buf();

    // The authority is ignored; the connector always dials the socket.
    Endpoint::from_static("http://[::]:0")
        .connect_timeout(connect_timeout)
        .connect_with_connector(tower::service_fn(move |_: tonic::transport::Uri| {
            let path = socket_path.clone();
            async move {
                let stream = UnixStream::connect(path).await?;
                Ok::<_, std::io::Error>(TokioIo::new(stream))
            }
        }))
        .await
        .map_err(|source| TaskError::Connect {
            address: address.to_string(),
            source,
        })
}

#[cfg(not(unix))]
async fn connect_unix(
    address: &str,
    _socket_path: &Path,
    _connect_timeout: Duration,
) -> TaskResult<Channel> {
    Err(TaskError::InvalidAddress {
        address: address.to_string(),
        message: "unix sockets are not available on this platform".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_port_gets_http_scheme() {
        assert_eq!(
            parse_target("localhost:8080").unwrap(),
            Target::Http("http://localhost:8080".to_string())
        );
        assert_eq!(
            parse_target("  127.0.0.1:8080 ").unwrap(),
            Target::Http("http://127.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn test_http_passes_through() {
        assert_eq!(
            parse_target("http://daemon:8080").unwrap(),
            Target::Http("http://daemon:8080".to_string())
        );
    }

    #[test]
    fn test_unix_socket() {
        assert_eq!(
            parse_target("unix:///run/task/task.sock").unwrap(),
            Target::Unix(PathBuf::from("/run/task/task.sock"))
        );
        assert!(parse_target("unix://relative.sock").is_err());
    }

    #[test]
    fn test_rejected_addresses() {
        for address in ["", "   ", "http://", "https://daemon:443", "ftp://daemon"] {
            match parse_target(address) {
                Err(TaskError::InvalidAddress { .. }) => {}
                other => panic!("{address:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_fatal() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = GrpcTransport::connect(&addr.to_string(), Duration::from_secs(2)).await;
        assert!(matches!(result, Err(TaskError::Connect { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_missing_socket_is_fatal() {
        let result = GrpcTransport::connect(
            "unix:///nonexistent/task-client-test.sock",
            Duration::from_secs(2),
        )
        .await;
        assert!(matches!(result, Err(TaskError::Connect { .. })));
    }
}
