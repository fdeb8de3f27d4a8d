//! Test utilities and common setup.
//!
//! [`FakeTransport`] stands in for the task service: each method can be
//! scripted to reply, fail, stall, or hang, and every call is recorded.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prost::Message;
use task_client::{
    Client, DeadlinePolicy, InboundStream, OutboundStream, TaskTransport,
};
use task_protocol::TaskMethod;
use tokio::sync::{mpsc, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

/// How a unary method answers.
#[derive(Debug, Clone)]
pub enum Unary {
    /// Encoded response, sent immediately.
    Reply(Vec<u8>),
    /// Encoded response, sent after a delay.
    Delayed(Duration, Vec<u8>),
    Fail(Status),
    /// Never answers.
    Hang,
}

/// How a streaming method behaves once opened.
#[derive(Debug, Clone)]
pub enum Duplex {
    /// Open, emit these encoded frames, then keep reading until the client
    /// half-closes.
    Accept(Vec<Vec<u8>>),
    /// Refuse to open.
    Reject(Status),
    /// Open, but tear down the outbound side straight away.
    BreakOutbound,
    /// Accept the dispatch, then refuse: the outbound side is dropped and
    /// the status is queued as the first inbound item.
    RefuseLater(Status),
    /// Open and read, never write.
    Silent,
}

/// One recorded unary call.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: TaskMethod,
    pub body: Vec<u8>,
    pub grpc_timeout: Option<String>,
}

#[derive(Default)]
struct Script {
    unary: HashMap<TaskMethod, Unary>,
    duplex: HashMap<TaskMethod, Duplex>,
}

struct FakeState {
    script: Mutex<Script>,
    calls: Mutex<Vec<Recorded>>,
    frames: Mutex<HashMap<TaskMethod, Arc<Mutex<Vec<Vec<u8>>>>>>,
    ready: watch::Sender<bool>,
    closed: AtomicBool,
}

/// Scripted in-memory [`TaskTransport`]. Clones share state.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<FakeState>,
}

impl FakeTransport {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(true);
        Self {
            state: Arc::new(FakeState {
                script: Mutex::new(Script::default()),
                calls: Mutex::new(Vec::new()),
                frames: Mutex::new(HashMap::new()),
                ready,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn script(&self, method: TaskMethod, behavior: Unary) -> &Self {
        self.state
            .script
            .lock()
            .unwrap()
            .unary
            .insert(method, behavior);
        self
    }

    pub fn reply<M: Message>(&self, method: TaskMethod, response: &M) -> &Self {
        self.script(method, Unary::Reply(response.encode_to_vec()))
    }

    pub fn script_duplex(&self, method: TaskMethod, behavior: Duplex) -> &Self {
        self.state
            .script
            .lock()
            .unwrap()
            .duplex
            .insert(method, behavior);
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.ready.send_replace(ready);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<TaskMethod> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    /// Frames the server has read so far on `method`'s most recent stream.
    pub fn frames(&self, method: TaskMethod) -> Vec<Vec<u8>> {
        self.state
            .frames
            .lock()
            .unwrap()
            .get(&method)
            .map(|frames| frames.lock().unwrap().clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    fn unary_behavior(&self, method: TaskMethod) -> Unary {
        self.state
            .script
            .lock()
            .unwrap()
            .unary
            .get(&method)
            .cloned()
            .unwrap_or(Unary::Reply(Vec::new()))
    }

    fn duplex_behavior(&self, method: TaskMethod) -> Duplex {
        self.state
            .script
            .lock()
            .unwrap()
            .duplex
            .get(&method)
            .cloned()
            .unwrap_or(Duplex::Accept(Vec::new()))
    }

    fn frame_log(&self, method: TaskMethod) -> Arc<Mutex<Vec<Vec<u8>>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        self.state
            .frames
            .lock()
            .unwrap()
            .insert(method, Arc::clone(&log));
        log
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M, Status> {
    M::decode(bytes).map_err(|e| Status::internal(format!("bad scripted frame: {e}")))
}

#[async_trait]
impl TaskTransport for FakeTransport {
    async fn ready(&self) -> Result<(), Status> {
        let mut ready = self.state.ready.subscribe();
        ready
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| Status::unavailable("transport dropped"))
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
        let grpc_timeout = request
            .metadata()
            .get("grpc-timeout")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.state.calls.lock().unwrap().push(Recorded {
            method,
            body: request.get_ref().encode_to_vec(),
            grpc_timeout,
        });

        match self.unary_behavior(method) {
            Unary::Reply(bytes) => Ok(Response::new(decode(&bytes)?)),
            Unary::Delayed(delay, bytes) => {
                tokio::time::sleep(delay).await;
                Ok(Response::new(decode(&bytes)?))
            }
            Unary::Fail(status) => Err(status),
            Unary::Hang => std::future::pending().await,
        }
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
        let (inbound_tx, inbound_rx) = mpsc::channel::<Result<Resp, Status>>(16);
        let inbound: InboundStream<Resp> = Box::pin(ReceiverStream::new(inbound_rx));

        match self.duplex_behavior(method) {
            Duplex::Reject(status) => Err(status),
            Duplex::BreakOutbound => {
                drop(outbound);
                tokio::spawn(async move {
                    // Keep the inbound side open like a stuck server would.
                    inbound_tx.closed().await;
                });
                Ok(inbound)
            }
            Duplex::RefuseLater(status) => {
                drop(outbound);
                let _ = inbound_tx.try_send(Err(status));
                Ok(inbound)
            }
            Duplex::Accept(replies) => {
                let log = self.frame_log(method);
                tokio::spawn(async move {
                    for bytes in replies {
                        let frame = decode::<Resp>(&bytes);
                        if inbound_tx.send(frame).await.is_err() {
                            return;
                        }
                    }
                    read_all(outbound, log).await;
                    // Dropping the sender ends the inbound stream.
                });
                Ok(inbound)
            }
            Duplex::Silent => {
                let log = self.frame_log(method);
                tokio::spawn(async move {
                    read_all(outbound, log).await;
                    inbound_tx.closed().await;
                });
                Ok(inbound)
            }
        }
    }

    async fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

async fn read_all<Req: Message>(mut outbound: OutboundStream<Req>, log: Arc<Mutex<Vec<Vec<u8>>>>) {
    while let Some(frame) = outbound.next().await {
        log.lock().unwrap().push(frame.encode_to_vec());
    }
}

/// Client over a fresh fake with the default deadline table.
pub fn fake_client() -> (Client<FakeTransport>, FakeTransport) {
    fake_client_with(DeadlinePolicy::default())
}

pub fn fake_client_with(policy: DeadlinePolicy) -> (Client<FakeTransport>, FakeTransport) {
    let fake = FakeTransport::new();
    let client = Client::with_transport(fake.clone(), policy).expect("valid policy");
    (client, fake)
}
