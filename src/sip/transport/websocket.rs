// ABOUTME: SIP over WebSocket: each WS message carries exactly one SIP datagram
// ABOUTME: Server checks the upgrade path; client picks ws/wss from the TLS flag

use crate::sip::error::SipError;
use crate::sip::message::parse_sip_message;
use crate::sip::transport::{
    ClientTransport, Connection, ConnectionSlot, MessageCallback, MessageSink, Transport,
    TransportResult,
};
use async_trait::async_trait;
use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, connect_async, WebSocketStream};
use tracing::{debug, info, warn};

struct WsSink<S> {
    inner: Mutex<Option<S>>,
}

impl<S> WsSink<S> {
    fn new(sink: S) -> Self {
        Self {
            inner: Mutex::new(Some(sink)),
        }
    }
}

#[async_trait]
impl<S> MessageSink for WsSink<S>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin + Send + 'static,
{
    async fn send_bytes(&self, payload: &[u8]) -> TransportResult<()> {
        let mut guard = self.inner.lock().await;
        let sink = guard
            .as_mut()
            .ok_or(SipError::State("connection closed"))?;
        sink.send(Message::Binary(payload.to_vec())).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(mut sink) = self.inner.lock().await.take() {
            let _ = sink.close().await;
        }
    }
}

/// Consumes inbound WS messages until close or error, delivering each
/// payload as one SIP datagram.
async fn ws_read_loop<S>(
    mut stream: SplitStream<WebSocketStream<S>>,
    connection: Connection,
    callback: MessageCallback,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    while let Some(frame) = stream.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => text.into_bytes(),
            Ok(Message::Binary(data)) => data,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong handled by the protocol layer
            Err(err) => {
                debug!(
                    "WebSocket connection {} closed ({err})",
                    connection.remote_address()
                );
                break;
            }
        };
        match parse_sip_message(&payload) {
            Ok(message) => callback(connection.clone(), message).await,
            Err(err) => {
                warn!(
                    "failed to parse SIP message from {}: {err}",
                    connection.remote_address()
                );
            }
        }
    }
}

/// WebSocket transport upgrading HTTP connections for SIP over WS.
///
/// Defaults to `0.0.0.0:5080` with path `/sip`; upgrades on any other
/// path are rejected with 404.
pub struct WebSocketServerTransport {
    host: String,
    port: u16,
    path: String,
    callback: Option<MessageCallback>,
    listener_task: Option<JoinHandle<()>>,
    client_tasks: Arc<Mutex<JoinSet<()>>>,
    local_addr: Option<SocketAddr>,
}

impl WebSocketServerTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: "/sip".to_string(),
            callback: None,
            listener_task: None,
            client_tasks: Arc::new(Mutex::new(JoinSet::new())),
            local_addr: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// The bound endpoint, available while running. Useful with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Default for WebSocketServerTransport {
    fn default() -> Self {
        Self::new("0.0.0.0", 5080)
    }
}

async fn serve_ws_client(
    socket: TcpStream,
    peer: SocketAddr,
    path: String,
    callback: MessageCallback,
) {
    let expected = path.clone();
    let handshake = accept_hdr_async(socket, move |request: &Request, response: Response| {
        if request.uri().path() == expected {
            Ok(response)
        } else {
            let mut reject = ErrorResponse::new(None);
            *reject.status_mut() = StatusCode::NOT_FOUND;
            Err(reject)
        }
    })
    .await;
    let websocket = match handshake {
        Ok(websocket) => websocket,
        Err(err) => {
            debug!("WebSocket handshake with {peer} failed: {err}");
            return;
        }
    };
    let (sink_half, stream_half) = websocket.split();
    let connection = Connection::new(
        format!("ws://{peer}{path}"),
        Arc::new(WsSink::new(sink_half)),
    );
    ws_read_loop(stream_half, connection.clone(), callback).await;
    connection.close().await;
}

#[async_trait]
impl Transport for WebSocketServerTransport {
    fn bind(&mut self, callback: MessageCallback) {
        self.callback = Some(callback);
    }

    async fn start(&mut self) -> TransportResult<()> {
        if self.listener_task.is_some() {
            return Ok(());
        }
        let callback = self
            .callback
            .clone()
            .ok_or(SipError::State("transport callback has not been bound"))?;
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);
        info!(
            "WebSocket server transport listening on {local_addr}{}",
            self.path
        );

        let tasks = self.client_tasks.clone();
        let path = self.path.clone();
        self.listener_task = Some(tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, peer)) => {
                        let mut set = tasks.lock().await;
                        while set.try_join_next().is_some() {}
                        set.spawn(serve_ws_client(
                            socket,
                            peer,
                            path.clone(),
                            callback.clone(),
                        ));
                    }
                    Err(err) => {
                        warn!("accept failed on {local_addr}: {err}");
                    }
                }
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) -> TransportResult<()> {
        if let Some(task) = self.listener_task.take() {
            task.abort();
            let _ = task.await;
        }
        let mut set = self.client_tasks.lock().await;
        set.abort_all();
        while set.join_next().await.is_some() {}
        drop(set);
        self.local_addr = None;
        info!(
            "WebSocket server transport on {}:{}{} stopped",
            self.host, self.port, self.path
        );
        Ok(())
    }
}

/// WebSocket transport for SIP clients; `use_tls` selects `wss`.
pub struct WebSocketClientTransport {
    host: String,
    port: u16,
    path: String,
    use_tls: bool,
    callback: Option<MessageCallback>,
    slot: Arc<ConnectionSlot>,
    reader_task: Option<JoinHandle<()>>,
}

impl WebSocketClientTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: "/sip".to_string(),
            use_tls: false,
            callback: None,
            slot: Arc::new(ConnectionSlot::default()),
            reader_task: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }
}

#[async_trait]
impl Transport for WebSocketClientTransport {
    fn bind(&mut self, callback: MessageCallback) {
        self.callback = Some(callback);
    }

    async fn start(&mut self) -> TransportResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        let callback = self
            .callback
            .clone()
            .ok_or(SipError::State("transport callback has not been bound"))?;
        let scheme = if self.use_tls { "wss" } else { "ws" };
        let uri = format!("{scheme}://{}:{}{}", self.host, self.port, self.path);
        let (websocket, _response) = connect_async(uri.as_str()).await?;
        let (sink_half, stream_half) = websocket.split();
        let connection = Connection::new(uri.clone(), Arc::new(WsSink::new(sink_half)));
        self.slot.set(connection.clone());
        let slot = self.slot.clone();
        self.reader_task = Some(tokio::spawn(async move {
            ws_read_loop(stream_half, connection.clone(), callback).await;
            // Remote-initiated teardown; a cancelled task never gets here.
            if slot.take().is_some() {
                connection.close().await;
                info!(
                    "WebSocket client transport disconnected from {}",
                    connection.remote_address()
                );
            }
        }));
        info!("WebSocket client transport connected to {uri}");
        Ok(())
    }

    async fn stop(&mut self) -> TransportResult<()> {
        if let Some(task) = self.reader_task.take() {
            task.abort();
            let _ = task.await;
        }
        if let Some(connection) = self.slot.take() {
            connection.close().await;
            info!(
                "WebSocket client transport disconnected from {}",
                connection.remote_address()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ClientTransport for WebSocketClientTransport {
    fn is_connected(&self) -> bool {
        self.slot.get().is_some()
    }

    fn connection(&self) -> TransportResult<Connection> {
        self.slot
            .get()
            .ok_or(SipError::State("client transport not connected"))
    }
}
