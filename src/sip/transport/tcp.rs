// ABOUTME: SIP over persistent TCP streams: accepting server and single-connection client
// ABOUTME: Read loops accumulate into BytesMut and hand complete frames to the framer

use crate::sip::error::SipError;
use crate::sip::framer::{self, DEFAULT_MAX_MESSAGE_SIZE};
use crate::sip::message::parse_sip_message;
use crate::sip::transport::{
    ClientTransport, Connection, ConnectionSlot, MessageCallback, MessageSink, Transport,
    TransportResult,
};
use async_trait::async_trait;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 4096;

struct TcpSink {
    writer: Mutex<Option<OwnedWriteHalf>>,
}

impl TcpSink {
    fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: Mutex::new(Some(writer)),
        }
    }
}

#[async_trait]
impl MessageSink for TcpSink {
    async fn send_bytes(&self, payload: &[u8]) -> TransportResult<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or(SipError::State("connection closed"))?;
        writer.write_all(payload).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
    }
}

/// Drains every complete message out of `buffer`, parsing and
/// delivering each; parse failures are logged and skipped.
async fn deliver_buffered(
    buffer: &mut BytesMut,
    connection: &Connection,
    callback: &MessageCallback,
) {
    while let Some(raw) = framer::next_message(buffer) {
        match parse_sip_message(&raw) {
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

/// TCP transport accepting multiple concurrent clients.
///
/// Defaults to `0.0.0.0:5060` with a 65535-byte message cap. A
/// connection whose buffer exceeds the cap is dropped after a warning.
pub struct TcpServerTransport {
    host: String,
    port: u16,
    max_message_size: usize,
    callback: Option<MessageCallback>,
    listener_task: Option<JoinHandle<()>>,
    client_tasks: Arc<Mutex<JoinSet<()>>>,
    local_addr: Option<SocketAddr>,
}

impl TcpServerTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            callback: None,
            listener_task: None,
            client_tasks: Arc::new(Mutex::new(JoinSet::new())),
            local_addr: None,
        }
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// The bound endpoint, available while running. Useful with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn endpoint(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

impl Default for TcpServerTransport {
    fn default() -> Self {
        Self::new("0.0.0.0", 5060)
    }
}

async fn serve_tcp_client(
    socket: TcpStream,
    peer: String,
    callback: MessageCallback,
    max_message_size: usize,
) {
    let (mut reader, writer) = socket.into_split();
    let sink = Arc::new(TcpSink::new(writer));
    let connection = Connection::new(peer, sink);
    let mut buffer = BytesMut::with_capacity(READ_CHUNK);
    loop {
        buffer.reserve(READ_CHUNK);
        match reader.read_buf(&mut buffer).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(
                    "read failed on connection {}: {err}",
                    connection.remote_address()
                );
                break;
            }
        }
        if buffer.len() > max_message_size {
            warn!(
                "closing connection {}: message exceeds max size",
                connection.remote_address()
            );
            break;
        }
        deliver_buffered(&mut buffer, &connection, &callback).await;
    }
    connection.close().await;
}

#[async_trait]
impl Transport for TcpServerTransport {
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
        info!("TCP server transport listening on {local_addr}");

        let tasks = self.client_tasks.clone();
        let max_message_size = self.max_message_size;
        self.listener_task = Some(tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, peer)) => {
                        let mut set = tasks.lock().await;
                        // Reap connections that have already finished.
                        while set.try_join_next().is_some() {}
                        set.spawn(serve_tcp_client(
                            socket,
                            peer.to_string(),
                            callback.clone(),
                            max_message_size,
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
            "TCP server transport on {}:{} stopped",
            self.host, self.port
        );
        Ok(())
    }
}

/// TCP transport connecting out to one remote SIP endpoint.
///
/// An oversize buffer is reset rather than disconnecting. The read
/// loop shuts the transport down itself on remote EOF; `stop` aborts
/// the loop first, so graceful shutdown and cancellation never race a
/// double close.
pub struct TcpClientTransport {
    host: String,
    port: u16,
    max_message_size: usize,
    callback: Option<MessageCallback>,
    slot: Arc<ConnectionSlot>,
    reader_task: Option<JoinHandle<()>>,
}

impl TcpClientTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            callback: None,
            slot: Arc::new(ConnectionSlot::default()),
            reader_task: None,
        }
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }
}

async fn tcp_client_read_loop(
    mut reader: OwnedReadHalf,
    connection: Connection,
    callback: MessageCallback,
    slot: Arc<ConnectionSlot>,
    max_message_size: usize,
) {
    let mut buffer = BytesMut::with_capacity(READ_CHUNK);
    loop {
        buffer.reserve(READ_CHUNK);
        match reader.read_buf(&mut buffer).await {
            Ok(0) => {
                debug!("remote {} closed connection", connection.remote_address());
                break;
            }
            Ok(_) => {}
            Err(err) => {
                debug!(
                    "read failed on connection {}: {err}",
                    connection.remote_address()
                );
                break;
            }
        }
        if buffer.len() > max_message_size {
            warn!(
                "dropping data from {}: message exceeds max size",
                connection.remote_address()
            );
            buffer.clear();
            continue;
        }
        deliver_buffered(&mut buffer, &connection, &callback).await;
    }
    // Remote-initiated teardown. A cancelled task never reaches this
    // point; stop() owns the close in that case.
    if slot.take().is_some() {
        connection.close().await;
        info!(
            "TCP client transport disconnected from {}",
            connection.remote_address()
        );
    }
}

#[async_trait]
impl Transport for TcpClientTransport {
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
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let remote_address = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| format!("{}:{}", self.host, self.port));
        let (reader, writer) = stream.into_split();
        let connection = Connection::new(remote_address.clone(), Arc::new(TcpSink::new(writer)));
        self.slot.set(connection.clone());
        self.reader_task = Some(tokio::spawn(tcp_client_read_loop(
            reader,
            connection,
            callback,
            self.slot.clone(),
            self.max_message_size,
        )));
        info!("TCP client transport connected to {remote_address}");
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
                "TCP client transport disconnected from {}",
                connection.remote_address()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ClientTransport for TcpClientTransport {
    fn is_connected(&self) -> bool {
        self.slot.get().is_some()
    }

    fn connection(&self) -> TransportResult<Connection> {
        self.slot
            .get()
            .ok_or(SipError::State("client transport not connected"))
    }
}
