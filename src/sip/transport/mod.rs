// ABOUTME: Transport contract shared by TCP and WebSocket: bind/start/stop plus Connection
// ABOUTME: Connections are cheap clones around a remote address and a send sink

pub mod tcp;
#[cfg(feature = "websocket")]
pub mod websocket;

use crate::sip::error::SipError;
use crate::sip::message::SipMessage;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub use tcp::{TcpClientTransport, TcpServerTransport};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketClientTransport, WebSocketServerTransport};

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, SipError>;

/// Callback a transport invokes for every parsed inbound message.
pub type MessageCallback =
    Arc<dyn Fn(Connection, SipMessage) -> BoxFuture<'static, ()> + Send + Sync>;

/// Bytes ready to go on the wire, converted from a message, text or
/// raw bytes.
pub struct OutboundPayload(Vec<u8>);

impl OutboundPayload {
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<SipMessage> for OutboundPayload {
    fn from(message: SipMessage) -> Self {
        Self(message.to_bytes())
    }
}

impl From<&SipMessage> for OutboundPayload {
    fn from(message: &SipMessage) -> Self {
        Self(message.to_bytes())
    }
}

impl From<String> for OutboundPayload {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<&str> for OutboundPayload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for OutboundPayload {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for OutboundPayload {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

/// Transport-specific write half behind the [`Connection`] handle.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_bytes(&self, payload: &[u8]) -> TransportResult<()>;

    /// Shuts the write side down; idempotent.
    async fn close(&self);
}

/// A handle bound to one live peer.
///
/// Owned by its transport; handlers receive clones and may keep them,
/// but sends fail once the peer is gone.
#[derive(Clone)]
pub struct Connection {
    remote_address: String,
    sink: Arc<dyn MessageSink>,
}

impl Connection {
    pub fn new(remote_address: impl Into<String>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            remote_address: remote_address.into(),
            sink,
        }
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub async fn send(&self, payload: impl Into<OutboundPayload>) -> TransportResult<()> {
        self.sink.send_bytes(&payload.into().into_bytes()).await
    }

    pub(crate) async fn close(&self) {
        self.sink.close().await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("remote_address", &self.remote_address)
            .finish_non_exhaustive()
    }
}

/// Contract shared by all transports.
///
/// `start` fails with a state error if no callback has been bound.
/// `stop` cancels outstanding tasks, awaits them and treats
/// cancellation as normal termination; it is idempotent.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Registers the callback invoked when a message arrives.
    fn bind(&mut self, callback: MessageCallback);

    async fn start(&mut self) -> TransportResult<()>;

    async fn stop(&mut self) -> TransportResult<()>;
}

/// Client-side extension: one connection, gated by `is_connected`.
#[async_trait]
pub trait ClientTransport: Transport {
    fn is_connected(&self) -> bool;

    fn connection(&self) -> TransportResult<Connection>;

    async fn send(&self, payload: OutboundPayload) -> TransportResult<()> {
        self.connection()?.send(payload).await
    }
}

/// Connection slot shared between a client transport and its read
/// loop; whichever side tears down first takes the connection out.
#[derive(Default)]
pub(crate) struct ConnectionSlot {
    connection: Mutex<Option<Connection>>,
}

impl ConnectionSlot {
    pub(crate) fn set(&self, connection: Connection) {
        *self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(connection);
    }

    pub(crate) fn get(&self) -> Option<Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn take(&self) -> Option<Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
