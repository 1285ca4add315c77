// ABOUTME: Single-connection SIP client wrapping one client transport
// ABOUTME: Shares the server's handler dispatch semantics for inbound messages

use crate::sip::handler::{HandlerRegistry, MessageHandler};
use crate::sip::transport::{ClientTransport, Connection, OutboundPayload, TransportResult};
use std::sync::Arc;

/// Coordinates a client transport and user-provided message handlers.
pub struct SipClient<T: ClientTransport> {
    transport: T,
    handlers: Arc<HandlerRegistry>,
}

impl<T: ClientTransport> SipClient<T> {
    pub fn new(mut transport: T) -> Self {
        let handlers = Arc::new(HandlerRegistry::new());
        transport.bind(handlers.callback());
        Self {
            transport,
            handlers,
        }
    }

    /// Attaches a handler invoked for every inbound SIP message.
    pub fn register_handler(&self, handler: Arc<dyn MessageHandler>) {
        self.handlers.register(handler);
    }

    /// Opens the transport and returns the live connection handle.
    pub async fn connect(&mut self) -> TransportResult<Connection> {
        self.transport.start().await?;
        self.transport.connection()
    }

    pub async fn disconnect(&mut self) -> TransportResult<()> {
        self.transport.stop().await
    }

    /// Sends a message, text or raw bytes over the live connection.
    pub async fn send(&self, payload: impl Into<OutboundPayload>) -> TransportResult<()> {
        self.transport.send(payload.into()).await
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn connection(&self) -> TransportResult<Connection> {
        self.transport.connection()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
