//! RFC 3261 SIP message framing over persistent streams.
//!
//! The model/parser and framer are pure; the transports run on tokio
//! with one read task per connection. A transport instance is bound to
//! a single runtime for its lifetime, but any runtime will do.

pub mod client;
pub mod error;
pub mod framer;
pub mod handler;
pub mod message;
pub mod server;
pub mod transport;

pub use client::SipClient;
pub use error::{SipError, SipParseError};
pub use framer::DEFAULT_MAX_MESSAGE_SIZE;
pub use handler::MessageHandler;
pub use message::{parse_sip_message, HeaderMap, SipMessage, StartLine};
pub use server::SipServer;
pub use transport::{
    ClientTransport, Connection, MessageCallback, MessageSink, OutboundPayload,
    TcpClientTransport, TcpServerTransport, Transport, TransportResult,
};
#[cfg(feature = "websocket")]
pub use transport::{WebSocketClientTransport, WebSocketServerTransport};
