// ABOUTME: Error types for the SIP core: datagram parse failures and transport faults
// ABOUTME: Parse errors are caught at the transport boundary; the rest bubble to callers

use thiserror::Error;

/// Raised when an inbound datagram cannot be parsed as SIP.
#[derive(Debug, Error)]
pub enum SipParseError {
    #[error("SIP message missing header terminator")]
    MissingTerminator,

    #[error("empty SIP message")]
    Empty,

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("invalid request line: {0}")]
    InvalidRequestLine(String),

    #[error("invalid status line: {0}")]
    InvalidStatusLine(String),

    #[error("invalid status code: {0}")]
    InvalidStatusCode(String),
}

/// Transport and dispatch errors.
#[derive(Debug, Error)]
pub enum SipError {
    #[error(transparent)]
    Parse(#[from] SipParseError),

    /// An operation was attempted in the wrong lifecycle state, e.g.
    /// sending before connect or rebinding a running server.
    #[error("transport state error: {0}")]
    State(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
