pub mod sip;
pub mod sms;

#[cfg(test)]
mod tests;

// Re-export the SMS codec surface for direct access
pub use sms::{
    decode_sms, decode_sms_hex, encode_sms, encode_sms_hex, Address, Alphabet, CodecError,
    DataCodingScheme, Payload, SmsDeliver, SmsMessage, SmsStatusReport, SmsSubmit, Tpdu,
    UserData, ValidityPeriod,
};

// Re-export the SIP transport surface
pub use sip::{
    parse_sip_message, Connection, MessageHandler, SipClient, SipError, SipMessage,
    SipParseError, SipServer, StartLine, TcpClientTransport, TcpServerTransport, Transport,
};

/// Error returned by user-level handlers.
///
/// Handler failures can come from anywhere in user code, so a boxed
/// `std::error::Error` keeps the trait surface open; the library's own
/// fallible paths use the dedicated `CodecError`/`SipError` enums
/// instead.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for handler code.
///
/// This is defined as a convenience.
pub type Result<T> = std::result::Result<T, Error>;
