// ABOUTME: Error type shared by every stage of the SMS TPDU codec
// ABOUTME: Covers byte-structure faults, alphabet violations and size limits

use thiserror::Error;

/// Codec errors with enough context to pinpoint the malformed field.
///
/// Decoding never panics: truncated input surfaces as [`CodecError::Truncated`]
/// and extra bytes after a complete TPDU as [`CodecError::TrailingBytes`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty payload is not a valid TPDU")]
    EmptyPayload,

    #[error("TPDU truncated while reading {0}")]
    Truncated(&'static str),

    #[error("extra trailing data detected in TPDU")]
    TrailingBytes,

    #[error("unsupported MTI {0}")]
    UnsupportedMti(u8),

    #[error("unsupported validity period format")]
    UnsupportedValidityFormat,

    #[error("unsupported BCD digit {0:?}")]
    InvalidBcdDigit(char),

    #[error("character {0:?} not supported in GSM 7-bit alphabet")]
    UnmappableCharacter(char),

    #[error("user data header too large")]
    HeaderTooLarge,

    #[error("UD header length exceeds available user data")]
    HeaderOverrun,

    #[error("UDHI set but user data absent")]
    MissingHeader,

    #[error("GSM 7-bit payload exceeds 160 septets")]
    TooManySeptets,

    #[error("user data exceeds 140 octets")]
    UserDataTooLarge,

    #[error("GSM 7-bit user data expects text input")]
    ExpectedText,

    #[error("8-bit user data expects raw bytes or Latin-1 text")]
    InvalidLatin1,

    #[error("invalid UTF-16 user data")]
    InvalidUtf16,

    #[error("insufficient GSM 7-bit payload bits")]
    InsufficientPayloadBits,

    #[error("timestamp component out of range")]
    TimestampOutOfRange,

    #[error("timestamp must be exactly 7 octets")]
    BadTimestampLength,

    #[error("status report user data requires a data coding scheme")]
    MissingDcs,

    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
