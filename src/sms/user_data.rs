// ABOUTME: TP-User-Data assembly: optional UDH framing plus gsm7/8bit/ucs2 payloads
// ABOUTME: Owns the UDL septet accounting and the UDH-aware byte slicing

use crate::sms::dcs::{Alphabet, DataCodingScheme};
use crate::sms::error::CodecError;
use crate::sms::gsm7::{
    bits_to_bytes, bits_to_septets, bytes_to_bits_lsb, decode_gsm7_text, encode_gsm7_text,
    septets_to_bits,
};

/// User-data payload: text for the gsm7/ucs2 alphabets, opaque bytes
/// for 8-bit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

/// TP-User-Data prior to wire assembly.
///
/// `encoding` is an encode-side override of the DCS-derived alphabet
/// and stays `None` on decode. `header` is the raw UDH payload without
/// its length byte; an empty header is treated as absent on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub payload: Payload,
    pub encoding: Option<Alphabet>,
    pub header: Option<Vec<u8>>,
}

impl UserData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(text.into()),
            encoding: None,
            header: None,
        }
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Payload::Bytes(data.into()),
            encoding: None,
            header: None,
        }
    }

    pub fn with_encoding(mut self, encoding: Alphabet) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_header(mut self, header: impl Into<Vec<u8>>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// The UDH payload that actually goes on the wire: `None` for both
    /// an absent and an empty header.
    pub fn effective_header(&self) -> Option<&[u8]> {
        self.header.as_deref().filter(|h| !h.is_empty())
    }
}

fn latin1_bytes(text: &str) -> Result<Vec<u8>, CodecError> {
    text.chars()
        .map(|ch| u8::try_from(ch as u32).map_err(|_| CodecError::InvalidLatin1))
        .collect()
}

fn utf16_be_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .flat_map(|unit| unit.to_be_bytes())
        .collect()
}

/// Assembles `(UDL, UD bytes)` for a user-data value under the given
/// DCS.
///
/// For gsm7 the UDL counts septets including the UDH's septet
/// equivalent; otherwise it counts octets. Fails on oversize headers
/// (>140), more than 160 septets, or more than 140 UD octets.
pub fn encode_user_data(
    user_data: &UserData,
    dcs: &DataCodingScheme,
) -> Result<(u8, Vec<u8>), CodecError> {
    let encoding = user_data.encoding.unwrap_or(dcs.alphabet());
    let header = match user_data.effective_header() {
        Some(h) => {
            if h.len() > 140 {
                return Err(CodecError::HeaderTooLarge);
            }
            let mut framed = Vec::with_capacity(1 + h.len());
            framed.push(h.len() as u8);
            framed.extend_from_slice(h);
            framed
        }
        None => Vec::new(),
    };

    match encoding {
        Alphabet::Gsm7 => {
            let Payload::Text(text) = &user_data.payload else {
                return Err(CodecError::ExpectedText);
            };
            let septets = encode_gsm7_text(text)?;
            let mut bits = bytes_to_bits_lsb(&header);
            bits.extend(septets_to_bits(&septets));
            let ud_bytes = bits_to_bytes(&bits);
            let header_septets = (header.len() * 8).div_ceil(7);
            let udl = septets.len() + header_septets;
            if udl > 160 {
                return Err(CodecError::TooManySeptets);
            }
            if ud_bytes.len() > 140 {
                return Err(CodecError::UserDataTooLarge);
            }
            Ok((udl as u8, ud_bytes))
        }
        Alphabet::EightBit => {
            let payload = match &user_data.payload {
                Payload::Bytes(bytes) => bytes.clone(),
                Payload::Text(text) => latin1_bytes(text)?,
            };
            let mut ud_bytes = header;
            ud_bytes.extend_from_slice(&payload);
            if ud_bytes.len() > 140 {
                return Err(CodecError::UserDataTooLarge);
            }
            Ok((ud_bytes.len() as u8, ud_bytes))
        }
        Alphabet::Ucs2 => {
            let payload = match &user_data.payload {
                Payload::Text(text) => utf16_be_bytes(text),
                Payload::Bytes(bytes) => bytes.clone(),
            };
            let mut ud_bytes = header;
            ud_bytes.extend_from_slice(&payload);
            if ud_bytes.len() > 140 {
                return Err(CodecError::UserDataTooLarge);
            }
            Ok((ud_bytes.len() as u8, ud_bytes))
        }
    }
}

/// Decodes UD bytes back into a [`UserData`], inverting
/// [`encode_user_data`].
///
/// A zero UDHL with UDHI set yields `header: None`, so the zero-length
/// header distinction is not preserved across a round trip.
pub fn decode_user_data(
    ud_bytes: &[u8],
    udl: u8,
    dcs: &DataCodingScheme,
    udhi: bool,
) -> Result<UserData, CodecError> {
    let mut header: Option<Vec<u8>> = None;
    let mut payload_bytes = ud_bytes;
    if udhi {
        if ud_bytes.is_empty() {
            return Err(CodecError::MissingHeader);
        }
        let udhl = ud_bytes[0] as usize;
        if ud_bytes.len() < 1 + udhl {
            return Err(CodecError::HeaderOverrun);
        }
        if udhl > 0 {
            header = Some(ud_bytes[1..1 + udhl].to_vec());
        }
        payload_bytes = &ud_bytes[1 + udhl..];
    }

    match dcs.alphabet() {
        Alphabet::Gsm7 => {
            let bits = bytes_to_bits_lsb(ud_bytes);
            let header_bits = if udhi {
                (header.as_ref().map_or(0, Vec::len) + 1) * 8
            } else {
                0
            };
            let header_septets = (header_bits + 6) / 7;
            let payload_septets = (udl as usize).saturating_sub(header_septets);
            let start = header_bits;
            let end = start + payload_septets * 7;
            if end > bits.len() {
                return Err(CodecError::InsufficientPayloadBits);
            }
            let septets = bits_to_septets(&bits[start..end]);
            Ok(UserData {
                payload: Payload::Text(decode_gsm7_text(&septets)),
                encoding: None,
                header,
            })
        }
        Alphabet::EightBit => Ok(UserData {
            payload: Payload::Bytes(payload_bytes.to_vec()),
            encoding: None,
            header,
        }),
        Alphabet::Ucs2 => {
            let mut chunks = payload_bytes.chunks_exact(2);
            let units: Vec<u16> = chunks
                .by_ref()
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            if !chunks.remainder().is_empty() {
                return Err(CodecError::InvalidUtf16);
            }
            let text = String::from_utf16(&units).map_err(|_| CodecError::InvalidUtf16)?;
            Ok(UserData {
                payload: Payload::Text(text),
                encoding: None,
                header,
            })
        }
    }
}

/// Computes how many UD octets follow `offset` and slices them out.
///
/// For gsm7 with a UDH the count is driven by the UDHL byte and the
/// septet-rounded header length; without a UDH it is `ceil(udl*7/8)`;
/// for the octet alphabets it is the UDL itself.
pub fn extract_user_data_bytes(
    data: &[u8],
    offset: usize,
    udl: u8,
    alphabet: Alphabet,
    udhi: bool,
) -> Result<(Vec<u8>, usize), CodecError> {
    let byte_len = match alphabet {
        Alphabet::Gsm7 => {
            if udhi {
                let udhl = *data
                    .get(offset)
                    .ok_or(CodecError::Truncated("UDHL"))? as usize;
                let header_bits = (udhl + 1) * 8;
                let header_septets = (header_bits + 6) / 7;
                let payload_septets = (udl as usize).saturating_sub(header_septets);
                (header_bits + payload_septets * 7).div_ceil(8)
            } else {
                (udl as usize * 7).div_ceil(8)
            }
        }
        Alphabet::EightBit | Alphabet::Ucs2 => udl as usize,
    };
    let chunk = data
        .get(offset..offset + byte_len)
        .ok_or(CodecError::Truncated("user data"))?;
    Ok((chunk.to_vec(), offset + byte_len))
}
