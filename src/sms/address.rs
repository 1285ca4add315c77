// ABOUTME: Semi-octet BCD digit codec plus the TS 23.040 address and SMSC header framing
// ABOUTME: Addresses are immutable once built; a leading + maps to the international TON

use crate::sms::error::CodecError;
use num_enum::{FromPrimitive, IntoPrimitive};

/// TS 23.040 Type of Number (3 bits of the type-of-address octet).
///
/// All eight values of the field are defined, so the masked wire nibble
/// always maps to a named variant.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeOfNumber {
    #[num_enum(default)]
    Unknown = 0,
    International = 1,
    National = 2,
    NetworkSpecific = 3,
    SubscriberNumber = 4,
    Alphanumeric = 5,
    Abbreviated = 6,
    ReservedForExtension = 7,
}

/// TS 23.040 Numbering Plan Identification (low nibble of the
/// type-of-address octet).
///
/// Reserved code points keep their raw value so a decoded address
/// re-encodes byte-for-byte.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumberingPlan {
    Unknown = 0,
    Isdn = 1,
    Data = 3,
    Telex = 4,
    National = 8,
    Private = 9,
    Ermes = 10,
    #[num_enum(catch_all)]
    Reserved(u8),
}

/// A dialable party address: BCD digits plus TON/NPI.
///
/// Digits may contain `0-9 * # A B C F` (letters case-insensitive on
/// encode). The `+` prefix is never stored; [`Address::from_string`]
/// strips it and selects the international type of number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    digits: String,
    type_of_number: TypeOfNumber,
    numbering_plan: NumberingPlan,
}

impl Address {
    pub fn new(
        digits: impl Into<String>,
        type_of_number: TypeOfNumber,
        numbering_plan: NumberingPlan,
    ) -> Self {
        Self {
            digits: digits.into(),
            type_of_number,
            numbering_plan,
        }
    }

    /// Builds an address from a dial string, stripping a leading `+`.
    pub fn from_string(number: &str) -> Self {
        let ton = if number.starts_with('+') {
            TypeOfNumber::International
        } else {
            TypeOfNumber::Unknown
        };
        Self {
            digits: number.trim_start_matches('+').to_string(),
            type_of_number: ton,
            numbering_plan: NumberingPlan::Isdn,
        }
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn type_of_number(&self) -> TypeOfNumber {
        self.type_of_number
    }

    pub fn numbering_plan(&self) -> NumberingPlan {
        self.numbering_plan
    }

    /// The type-of-address octet: `1 | TON | NPI`.
    pub fn type_of_address(&self) -> u8 {
        0x80 | ((u8::from(self.type_of_number) & 0x07) << 4)
            | (u8::from(self.numbering_plan) & 0x0F)
    }

    pub fn requires_international_prefix(&self) -> bool {
        self.type_of_number == TypeOfNumber::International
    }
}

fn bcd_value(ch: char) -> Result<u8, CodecError> {
    match ch.to_ascii_uppercase() {
        '0'..='9' => Ok(ch as u8 - b'0'),
        '*' => Ok(0x0A),
        '#' => Ok(0x0B),
        'A' => Ok(0x0C),
        'B' => Ok(0x0D),
        'C' => Ok(0x0E),
        'F' => Ok(0x0F),
        _ => Err(CodecError::InvalidBcdDigit(ch)),
    }
}

fn bcd_symbol(value: u8) -> char {
    match value & 0x0F {
        v @ 0x0..=0x9 => (b'0' + v) as char,
        0x0A => '*',
        0x0B => '#',
        0x0C => 'A',
        0x0D => 'B',
        0x0E => 'C',
        _ => 'F',
    }
}

/// Packs a digit string into semi-octets, low nibble first.
///
/// Spaces are ignored. An odd digit count is padded with `0xF` in the
/// high nibble of the last byte.
pub fn encode_bcd_digits(digits: &str) -> Result<Vec<u8>, CodecError> {
    let mut values = Vec::new();
    for ch in digits.chars() {
        if ch == ' ' {
            continue;
        }
        values.push(bcd_value(ch)?);
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }
    if values.len() % 2 == 1 {
        values.push(0x0F);
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| (pair[0] & 0x0F) | ((pair[1] & 0x0F) << 4))
        .collect())
}

/// Unpacks semi-octets into a digit string of at most `digits_len`
/// symbols, dropping surplus trailing `F` pads.
pub fn decode_bcd_digits(data: &[u8], digits_len: usize) -> String {
    let mut chars = String::with_capacity(data.len() * 2);
    for byte in data {
        chars.push(bcd_symbol(byte & 0x0F));
        chars.push(bcd_symbol((byte >> 4) & 0x0F));
    }
    chars.truncate(digits_len);
    while chars.ends_with('F') {
        chars.pop();
    }
    chars
}

/// Emits `[digit count, TOA, BCD digits…]`.
pub fn encode_address(address: &Address) -> Result<Vec<u8>, CodecError> {
    let encoded = encode_bcd_digits(address.digits())?;
    let mut out = Vec::with_capacity(2 + encoded.len());
    out.push(address.digits().len() as u8);
    out.push(address.type_of_address());
    out.extend_from_slice(&encoded);
    Ok(out)
}

/// Reads an address field at `offset`, returning it with the advanced
/// offset.
pub fn decode_address(data: &[u8], offset: usize) -> Result<(Address, usize), CodecError> {
    let length = *data
        .get(offset)
        .ok_or(CodecError::Truncated("address length"))? as usize;
    let toa = *data
        .get(offset + 1)
        .ok_or(CodecError::Truncated("type of address"))?;
    let digits_octets = length.div_ceil(2);
    let body = data
        .get(offset + 2..offset + 2 + digits_octets)
        .ok_or(CodecError::Truncated("address digits"))?;
    let address = Address::new(
        decode_bcd_digits(body, length),
        TypeOfNumber::from((toa >> 4) & 0x07),
        NumberingPlan::from(toa & 0x0F),
    );
    Ok((address, offset + 2 + digits_octets))
}

/// Emits the SMSC header: `[body octet count, TOA, BCD digits…]`, or a
/// single zero byte when no SMSC is carried.
pub fn encode_smsc(address: Option<&Address>) -> Result<Vec<u8>, CodecError> {
    let Some(address) = address else {
        return Ok(vec![0x00]);
    };
    let digits = encode_bcd_digits(address.digits())?;
    let mut out = Vec::with_capacity(2 + digits.len());
    out.push((1 + digits.len()) as u8);
    out.push(address.type_of_address());
    out.extend_from_slice(&digits);
    Ok(out)
}

/// Reads the SMSC header at `offset`; a zero length yields `None`.
pub fn decode_smsc(data: &[u8], offset: usize) -> Result<(Option<Address>, usize), CodecError> {
    let length = *data
        .get(offset)
        .ok_or(CodecError::Truncated("SMSC length"))? as usize;
    let offset = offset + 1;
    if length == 0 {
        return Ok((None, offset));
    }
    let body = data
        .get(offset..offset + length)
        .ok_or(CodecError::Truncated("SMSC body"))?;
    let toa = body[0];
    let address = Address::new(
        decode_bcd_digits(&body[1..], (length - 1) * 2),
        TypeOfNumber::from((toa >> 4) & 0x07),
        NumberingPlan::from(toa & 0x0F),
    );
    Ok((Some(address), offset + length))
}
