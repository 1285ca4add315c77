// ABOUTME: Codec for the 7-octet TS 23.040 service-centre timestamp
// ABOUTME: Semi-octet digits with the zone in quarter-hours, sign in bit 3 of the low nibble

use crate::sms::error::CodecError;
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};

/// Packs a two-digit value as a semi-octet pair: tens digit in the low
/// nibble, units digit in the high nibble.
pub fn int_to_semi_octet(value: u8) -> u8 {
    ((value % 10) << 4) | (value / 10)
}

/// Unpacks a semi-octet pair back into its two-digit value.
pub fn semi_octet_to_int(byte: u8) -> u8 {
    (byte & 0x0F) * 10 + ((byte >> 4) & 0x0F)
}

/// Encodes `[year%100, month, day, hour, minute, second, zone]` as seven
/// semi-octet pairs.
///
/// The zone octet carries the offset in quarter-hours (clamped to 63)
/// with the sign in bit 3 of the tens nibble. Components outside 0..=99
/// fail; `DateTime` guarantees that for all six calendar fields.
pub fn encode_timestamp(dt: &DateTime<FixedOffset>) -> Result<[u8; 7], CodecError> {
    let offset_minutes = dt.offset().local_minus_utc() / 60;
    let quarter_hours = (offset_minutes.unsigned_abs() / 15).min(63) as u8;

    let components = [
        dt.year().rem_euclid(100) as u32,
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    ];
    let mut out = [0u8; 7];
    for (slot, value) in out.iter_mut().zip(components) {
        if value > 99 {
            return Err(CodecError::TimestampOutOfRange);
        }
        *slot = int_to_semi_octet(value as u8);
    }
    let mut tz = int_to_semi_octet(quarter_hours);
    if offset_minutes < 0 {
        tz |= 0x08;
    }
    out[6] = tz;
    Ok(out)
}

/// Decodes a 7-octet timestamp.
///
/// Out-of-range calendar components are clamped into the legal range
/// (month 1..=12, day 1..=31, hour 0..=23, minute/second 0..=59); years
/// below 70 map to 20xx, the rest to 19xx. The clamped date can still be
/// impossible (Feb 30) and then fails.
pub fn decode_timestamp(data: &[u8]) -> Result<DateTime<FixedOffset>, CodecError> {
    if data.len() != 7 {
        return Err(CodecError::BadTimestampLength);
    }
    let values: Vec<u32> = data[..6]
        .iter()
        .map(|&b| semi_octet_to_int(b) as u32)
        .collect();

    let tz_byte = data[6];
    let quarters = semi_octet_to_int(tz_byte & 0xF7) as i32;
    let offset_seconds = if tz_byte & 0x08 != 0 {
        -(quarters * 15 * 60)
    } else {
        quarters * 15 * 60
    };
    let offset =
        FixedOffset::east_opt(offset_seconds).ok_or(CodecError::TimestampOutOfRange)?;

    let year = if values[0] < 70 {
        2000 + values[0] as i32
    } else {
        1900 + values[0] as i32
    };
    offset
        .with_ymd_and_hms(
            year,
            values[1].clamp(1, 12),
            values[2].clamp(1, 31),
            values[3].min(23),
            values[4].min(59),
            values[5].min(59),
        )
        .single()
        .ok_or(CodecError::TimestampOutOfRange)
}
