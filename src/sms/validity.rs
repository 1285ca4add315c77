// ABOUTME: Relative validity period codec mapping the TP-VP byte to a duration
// ABOUTME: Four quantized buckets: 5-minute, 30-minute, day and week granularity

use std::time::Duration;

const MINUTE: u64 = 60;

/// Maps a TP-VP byte to its duration.
///
/// Buckets per TS 23.040 9.2.3.12.1:
/// - 0..=143: (v+1) x 5 minutes
/// - 144..=167: 12 hours + (v-143) x 30 minutes
/// - 168..=196: (v-166) days
/// - 197..=255: (v-192) weeks
pub fn decode_relative_validity(value: u8) -> Duration {
    let minutes: u64 = match value {
        0..=143 => (value as u64 + 1) * 5,
        144..=167 => 12 * 60 + (value as u64 - 143) * 30,
        168..=196 => (value as u64 - 166) * 24 * 60,
        _ => (value as u64 - 192) * 7 * 24 * 60,
    };
    Duration::from_secs(minutes * MINUTE)
}

/// Maps a duration onto the smallest representable TP-VP value that is
/// not shorter than the input, clamped at each bucket boundary.
pub fn encode_relative_validity(delta: Duration) -> u8 {
    let minutes = delta.as_secs() / MINUTE;
    if minutes <= 12 * 60 {
        let units = ((minutes + 4) / 5).max(1);
        return (units.min(144) - 1) as u8;
    }
    if minutes <= 24 * 60 {
        let half_hours = ((minutes - 12 * 60).div_ceil(30)).max(1);
        return (half_hours.min(24) + 143) as u8;
    }
    if minutes <= 30 * 24 * 60 {
        let days = minutes.div_ceil(24 * 60).clamp(2, 30);
        return (days + 166) as u8;
    }
    let weeks = minutes.div_ceil(7 * 24 * 60).clamp(5, 63);
    (weeks + 192) as u8
}
