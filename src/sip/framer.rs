// ABOUTME: Length-aware splitting of an accumulation buffer into complete SIP messages
// ABOUTME: Message size is the header block plus the first Content-Length value

use bytes::{Bytes, BytesMut};

/// Default cap on the per-connection accumulation buffer.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;

const DELIMITER: &[u8] = b"\r\n\r\n";

/// Splits one complete SIP message off the front of `buffer`, or
/// returns `None` when the buffered data is still incomplete.
///
/// The message boundary is the first `CRLF CRLF` plus the value of the
/// first `Content-Length` header (case-insensitive; an unparseable
/// value counts as zero). Callers rerun until `None`.
pub fn next_message(buffer: &mut BytesMut) -> Option<Bytes> {
    let header_end = find_subsequence(buffer, DELIMITER)? + DELIMITER.len();
    let total = header_end + content_length_from_headers(&buffer[..header_end]);
    if buffer.len() < total {
        return None;
    }
    Some(buffer.split_to(total).freeze())
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn content_length_from_headers(header_block: &[u8]) -> usize {
    let text = String::from_utf8_lossy(header_block);
    for line in text.split("\r\n") {
        // Prefix bytes are ASCII when they match, so the str slice below
        // lands on a char boundary.
        let bytes = line.as_bytes();
        if bytes.len() >= 15 && bytes[..15].eq_ignore_ascii_case(b"content-length:") {
            return line[15..].trim().parse().unwrap_or(0);
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(data: &[u8]) -> BytesMut {
        BytesMut::from(data)
    }

    #[test]
    fn incomplete_without_terminator() {
        let mut buffer = buf(b"INVITE sip:a@b SIP/2.0\r\nContent-Length: 0\r\n");
        assert!(next_message(&mut buffer).is_none());
        assert_eq!(buffer.len(), 43);
    }

    #[test]
    fn splits_headers_plus_body() {
        let mut buffer = buf(b"INVITE sip:a@b SIP/2.0\r\nContent-Length: 4\r\n\r\nBODYREST");
        let message = next_message(&mut buffer).unwrap();
        assert!(message.ends_with(b"BODY"));
        assert_eq!(&buffer[..], b"REST");
    }

    #[test]
    fn waits_for_full_body() {
        let mut buffer = buf(b"INVITE sip:a@b SIP/2.0\r\nContent-Length: 10\r\n\r\nBO");
        assert!(next_message(&mut buffer).is_none());
        buffer.extend_from_slice(b"DY-DONE-");
        let message = next_message(&mut buffer).unwrap();
        assert!(message.ends_with(b"BODY-DONE-"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn missing_content_length_means_zero() {
        let mut buffer = buf(b"ACK sip:a@b SIP/2.0\r\n\r\ntrailing");
        let message = next_message(&mut buffer).unwrap();
        assert!(message.ends_with(DELIMITER));
        assert_eq!(&buffer[..], b"trailing");
    }

    #[test]
    fn unparseable_content_length_means_zero() {
        let mut buffer = buf(b"ACK sip:a@b SIP/2.0\r\nContent-Length: many\r\n\r\nxx");
        let message = next_message(&mut buffer).unwrap();
        assert!(message.ends_with(DELIMITER));
        assert_eq!(&buffer[..], b"xx");
    }

    #[test]
    fn first_content_length_occurrence_wins() {
        let mut buffer =
            buf(b"ACK sip:a@b SIP/2.0\r\ncontent-length: 2\r\nContent-Length: 9\r\n\r\nab");
        let message = next_message(&mut buffer).unwrap();
        assert!(message.ends_with(b"ab"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn chunked_feed_reassembles_sequence_in_order() {
        // Two serialized messages pushed through in 7-byte chunks.
        let wire = b"INVITE sip:a@b SIP/2.0\r\nContent-Length: 4\r\n\r\nBODY\
                     ACK sip:a@b SIP/2.0\r\nContent-Length: 0\r\n\r\n"
            .to_vec();
        let mut buffer = BytesMut::new();
        let mut messages = Vec::new();
        for chunk in wire.chunks(7) {
            buffer.extend_from_slice(chunk);
            while let Some(message) = next_message(&mut buffer) {
                messages.push(message);
            }
        }
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with(b"INVITE"));
        assert!(messages[0].ends_with(b"BODY"));
        assert!(messages[1].starts_with(b"ACK"));
        assert!(buffer.is_empty(), "clean boundary must leave no residual");
    }
}
