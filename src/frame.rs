/*! Command framing: `'[' payload (crc8)? ']'`.

The payload is ASCII and is guaranteed by the command catalog never to
contain `[` or `]`, so no escaping is required.
*/
use crate::crc8;

/// Encode `payload` into a bracketed frame, optionally appending a
/// trailing CRC8 byte computed over `payload` alone.
pub fn encode(payload: &str, append_crc: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(b'[');
    out.extend_from_slice(payload.as_bytes());
    if append_crc {
        out.push(crc8::compute(payload.as_bytes()));
    }
    out.push(b']');
    out
}

/// Check a trailing CRC8 byte against the field bytes it is supposed
/// to protect.
pub fn decode_trailer_crc(raw_fields: &[u8], received_crc: u8) -> bool {
    crc8::verify(raw_fields, received_crc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_without_crc() {
        assert_eq!(encode("CG3", false), b"[CG3]");
    }

    #[test]
    fn encode_with_crc_starts_and_ends_with_brackets() {
        let framed = encode("WGT", true);
        assert_eq!(framed[0], b'[');
        assert_eq!(*framed.last().unwrap(), b']');
        assert_eq!(framed.len(), "WGT".len() + 3);
    }

    #[test]
    fn crc_in_frame_matches_compute() {
        let framed = encode("ESM1", true);
        let crc_byte = framed[framed.len() - 2];
        assert_eq!(crc_byte, crc8::compute(b"ESM1"));
    }

    #[test]
    fn trailer_crc_roundtrip() {
        let fields = [0x06u8, 0x01];
        let crc = crc8::compute(&fields);
        assert!(decode_trailer_crc(&fields, crc));
        assert!(!decode_trailer_crc(&fields, crc ^ 0xff));
    }
}
