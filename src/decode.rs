/*! Typed field decoders.

Each [`FieldType`] reads a fixed number of bytes from a [`Transport`]
in big-endian order and returns both the interpreted [`FieldValue`] and
the raw bytes consumed, so callers can accumulate raw bytes for a
trailing CRC8 check.
*/
use crate::error::{Error, Result};
use crate::transport::Transport;

/// The set of wire field types the response decoders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A single byte, any value.
    Byte,
    /// A single byte constrained to 0 or 1.
    Bool,
    /// Two bytes, big-endian, unsigned.
    U16,
    /// Four bytes, big-endian, IEEE-754 single precision.
    F32,
    /// Four bytes, big-endian, signed two's complement.
    I32,
}

impl FieldType {
    /// Number of wire bytes this field type occupies.
    pub fn width(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Bool => 1,
            FieldType::U16 => 2,
            FieldType::F32 | FieldType::I32 => 4,
        }
    }
}

/// An interpreted field value, tagged by the [`FieldType`] that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// See [`FieldType::Byte`].
    Byte(u8),
    /// See [`FieldType::Bool`].
    Bool(bool),
    /// See [`FieldType::U16`].
    U16(u16),
    /// See [`FieldType::F32`].
    F32(f32),
    /// See [`FieldType::I32`].
    I32(i32),
}

impl FieldValue {
    /// Extract a [`u8`], panicking if this is not a `Byte` field.
    pub fn as_byte(self) -> u8 {
        match self {
            FieldValue::Byte(v) => v,
            other => panic!("expected Byte field, got {other:?}"),
        }
    }

    /// Extract a [`bool`], panicking if this is not a `Bool` field.
    pub fn as_bool(self) -> bool {
        match self {
            FieldValue::Bool(v) => v,
            other => panic!("expected Bool field, got {other:?}"),
        }
    }

    /// Extract a [`u16`], panicking if this is not a `U16` field.
    pub fn as_u16(self) -> u16 {
        match self {
            FieldValue::U16(v) => v,
            other => panic!("expected U16 field, got {other:?}"),
        }
    }

    /// Extract an [`f32`], panicking if this is not an `F32` field.
    pub fn as_f32(self) -> f32 {
        match self {
            FieldValue::F32(v) => v,
            other => panic!("expected F32 field, got {other:?}"),
        }
    }

    /// Extract an [`i32`], panicking if this is not an `I32` field.
    pub fn as_i32(self) -> i32 {
        match self {
            FieldValue::I32(v) => v,
            other => panic!("expected I32 field, got {other:?}"),
        }
    }
}

/// Read one field of `kind` from `transport`, returning the decoded
/// value plus the raw bytes that were consumed.
pub fn decode_field(transport: &mut dyn Transport, kind: FieldType) -> Result<(FieldValue, Vec<u8>)> {
    let mut raw = Vec::with_capacity(kind.width());
    for _ in 0..kind.width() {
        raw.push(transport.read_one()?);
    }
    let value = match kind {
        FieldType::Byte => FieldValue::Byte(raw[0]),
        FieldType::Bool => match raw[0] {
            0 => FieldValue::Bool(false),
            1 => FieldValue::Bool(true),
            other => return Err(Error::UnexpectedByte(other)),
        },
        FieldType::U16 => FieldValue::U16(u16::from_be_bytes([raw[0], raw[1]])),
        FieldType::F32 => FieldValue::F32(f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
        FieldType::I32 => FieldValue::I32(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
    };
    Ok((value, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;

    #[test]
    fn decodes_bool_true_and_false() {
        let mut t = LoopbackTransport::with_bytes(&[0x01, 0x00]);
        let (v, raw) = decode_field(&mut t, FieldType::Bool).unwrap();
        assert_eq!(v, FieldValue::Bool(true));
        assert_eq!(raw, vec![0x01]);
        let (v, _) = decode_field(&mut t, FieldType::Bool).unwrap();
        assert_eq!(v, FieldValue::Bool(false));
    }

    #[test]
    fn bool_rejects_other_values() {
        let mut t = LoopbackTransport::with_bytes(&[0x02]);
        assert!(matches!(
            decode_field(&mut t, FieldType::Bool),
            Err(Error::UnexpectedByte(0x02))
        ));
    }

    #[test]
    fn decodes_u16_big_endian() {
        let mut t = LoopbackTransport::with_bytes(&[0x01, 0x02]);
        let (v, _) = decode_field(&mut t, FieldType::U16).unwrap();
        assert_eq!(v.as_u16(), 0x0102);
    }

    #[test]
    fn decodes_i32_negative_big_endian() {
        // -60 as a 32-bit two's complement big-endian value.
        let mut t = LoopbackTransport::with_bytes(&[0xFF, 0xFF, 0xFF, 0xC4]);
        let (v, _) = decode_field(&mut t, FieldType::I32).unwrap();
        assert_eq!(v.as_i32(), -60);
    }

    #[test]
    fn decodes_f32_big_endian() {
        // 25.0f32 big-endian.
        let mut t = LoopbackTransport::with_bytes(&[0x41, 0xC8, 0x00, 0x00]);
        let (v, _) = decode_field(&mut t, FieldType::F32).unwrap();
        assert_eq!(v.as_f32(), 25.0);
    }

    #[test]
    fn byte_width_matches_decoded_length() {
        for (kind, width) in [
            (FieldType::Byte, 1),
            (FieldType::Bool, 1),
            (FieldType::U16, 2),
            (FieldType::F32, 4),
            (FieldType::I32, 4),
        ] {
            assert_eq!(kind.width(), width);
        }
    }
}
