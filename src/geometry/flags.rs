use super::EnvelopeType;
use std::fmt;

const MASK_BYTE_ORDER: u8 = 0b0000_0001;
const MASK_ENVELOPE_TYPE: u8 = 0b0000_1110;
const MASK_EMPTY_GEOMETRY: u8 = 0b0001_0000;
const MASK_EXTENDED_BINARY: u8 = 0b0010_0000;

/// Byte order of the multi-byte header fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    pub(crate) fn read_i32(self, b: [u8; 4]) -> i32 {
        match self {
            Self::BigEndian => i32::from_be_bytes(b),
            Self::LittleEndian => i32::from_le_bytes(b),
        }
    }

    pub(crate) fn read_f64(self, b: [u8; 8]) -> f64 {
        match self {
            Self::BigEndian => f64::from_be_bytes(b),
            Self::LittleEndian => f64::from_le_bytes(b),
        }
    }

    pub(crate) fn write_i32(self, buf: &mut Vec<u8>, value: i32) {
        match self {
            Self::BigEndian => buf.extend_from_slice(&value.to_be_bytes()),
            Self::LittleEndian => buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    pub(crate) fn write_f64(self, buf: &mut Vec<u8>, value: f64) {
        match self {
            Self::BigEndian => buf.extend_from_slice(&value.to_be_bytes()),
            Self::LittleEndian => buf.extend_from_slice(&value.to_le_bytes()),
        }
    }
}

/// The single control byte of a geometry header.
///
/// ```text
/// bit 0    byte order (0 = big endian, 1 = little endian)
/// bit 1-3  envelope type
/// bit 4    empty geometry
/// bit 5    0 = standard binary, 1 = extended binary
/// ```
///
/// Every byte decodes to some flags value; an out-of-range envelope shows up
/// as [`EnvelopeType::Invalid`] and is rejected by the header decoder.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    pub fn new(
        byte_order: ByteOrder,
        envelope_type: EnvelopeType,
        extended: bool,
        empty: bool,
    ) -> Self {
        let mut bits = 0u8;
        if byte_order == ByteOrder::LittleEndian {
            bits |= MASK_BYTE_ORDER;
        }
        bits |= ((envelope_type as u8) << 1) & MASK_ENVELOPE_TYPE;
        if empty {
            bits |= MASK_EMPTY_GEOMETRY;
        }
        if extended {
            bits |= MASK_EXTENDED_BINARY;
        }
        Self(bits)
    }

    pub const fn from_byte(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn byte_order(self) -> ByteOrder {
        if self.0 & MASK_BYTE_ORDER == 0 {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    pub fn envelope_type(self) -> EnvelopeType {
        EnvelopeType::decode((self.0 & MASK_ENVELOPE_TYPE) >> 1)
    }

    pub fn is_empty(self) -> bool {
        self.0 & MASK_EMPTY_GEOMETRY != 0
    }

    pub fn is_extended(self) -> bool {
        self.0 & MASK_EXTENDED_BINARY != 0
    }

    /// Same flags with another byte order bit.
    pub fn with_byte_order(self, byte_order: ByteOrder) -> Self {
        Self::new(
            byte_order,
            self.envelope_type(),
            self.is_extended(),
            self.is_empty(),
        )
    }
}

impl fmt::Debug for HeaderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeaderFlags({:#04x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteOrder, HeaderFlags};
    use crate::geometry::EnvelopeType;

    #[test]
    fn encodes_bit_layout() {
        let flags = HeaderFlags::new(ByteOrder::LittleEndian, EnvelopeType::Xy, false, false);
        assert_eq!(flags.bits(), 0b0000_0011);

        let flags = HeaderFlags::new(ByteOrder::BigEndian, EnvelopeType::Xyzm, true, true);
        assert_eq!(flags.bits(), 0b0011_1000);
    }

    #[test]
    fn every_byte_decodes() {
        for bits in 0..=u8::MAX {
            let flags = HeaderFlags::from_byte(bits);
            let rebuilt = HeaderFlags::new(
                flags.byte_order(),
                flags.envelope_type(),
                flags.is_extended(),
                flags.is_empty(),
            );
            if flags.envelope_type().is_valid() {
                // bits 6 and 7 are reserved and not carried over
                assert_eq!(rebuilt.bits(), bits & 0b0011_1111);
            }
        }
    }

    #[test]
    fn reserved_envelope_values_are_invalid() {
        for envelope in [5u8, 6, 7] {
            let flags = HeaderFlags::from_byte(envelope << 1 | 1);
            assert_eq!(flags.envelope_type(), EnvelopeType::Invalid);
            assert_eq!(flags.byte_order(), ByteOrder::LittleEndian);
        }
    }

    #[test]
    fn switches_byte_order_only() {
        let flags = HeaderFlags::new(ByteOrder::LittleEndian, EnvelopeType::Xyz, false, true);
        let flipped = flags.with_byte_order(ByteOrder::BigEndian);
        assert_eq!(flipped.byte_order(), ByteOrder::BigEndian);
        assert_eq!(flipped.envelope_type(), EnvelopeType::Xyz);
        assert!(flipped.is_empty());
        assert!(!flipped.is_extended());
    }
}
