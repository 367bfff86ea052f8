use super::{ByteOrder, EnvelopeType, HeaderFlags};
use crate::error::{GpkgError, Result};

/// `GP` in ASCII.
pub const MAGIC: [u8; 2] = [0x47, 0x50];

/// Version 1 of the binary format is written as 0.
pub const VERSION: u8 = 0;

/// Magic, version, flags and SRS id.
pub const FIXED_HEADER_SIZE: usize = 8;

/// A value recovered from a buffer together with a non-fatal problem found
/// while reading it.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub warning: Option<HeaderWarning>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderWarning {
    MagicMismatch { found: [u8; 2] },
}

impl<T> Decoded<T> {
    /// Treat any warning as an error.
    pub fn into_result(self) -> Result<T> {
        match self.warning {
            None => Ok(self.value),
            Some(HeaderWarning::MagicMismatch { found }) => {
                Err(GpkgError::MagicMismatch { found })
            }
        }
    }
}

/// The GeoPackage binary header placed in front of every WKB geometry blob.
// cf. https://www.geopackage.org/spec140/index.html#gpb_format
#[derive(Clone, Debug)]
pub struct BinaryHeader {
    magic: [u8; 2],
    version: u8,
    flags: HeaderFlags,
    srs_id: i32,
    envelope: Vec<f64>,
}

impl BinaryHeader {
    /// Build a header for writing. `envelope` must hold exactly as many values
    /// as `envelope_type` requires.
    pub fn new(
        byte_order: ByteOrder,
        srs_id: i32,
        envelope: Vec<f64>,
        envelope_type: EnvelopeType,
        extended: bool,
        empty: bool,
    ) -> Result<Self> {
        let expected = envelope_type.element_count();
        if expected != Some(envelope.len()) {
            return Err(GpkgError::EnvelopeMismatch {
                envelope_type,
                expected,
                got: envelope.len(),
            });
        }

        Ok(Self {
            magic: MAGIC,
            version: VERSION,
            flags: HeaderFlags::new(byte_order, envelope_type, extended, empty),
            srs_id,
            envelope,
        })
    }

    /// Parse a header from the start of `b`.
    ///
    /// The byte order comes from the flags byte, so the flags are read before
    /// any multi-byte field. A wrong magic does not fail the parse: the header
    /// is returned with [`HeaderWarning::MagicMismatch`] attached.
    pub fn decode(b: &[u8]) -> Result<Decoded<Self>> {
        if b.len() < FIXED_HEADER_SIZE {
            return Err(GpkgError::InsufficientBytes {
                len: b.len(),
                required: FIXED_HEADER_SIZE,
            });
        }

        let magic = [b[0], b[1]];
        let version = b[2];
        let flags = HeaderFlags::from_byte(b[3]);
        let byte_order = flags.byte_order();
        let srs_id = byte_order.read_i32([b[4], b[5], b[6], b[7]]);

        let envelope_type = flags.envelope_type();
        let count = envelope_type
            .element_count()
            .ok_or(GpkgError::InvalidEnvelopeType(flags.bits()))?;

        let mut envelope = Vec::with_capacity(count);
        if count > 0 {
            let required = FIXED_HEADER_SIZE + count * 8;
            if b.len() < required {
                return Err(GpkgError::InsufficientBytes {
                    len: b.len(),
                    required,
                });
            }
            for chunk in b[FIXED_HEADER_SIZE..required].chunks_exact(8) {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                envelope.push(byte_order.read_f64(raw));
            }
        }

        let warning = if magic != MAGIC {
            log::warn!(
                "gpkg geometry header has unexpected magic {:#04x} {:#04x}",
                magic[0],
                magic[1]
            );
            Some(HeaderWarning::MagicMismatch { found: magic })
        } else {
            None
        };

        Ok(Decoded {
            value: Self {
                magic,
                version,
                flags,
                srs_id,
                envelope,
            },
            warning,
        })
    }

    /// Append the encoded header to `buf`.
    pub fn encode_to(&self, buf: &mut Vec<u8>) {
        let byte_order = self.byte_order();
        buf.reserve(self.size());
        buf.extend_from_slice(&self.magic);
        buf.push(self.version);
        buf.push(self.flags.bits());
        byte_order.write_i32(buf, self.srs_id);
        for value in &self.envelope {
            byte_order.write_f64(buf, *value);
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        self.encode_to(&mut buf);
        buf
    }

    /// Same header, written with another byte order.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.flags = self.flags.with_byte_order(byte_order);
        self
    }

    /// Encoded length in bytes.
    pub fn size(&self) -> usize {
        FIXED_HEADER_SIZE + self.envelope.len() * 8
    }

    pub fn magic(&self) -> [u8; 2] {
        self.magic
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> HeaderFlags {
        self.flags
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.flags.byte_order()
    }

    pub fn envelope_type(&self) -> EnvelopeType {
        self.flags.envelope_type()
    }

    pub fn srs_id(&self) -> i32 {
        self.srs_id
    }

    pub fn envelope(&self) -> &[f64] {
        &self.envelope
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn is_standard(&self) -> bool {
        !self.flags.is_extended()
    }
}

// Envelopes of empty geometries are NaN, so coordinates compare by bit pattern.
impl PartialEq for BinaryHeader {
    fn eq(&self, other: &Self) -> bool {
        self.magic == other.magic
            && self.version == other.version
            && self.flags == other.flags
            && self.srs_id == other.srs_id
            && self.envelope.len() == other.envelope.len()
            && self
                .envelope
                .iter()
                .zip(&other.envelope)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}
