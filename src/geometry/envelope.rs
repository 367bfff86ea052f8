use std::fmt;

/// Shape of the bounding box stored inline in a geometry header.
///
/// The discriminant is the 3-bit value stored in bits 1-3 of the flags byte.
// cf. https://www.geopackage.org/spec140/index.html#gpb_format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EnvelopeType {
    /// No envelope, 0 coordinates.
    None = 0,
    /// `[minx, maxx, miny, maxy]`
    Xy = 1,
    /// `[minx, maxx, miny, maxy, minz, maxz]`
    Xyz = 2,
    /// `[minx, maxx, miny, maxy, minm, maxm]`
    Xym = 3,
    /// `[minx, maxx, miny, maxy, minz, maxz, minm, maxm]`
    Xyzm = 4,
    /// Any value from 5 to 7. Never legal on the wire.
    Invalid = 5,
}

impl EnvelopeType {
    /// Decode the 3-bit envelope indicator. Values of 5 and above collapse to
    /// `Invalid`.
    pub const fn decode(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Xy,
            2 => Self::Xyz,
            3 => Self::Xym,
            4 => Self::Xyzm,
            _ => Self::Invalid,
        }
    }

    /// Number of `f64` values the envelope carries, or `None` for `Invalid`.
    pub const fn element_count(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::Xy => Some(4),
            Self::Xyz | Self::Xym => Some(6),
            Self::Xyzm => Some(8),
            Self::Invalid => None,
        }
    }

    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl fmt::Display for EnvelopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Xy => "XY",
            Self::Xyz => "XYZ",
            Self::Xym => "XYM",
            Self::Xyzm => "XYZM",
            Self::Invalid => "INVALID",
        };
        f.write_str(name)
    }
}
