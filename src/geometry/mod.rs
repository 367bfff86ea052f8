//! GeoPackage binary geometry encoding.
//!
//! A stored geometry is a [`BinaryHeader`] (magic, version, flags, SRS id and
//! an optional envelope) followed by a WKB payload. [`StandardBinary`] is the
//! unit read from and written to geometry columns.

mod binary;
mod bounds;
mod envelope;
mod flags;
mod header;

pub use binary::StandardBinary;
pub use bounds::{Extent, bounding_box, is_empty};
pub use envelope::EnvelopeType;
pub use flags::{ByteOrder, HeaderFlags};
pub use header::{BinaryHeader, Decoded, FIXED_HEADER_SIZE, HeaderWarning, MAGIC, VERSION};
