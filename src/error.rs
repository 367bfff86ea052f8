use crate::geometry::EnvelopeType;
use std::error::Error;
use std::fmt;

/// Crate error type for GeoPackage operations.
#[derive(Debug)]
pub enum GpkgError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// Buffer is shorter than a structurally required length.
    InsufficientBytes {
        len: usize,
        required: usize,
    },
    /// The flags byte encodes an envelope type outside the legal range.
    InvalidEnvelopeType(u8),
    /// The geometry header does not start with the `GP` magic.
    MagicMismatch {
        found: [u8; 2],
    },
    /// Envelope coordinates do not match the declared envelope type.
    EnvelopeMismatch {
        envelope_type: EnvelopeType,
        expected: Option<usize>,
        got: usize,
    },
    /// The SRS id stored next to a geometry disagrees with its header.
    SrsIdMismatch {
        header: i32,
        binary: i32,
    },
    /// None of the known tile signatures matched.
    UnknownTileFormat,
    /// A column type declared in SQLite metadata is not supported by this crate.
    UnsupportedColumnType {
        column: String,
        declared_type: String,
    },
    /// A table with the same name already exists.
    TableAlreadyExists {
        table_name: String,
    },
    /// Referenced `srs_id` is neither in `gpkg_spatial_ref_sys` nor a built-in default.
    MissingSpatialRefSysId {
        srs_id: i32,
    },
    /// Table has no geometry column registered in `gpkg_geometry_columns`.
    MissingGeometryColumn {
        table_name: String,
    },
    /// A feature row has a `NULL` geometry value.
    NullGeometryValue,
    ReadOnly,
    Message(String),
}

impl fmt::Display for GpkgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::InsufficientBytes { len, required } => {
                write!(
                    f,
                    "insufficient bytes: got {len} bytes, required {required}"
                )
            }
            Self::InvalidEnvelopeType(flags) => {
                write!(f, "invalid envelope type in gpkg geometry flags: {flags:#04x}")
            }
            Self::MagicMismatch { found } => {
                write!(
                    f,
                    "invalid gpkg geometry magic: {:#04x} {:#04x}",
                    found[0], found[1]
                )
            }
            Self::EnvelopeMismatch {
                envelope_type,
                expected,
                got,
            } => match expected {
                Some(expected) => write!(
                    f,
                    "envelope type {envelope_type} requires {expected} coordinates, got {got}"
                ),
                None => write!(f, "envelope type {envelope_type} cannot be encoded"),
            },
            Self::SrsIdMismatch { header, binary } => {
                write!(
                    f,
                    "srs_id mismatch: header has {header}, geometry has {binary}"
                )
            }
            Self::UnknownTileFormat => write!(f, "could not detect tile format"),
            Self::UnsupportedColumnType {
                column,
                declared_type,
            } => write!(
                f,
                "unsupported column type for column '{column}': {declared_type}"
            ),
            Self::TableAlreadyExists { table_name } => {
                write!(f, "table already exists: {table_name}")
            }
            Self::MissingSpatialRefSysId { srs_id } => {
                write!(f, "srs_id {srs_id} not found in gpkg_spatial_ref_sys")
            }
            Self::MissingGeometryColumn { table_name } => {
                write!(f, "no geometry column found for table: {table_name}")
            }
            Self::NullGeometryValue => write!(f, "feature has null geometry value"),
            Self::ReadOnly => write!(f, "operation not allowed on read-only connection"),
            Self::Message(message) => write!(f, "{message}"),
        }
    }
}

impl Error for GpkgError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for GpkgError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for GpkgError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

pub type Result<T> = std::result::Result<T, GpkgError>;
