//! GeoPackage persistence built on top of rusqlite.
//!
//! ## Overview
//!
//! - `StandardBinary` is a geometry as stored in a GeoPackage geometry column:
//!   a `BinaryHeader` (magic, version, flags, SRS id, envelope) followed by WKB.
//! - `Feature` is an in-memory record: optional identity, WKB geometry and
//!   named `Value` properties.
//! - `Table` is a feature table definition. `build_table` derives one from a
//!   batch of features and `materialize` coerces features into its columns.
//! - `Gpkg` represents the whole GeoPackage and `GpkgLayer` a single feature
//!   table in it.
//! - `detect_tile_format` sniffs the encoding of a tile blob.
//!
//! `Gpkg` is the entry point and supports several open modes:
//!
//! - `Gpkg::open_read_only(path)`: open an existing file without write access.
//! - `Gpkg::open(path)`: open an existing file for read/write.
//! - `Gpkg::new(path)`: create a new file.
//! - `Gpkg::new_in_memory()`: create a transient in-memory GeoPackage.
//!
//! ## Geometry encoding
//!
//! ```
//! use geo_types::Point;
//! use gpkg_persist::{EnvelopeType, StandardBinary};
//!
//! let binary = StandardBinary::new(4326, &Point::new(1.0, 2.0))?;
//! let blob = binary.encode();
//! assert_eq!(&blob[..2], b"GP");
//!
//! let decoded = StandardBinary::decode(&blob)?;
//! assert_eq!(decoded.srs_id(), 4326);
//! assert_eq!(decoded.header().envelope_type(), EnvelopeType::Xy);
//! assert_eq!(decoded.header().envelope(), &[1.0, 1.0, 2.0, 2.0]);
//! # Ok::<(), gpkg_persist::GpkgError>(())
//! ```
//!
//! ## Dynamic schema
//!
//! The first feature that introduces an attribute name fixes its column
//! type; later values of another type are coerced into it.
//!
//! ```
//! use geo_types::Point;
//! use gpkg_persist::{ColumnType, Feature, Value, build_table, materialize};
//!
//! let features = vec![
//!     Feature::new(&Point::new(0.0, 0.0), [("n", Value::from(1))])?,
//!     Feature::new(&Point::new(1.0, 1.0), [("n", Value::from(2.9))])?,
//! ];
//! let table = build_table("points", "geom", 4326, "POINT", &features);
//! assert_eq!(table.column("n").map(|c| c.column_type), Some(ColumnType::Integer));
//!
//! let rows = materialize(&table, &features);
//! assert_eq!(rows[1].values, vec![Value::Integer(2)]);
//! # Ok::<(), gpkg_persist::GpkgError>(())
//! ```
//!
//! ## Writer
//!
//! ```no_run
//! use geo_types::Point;
//! use gpkg_persist::{Feature, Gpkg, WriteOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gpkg = Gpkg::new("data.gpkg")?;
//!
//!     let features = vec![
//!         Feature::new(&Point::new(1.0, 2.0), [("name", "alpha")])?.with_id(1),
//!         Feature::new(&Point::new(3.0, 4.0), [("name", "beta")])?.with_id(2),
//!     ];
//!     gpkg.store_features("points", "geom", 4326, "POINT", &features, &WriteOptions::default())?;
//!
//!     gpkg.create_tiles_table("basemap", 3857, gpkg_persist::Extent {
//!         minx: -20037508.34,
//!         miny: -20037508.34,
//!         maxx: 20037508.34,
//!         maxy: 20037508.34,
//!     })?;
//!     gpkg.store_tile("basemap", 0, 0, 0, &std::fs::read("0.png")?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Reader
//!
//! ```no_run
//! use gpkg_persist::Gpkg;
//! use wkt::to_wkt::write_geometry;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gpkg = Gpkg::open_read_only("data.gpkg")?;
//!     for layer_name in gpkg.list_layers()? {
//!         let Some(table) = gpkg.table(&layer_name)? else {
//!             continue;
//!         };
//!         let layer = gpkg.open_layer(&table.name)?;
//!         for feature in layer.features()? {
//!             let mut wkt = String::new();
//!             write_geometry(&mut wkt, &feature.geometry()?)?;
//!             println!("{layer_name}: {wkt}");
//!
//!             for (name, value) in feature.properties() {
//!                 println!("  {name} = {value:?}");
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
mod error;
mod gpkg;
mod sql_functions;

mod conversions;
mod geometry;
mod ogc_sql;
mod schema;
mod srs;
mod tile_format;
mod types;

pub use error::{GpkgError, Result};
pub use geometry::{
    BinaryHeader, ByteOrder, Decoded, EnvelopeType, Extent, FIXED_HEADER_SIZE, HeaderFlags,
    HeaderWarning, MAGIC, StandardBinary, VERSION, bounding_box, is_empty,
};
pub use gpkg::{Gpkg, GpkgLayer, TileMatrix};
pub use schema::{
    Feature, FeatureRow, ID_COLUMN, SchemaBuilder, Table, build_table, build_table_with_policy,
    coerce, infer_attribute_type, infer_identity_type, materialize,
};
pub use sql_functions::register_spatial_functions;
pub use srs::{DEFAULT_SPATIAL_REF_SYS, SpatialRefSys, default_srs};
pub use tile_format::{TileFormat, detect_tile_format};
pub use types::{ColumnSpec, ColumnType, SchemaPolicy, Value, WriteOptions};
