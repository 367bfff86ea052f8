//! GeoPackage storage backed by rusqlite.
//!
//! [`Gpkg`] owns the connection and the GeoPackage metadata tables; feature
//! tables are written and read through [`GpkgLayer`]. Tile tables are handled
//! directly on [`Gpkg`].

mod gpkg;
mod layer;
mod tiles;

pub use gpkg::Gpkg;
pub use layer::GpkgLayer;
pub use tiles::TileMatrix;
