use crate::error::{GpkgError, Result};
use crate::geometry::Extent;
use crate::ogc_sql::{
    SQL_INSERT_GPKG_CONTENTS, SQL_INSERT_TILE_MATRIX, SQL_INSERT_TILE_MATRIX_SET,
    SQL_SELECT_MAX_ZOOM, SQL_SELECT_TILE_MATRIX, sql_create_tiles_table, sql_select_first_tile,
    sql_select_tile, sql_store_tile,
};
use crate::tile_format::{TileFormat, detect_tile_format};
use rusqlite::OptionalExtension;

use super::Gpkg;
use super::gpkg::DATA_TYPE_TILES;

/// One zoom level of a tile pyramid, as stored in `gpkg_tile_matrix`.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMatrix {
    pub zoom_level: i64,
    /// Number of tile columns.
    pub matrix_width: i64,
    /// Number of tile rows.
    pub matrix_height: i64,
    /// Tile width in pixels.
    pub tile_width: i64,
    /// Tile height in pixels.
    pub tile_height: i64,
    pub pixel_x_size: f64,
    pub pixel_y_size: f64,
}

impl Gpkg {
    /// Create a tile table and register it in `gpkg_contents` and
    /// `gpkg_tile_matrix_set`.
    ///
    /// Only the table and its bounds are recorded; zoom levels are added
    /// with [`Gpkg::register_tile_matrix`].
    pub fn create_tiles_table(&self, table_name: &str, srs_id: i32, bounds: Extent) -> Result<()> {
        self.ensure_writable()?;

        if self.list_layers()?.iter().any(|name| name == table_name) {
            return Err(GpkgError::TableAlreadyExists {
                table_name: table_name.to_string(),
            });
        }
        self.ensure_srs(srs_id)?;

        let conn = self.connection();
        conn.execute_batch(&sql_create_tiles_table(table_name))?;
        conn.execute(
            SQL_INSERT_GPKG_CONTENTS,
            rusqlite::params![table_name, DATA_TYPE_TILES, srs_id],
        )?;
        conn.execute(
            SQL_INSERT_TILE_MATRIX_SET,
            rusqlite::params![
                table_name,
                srs_id,
                bounds.minx,
                bounds.miny,
                bounds.maxx,
                bounds.maxy
            ],
        )?;
        self.update_extent(table_name, bounds)?;
        Ok(())
    }

    /// Insert or replace the tile at (`zoom`, `column`, `row`).
    pub fn store_tile(
        &self,
        table_name: &str,
        zoom: i64,
        column: i64,
        row: i64,
        data: &[u8],
    ) -> Result<()> {
        self.ensure_writable()?;
        self.connection().execute(
            &sql_store_tile(table_name),
            rusqlite::params![zoom, column, row, data],
        )?;
        Ok(())
    }

    /// Read one tile; `None` when nothing is stored at that position.
    pub fn tile(
        &self,
        table_name: &str,
        zoom: i64,
        column: i64,
        row: i64,
    ) -> Result<Option<Vec<u8>>> {
        let tile = self
            .connection()
            .query_row(
                &sql_select_tile(table_name),
                rusqlite::params![zoom, column, row],
                |r| r.get(0),
            )
            .optional()?;
        Ok(tile)
    }

    /// Insert or replace the `gpkg_tile_matrix` row for one zoom level.
    pub fn register_tile_matrix(&self, table_name: &str, matrix: &TileMatrix) -> Result<()> {
        self.ensure_writable()?;
        self.connection().execute(
            SQL_INSERT_TILE_MATRIX,
            rusqlite::params![
                table_name,
                matrix.zoom_level,
                matrix.matrix_width,
                matrix.matrix_height,
                matrix.tile_width,
                matrix.tile_height,
                matrix.pixel_x_size,
                matrix.pixel_y_size
            ],
        )?;
        Ok(())
    }

    /// Tile matrices of a tile table, ordered by zoom level.
    pub fn tile_matrices(&self, table_name: &str) -> Result<Vec<TileMatrix>> {
        let mut stmt = self.connection().prepare(SQL_SELECT_TILE_MATRIX)?;
        let matrices = stmt
            .query_map([table_name], |row| {
                Ok(TileMatrix {
                    zoom_level: row.get(0)?,
                    matrix_width: row.get(1)?,
                    matrix_height: row.get(2)?,
                    tile_width: row.get(3)?,
                    tile_height: row.get(4)?,
                    pixel_x_size: row.get(5)?,
                    pixel_y_size: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matrices)
    }

    /// Tile width in pixels at the lowest registered zoom level.
    pub fn tile_width(&self, table_name: &str) -> Result<Option<i64>> {
        Ok(self
            .tile_matrices(table_name)?
            .first()
            .map(|matrix| matrix.tile_width))
    }

    /// Tile height in pixels at the lowest registered zoom level.
    pub fn tile_height(&self, table_name: &str) -> Result<Option<i64>> {
        Ok(self
            .tile_matrices(table_name)?
            .first()
            .map(|matrix| matrix.tile_height))
    }

    /// Highest zoom level with a registered tile matrix.
    pub fn max_zoom(&self, table_name: &str) -> Result<Option<i64>> {
        let zoom = self
            .connection()
            .query_row(SQL_SELECT_MAX_ZOOM, [table_name], |row| row.get(0))?;
        Ok(zoom)
    }

    /// Detect the encoding of a tile table by sniffing its first tile.
    pub fn tile_format(&self, table_name: &str) -> Result<TileFormat> {
        let first: Option<Vec<u8>> = self
            .connection()
            .query_row(&sql_select_first_tile(table_name), [], |r| r.get(0))
            .optional()?;
        match first {
            Some(data) => detect_tile_format(&data),
            None => Err(GpkgError::UnknownTileFormat),
        }
    }
}
