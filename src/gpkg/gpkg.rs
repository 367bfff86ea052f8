use crate::conversions::{column_type_from_str, is_geometry_type_name};
use crate::error::{GpkgError, Result};
use crate::geometry::{Extent, StandardBinary};
use crate::ogc_sql::{
    SQL_INSERT_GPKG_CONTENTS, SQL_INSERT_GPKG_GEOMETRY_COLUMNS, SQL_LIST_LAYERS,
    SQL_SELECT_CONTENTS_EXTENT, SQL_SELECT_GEOMETRY_COLUMN_META, SQL_SELECT_PACKAGE_EXTENT,
    SQL_SELECT_SRS_AUTHORITY, SQL_SRS_EXISTS, SQL_UPDATE_CONTENTS_EXTENT, initialize_gpkg,
    insert_srs, quote_ident, sql_select_columns, sql_table_columns,
};
use crate::schema::{Feature, Table, build_table_with_policy};
use crate::sql_functions::register_spatial_functions;
use crate::srs::{authority_code, default_srs};
use crate::types::{ColumnSpec, WriteOptions};
use rusqlite::{OpenFlags, OptionalExtension};
use std::path::Path;

use super::layer::GpkgLayer;

pub(crate) const DATA_TYPE_FEATURES: &str = "features";
pub(crate) const DATA_TYPE_TILES: &str = "tiles";

#[derive(Debug)]
/// GeoPackage connection wrapper for feature and tile tables.
pub struct Gpkg {
    conn: rusqlite::Connection,
    read_only: bool,
}

impl Gpkg {
    /// Open a GeoPackage in read-only mode.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        register_spatial_functions(&conn)?;
        Ok(Self {
            conn,
            read_only: true,
        })
    }

    /// Open an existing GeoPackage in read-write mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GpkgError::Message(format!(
                "GeoPackage file does not exist: {}",
                path.display()
            )));
        }

        let conn = rusqlite::Connection::open(path)?;
        register_spatial_functions(&conn)?;
        Ok(Self {
            conn,
            read_only: false,
        })
    }

    /// Create a new GeoPackage
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(GpkgError::Message(format!(
                "GeoPackage file already exists: {}",
                path.display()
            )));
        }

        let conn = rusqlite::Connection::open(path)?;

        initialize_gpkg(&conn)?;
        register_spatial_functions(&conn)?;

        Ok(Self {
            conn,
            read_only: false,
        })
    }

    /// Create a new GeoPackage in memory
    pub fn new_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;

        initialize_gpkg(&conn)?;
        register_spatial_functions(&conn)?;

        Ok(Self {
            conn,
            read_only: false,
        })
    }

    /// Expert-only: register a spatial reference system in gpkg_spatial_ref_sys.
    ///
    /// Only a handful of definitions are built in (see
    /// [`crate::srs::DEFAULT_SPATIAL_REF_SYS`]); any other SRS must be
    /// registered with its full WKT definition before a table refers to it.
    /// No validation of the WKT or authority fields is performed. An existing
    /// row with the same `srs_id` is left untouched.
    pub fn register_srs(
        &self,
        srs_name: &str,
        srs_id: i32,
        organization: &str,
        organization_coordsys_id: i32,
        definition: &str,
        description: &str,
    ) -> Result<()> {
        self.ensure_writable()?;

        self.conn.execute(
            crate::ogc_sql::SQL_INSERT_SRS,
            rusqlite::params![
                srs_name,
                srs_id,
                organization,
                organization_coordsys_id,
                definition,
                description
            ],
        )?;
        Ok(())
    }

    /// Make sure `srs_id` exists, inserting a built-in definition if needed.
    pub fn ensure_srs(&self, srs_id: i32) -> Result<()> {
        if self.srs_exists(srs_id)? {
            return Ok(());
        }
        self.ensure_writable()?;

        let srs = default_srs(srs_id).ok_or(GpkgError::MissingSpatialRefSysId { srs_id })?;
        log::debug!("registering built-in srs {srs_id} ({})", srs.name);
        insert_srs(&self.conn, srs)?;
        Ok(())
    }

    fn srs_exists(&self, srs_id: i32) -> Result<bool> {
        let exists: i64 = self
            .conn
            .query_row(SQL_SRS_EXISTS, rusqlite::params![srs_id], |row| row.get(0))?;
        Ok(exists != 0)
    }

    /// List the names of the tables registered in `gpkg_contents`.
    pub fn list_layers(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(SQL_LIST_LAYERS)?;
        let layers = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(layers)
    }

    /// Read the definition of an existing feature table, or `None` if no
    /// geometry column is registered for it.
    pub fn table(&self, table_name: &str) -> Result<Option<Table>> {
        let meta = self
            .conn
            .query_row(SQL_SELECT_GEOMETRY_COLUMN_META, [table_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)?,
                ))
            })
            .optional()?;
        let Some((geometry_column, geometry_type, srs_id)) = meta else {
            return Ok(None);
        };

        let columns = self
            .get_column_specs(table_name)?
            .into_iter()
            .filter(|spec| !spec.name.eq_ignore_ascii_case(&geometry_column))
            .collect();

        Ok(Some(Table {
            name: table_name.to_string(),
            columns,
            geometry_column,
            geometry_type,
            srs_id,
        }))
    }

    /// Load a feature table by name.
    pub fn open_layer<'a>(&'a self, table_name: &str) -> Result<GpkgLayer<'a>> {
        let table = self
            .table(table_name)?
            .ok_or_else(|| GpkgError::MissingGeometryColumn {
                table_name: table_name.to_string(),
            })?;
        Ok(GpkgLayer { conn: self, table })
    }

    /// Create the storage table for `table` and register it as a feature
    /// table.
    pub fn create_table<'a>(&'a self, table: Table) -> Result<GpkgLayer<'a>> {
        self.ensure_writable()?;

        if self.list_layers()?.iter().any(|name| *name == table.name) {
            return Err(GpkgError::TableAlreadyExists {
                table_name: table.name.clone(),
            });
        }
        self.ensure_srs(table.srs_id)?;

        self.conn.execute_batch(&table.create_statement())?;
        self.conn.execute(
            SQL_INSERT_GPKG_CONTENTS,
            rusqlite::params![table.name, DATA_TYPE_FEATURES, table.srs_id],
        )?;
        self.conn.execute(
            SQL_INSERT_GPKG_GEOMETRY_COLUMNS,
            rusqlite::params![
                table.name,
                table.geometry_column,
                table.geometry_type,
                table.srs_id
            ],
        )?;

        Ok(GpkgLayer { conn: self, table })
    }

    /// Write a batch of features, creating the table from the batch when it
    /// does not exist yet.
    ///
    /// Example:
    /// ```no_run
    /// use geo_types::Point;
    /// use gpkg_persist::{Feature, Gpkg, WriteOptions};
    ///
    /// let gpkg = Gpkg::new("data/example.gpkg")?;
    /// let features = vec![
    ///     Feature::new(&Point::new(1.0, 2.0), [("name", "alpha")])?.with_id(1),
    ///     Feature::new(&Point::new(3.0, 4.0), [("name", "beta")])?.with_id(2),
    /// ];
    /// let layer = gpkg.store_features(
    ///     "points",
    ///     "geom",
    ///     4326,
    ///     "POINT",
    ///     &features,
    ///     &WriteOptions::default(),
    /// )?;
    /// assert_eq!(layer.features()?.len(), 2);
    /// # Ok::<(), gpkg_persist::GpkgError>(())
    /// ```
    pub fn store_features<'a>(
        &'a self,
        table_name: &str,
        geometry_column: &str,
        srs_id: i32,
        geometry_type: &str,
        features: &[Feature],
        options: &WriteOptions,
    ) -> Result<GpkgLayer<'a>> {
        let layer = match self.table(table_name)? {
            Some(table) => GpkgLayer { conn: self, table },
            None => {
                let table = build_table_with_policy(
                    table_name,
                    geometry_column,
                    srs_id,
                    geometry_type,
                    features,
                    options.schema_policy,
                );
                self.create_table(table)?
            }
        };

        layer.insert_features(features, options)?;
        Ok(layer)
    }

    pub(crate) fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(GpkgError::ReadOnly);
        }
        Ok(())
    }

    /// Extent recorded in `gpkg_contents` for a table.
    pub fn extent(&self, table_name: &str) -> Result<Option<Extent>> {
        let bounds = self
            .conn
            .query_row(SQL_SELECT_CONTENTS_EXTENT, [table_name], |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })
            .optional()?;

        Ok(match bounds {
            Some((Some(minx), Some(miny), Some(maxx), Some(maxy))) => Some(Extent {
                minx,
                miny,
                maxx,
                maxy,
            }),
            _ => None,
        })
    }

    /// Extent covering every table in `gpkg_contents`, or `None` when no
    /// table has bounds yet.
    pub fn package_extent(&self) -> Result<Option<Extent>> {
        let bounds = self.conn.query_row(SQL_SELECT_PACKAGE_EXTENT, [], |row| {
            Ok((
                row.get::<_, Option<f64>>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        Ok(match bounds {
            (Some(minx), Some(miny), Some(maxx), Some(maxy)) => Some(Extent {
                minx,
                miny,
                maxx,
                maxy,
            }),
            _ => None,
        })
    }

    /// Recompute a feature table's extent from its stored geometries.
    ///
    /// `NULL` and empty geometries are skipped; `None` means nothing had
    /// bounds. The value in `gpkg_contents` is not touched.
    pub fn calculate_extent(&self, table_name: &str) -> Result<Option<Extent>> {
        let geometry_column: String = self
            .conn
            .query_row(SQL_SELECT_GEOMETRY_COLUMN_META, [table_name], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| GpkgError::MissingGeometryColumn {
                table_name: table_name.to_string(),
            })?;

        let sql = sql_select_columns(table_name, &quote_ident(&geometry_column));
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut extent: Option<Extent> = None;
        while let Some(row) = rows.next()? {
            let Some(blob) = row.get::<_, Option<Vec<u8>>>(0)? else {
                continue;
            };
            if let Some(geometry_extent) = StandardBinary::decode(&blob)?.extent() {
                extent = Some(match extent {
                    Some(extent) => extent.merge(geometry_extent),
                    None => geometry_extent,
                });
            }
        }
        Ok(extent)
    }

    /// Authority code such as `EPSG:4326` of an SRS registered in this
    /// package. `None` for systems whose organization is `NONE`.
    pub fn srs_code(&self, srs_id: i32) -> Result<Option<String>> {
        let authority = self
            .conn
            .query_row(SQL_SELECT_SRS_AUTHORITY, [srs_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
            })
            .optional()?;
        let (organization, organization_coordsys_id) =
            authority.ok_or(GpkgError::MissingSpatialRefSysId { srs_id })?;
        Ok(authority_code(&organization, organization_coordsys_id))
    }

    /// Grow the extent recorded in `gpkg_contents` to include `extent`.
    pub(crate) fn update_extent(&self, table_name: &str, extent: Extent) -> Result<()> {
        let merged = match self.extent(table_name)? {
            Some(existing) => existing.merge(extent),
            None => extent,
        };
        self.conn.execute(
            SQL_UPDATE_CONTENTS_EXTENT,
            rusqlite::params![merged.minx, merged.miny, merged.maxx, merged.maxy, table_name],
        )?;
        Ok(())
    }

    /// Resolve the table columns and map SQLite types.
    pub(crate) fn get_column_specs(&self, table_name: &str) -> Result<Vec<ColumnSpec>> {
        let query = sql_table_columns(table_name);
        let mut stmt = self.conn.prepare(&query)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)? != 0,
                    row.get::<_, i32>(3)? != 0,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut column_specs = Vec::with_capacity(rows.len());
        for (name, declared_type, not_null, primary_key) in rows {
            let Some(column_type) = column_type_from_str(&declared_type) else {
                if is_geometry_type_name(&declared_type) {
                    continue;
                }
                return Err(GpkgError::UnsupportedColumnType {
                    column: name,
                    declared_type,
                });
            };
            column_specs.push(ColumnSpec {
                name,
                column_type,
                not_null,
                primary_key,
            });
        }

        Ok(column_specs)
    }
}

#[cfg(test)]
mod tests {
    use super::Gpkg;
    use crate::Result;
    use crate::error::GpkgError;
    use crate::geometry::Extent;
    use crate::schema::{Feature, Table};
    use crate::types::{ColumnSpec, ColumnType, SchemaPolicy, Value, WriteOptions};
    use geo_types::{LineString, Point};

    fn empty_table(name: &str, srs_id: i32) -> Table {
        Table {
            name: name.to_string(),
            columns: vec![ColumnSpec::primary_key("id", ColumnType::Integer)],
            geometry_column: "geom".to_string(),
            geometry_type: "POINT".to_string(),
            srs_id,
        }
    }

    #[test]
    fn create_table_requires_known_srs() {
        let gpkg = Gpkg::new_in_memory().expect("new gpkg");
        let err = gpkg
            .create_table(empty_table("missing_srs", 9999))
            .expect_err("missing srs should fail");
        assert!(matches!(
            err,
            GpkgError::MissingSpatialRefSysId { srs_id: 9999 }
        ));
    }

    #[test]
    fn create_table_registers_builtin_srs() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        gpkg.create_table(empty_table("mercator", 3857))?;

        let name: String = gpkg.connection().query_row(
            "SELECT srs_name FROM gpkg_spatial_ref_sys WHERE srs_id = 3857",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(name, "WGS 84 / Pseudo-Mercator");

        let err = gpkg
            .create_table(empty_table("mercator", 3857))
            .expect_err("duplicate table should fail");
        assert!(matches!(err, GpkgError::TableAlreadyExists { .. }));
        Ok(())
    }

    #[test]
    fn discovers_created_table() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let mut table = empty_table("places", 4326);
        table.columns.push(ColumnSpec::new("name", ColumnType::Text));
        table.columns.push(ColumnSpec::new("score", ColumnType::Real));
        table.columns.push(ColumnSpec::new("raw", ColumnType::Blob));
        gpkg.create_table(table.clone())?;

        let discovered = gpkg.table("places")?.expect("table");
        assert_eq!(discovered, table);
        assert!(gpkg.table("nothing")?.is_none());
        assert_eq!(gpkg.list_layers()?, vec!["places"]);
        Ok(())
    }

    #[test]
    fn store_features_synthesizes_then_reuses_table() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let options = WriteOptions {
            batch_size: 2,
            ..Default::default()
        };

        let first = vec![
            Feature::new(&Point::new(1.0, 2.0), [("n", Value::from(1))])?.with_id("a"),
            Feature::new(&Point::new(-3.0, 5.0), [("n", Value::from(2.5))])?.with_id("b"),
            Feature::new(&Point::new(0.0, 0.0), [("label", Value::from("x"))])?.with_id("c"),
        ];
        let layer = gpkg.store_features("pts", "geom", 4326, "POINT", &first, &options)?;
        assert_eq!(layer.table.columns.len(), 3);

        let second = vec![
            Feature::new(&Point::new(10.0, -1.0), [("n", Value::from("7"))])?.with_id("d"),
        ];
        let layer = gpkg.store_features("pts", "ignored", 0, "POINT", &second, &options)?;
        assert_eq!(layer.table.geometry_column, "geom");

        let features = layer.features()?;
        assert_eq!(features.len(), 4);
        let ns: Vec<Option<&Value>> = features.iter().map(|f| f.property("n")).collect();
        assert_eq!(
            ns,
            vec![
                Some(&Value::Integer(1)),
                Some(&Value::Integer(2)),
                Some(&Value::Null),
                Some(&Value::Integer(7)),
            ]
        );
        assert_eq!(features[3].id(), Some(&Value::from("d")));

        let extent = gpkg.extent("pts")?.expect("extent");
        assert_eq!(extent.minx, -3.0);
        assert_eq!(extent.maxx, 10.0);
        assert_eq!(extent.miny, -1.0);
        assert_eq!(extent.maxy, 5.0);
        Ok(())
    }

    #[test]
    fn store_features_honours_widest_type() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let options = WriteOptions {
            schema_policy: SchemaPolicy::WidestType,
            ..Default::default()
        };
        let features = vec![
            Feature::new(&Point::new(1.0, 2.0), [("n", Value::from(1))])?,
            Feature::new(&Point::new(1.0, 2.0), [("n", Value::from(2.5))])?,
        ];
        let layer = gpkg.store_features("pts", "geom", 4326, "POINT", &features, &options)?;
        assert_eq!(
            layer.table.column("n"),
            Some(&ColumnSpec::new("n", ColumnType::Real))
        );

        let values: Vec<Value> = layer
            .features()?
            .iter()
            .filter_map(|f| f.property("n").cloned())
            .collect();
        assert_eq!(values, vec![Value::Real(1.0), Value::Real(2.5)]);
        Ok(())
    }

    #[test]
    fn store_features_ignores_attribute_named_like_geometry() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let features = vec![
            Feature::new(&Point::new(1.0, 2.0), [("geom", "x"), ("name", "a")])?.with_id(1),
        ];
        let layer = gpkg.store_features(
            "t",
            "geom",
            4326,
            "POINT",
            &features,
            &WriteOptions::default(),
        )?;

        let stored = layer.features()?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].property("name"), Some(&Value::from("a")));
        assert_eq!(stored[0].property("geom"), None);
        Ok(())
    }

    #[test]
    fn calculates_extent_from_stored_geometries() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let features = vec![
            Feature::new(&Point::new(2.0, -4.0), [("n", 1)])?,
            Feature::new(&LineString::<f64>::new(Vec::new()), [("n", 2)])?,
            Feature::new(&Point::new(-1.0, 3.0), [("n", 3)])?,
        ];
        gpkg.store_features("pts", "geom", 4326, "GEOMETRY", &features, &WriteOptions::default())?;
        gpkg.connection()
            .execute(r#"UPDATE gpkg_contents SET min_x = NULL WHERE table_name = 'pts'"#, [])?;

        let extent = gpkg.calculate_extent("pts")?.expect("extent");
        assert_eq!(
            extent,
            Extent {
                minx: -1.0,
                miny: -4.0,
                maxx: 2.0,
                maxy: 3.0
            }
        );
        assert_eq!(gpkg.extent("pts")?, None);

        let err = gpkg
            .calculate_extent("nothing")
            .expect_err("unknown table should fail");
        assert!(matches!(err, GpkgError::MissingGeometryColumn { .. }));
        Ok(())
    }

    #[test]
    fn package_extent_spans_all_tables() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        assert_eq!(gpkg.package_extent()?, None);

        let options = WriteOptions::default();
        let a = vec![Feature::new(&Point::new(0.0, 0.0), [("n", 1)])?];
        let b = vec![Feature::new(&Point::new(10.0, -5.0), [("n", 1)])?];
        gpkg.store_features("a", "geom", 4326, "POINT", &a, &options)?;
        gpkg.store_features("b", "geom", 4326, "POINT", &b, &options)?;

        assert_eq!(
            gpkg.package_extent()?,
            Some(Extent {
                minx: 0.0,
                miny: -5.0,
                maxx: 10.0,
                maxy: 0.0
            })
        );
        Ok(())
    }

    #[test]
    fn srs_code_reads_registered_systems() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        assert_eq!(gpkg.srs_code(4326)?, Some("EPSG:4326".to_string()));
        assert_eq!(gpkg.srs_code(0)?, None);

        gpkg.register_srs(
            "ETRS89 / UTM zone 32N",
            25832,
            "epsg",
            25832,
            "PROJCS[\"ETRS89 / UTM zone 32N\"]",
            "",
        )?;
        assert_eq!(gpkg.srs_code(25832)?, Some("EPSG:25832".to_string()));

        let err = gpkg.srs_code(3857).expect_err("not registered yet");
        assert!(matches!(
            err,
            GpkgError::MissingSpatialRefSysId { srs_id: 3857 }
        ));
        Ok(())
    }

    #[test]
    fn new_fails_if_file_exists() {
        use std::fs;
        use std::time::{SystemTime, UNIX_EPOCH};

        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("gpkg_persist_exists_{nanos}.gpkg"));

        fs::write(&path, b"").expect("create temp file");
        let err = Gpkg::new(&path).expect_err("existing file should fail");
        match err {
            GpkgError::Message(message) => {
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn open_fails_if_missing_file() {
        use std::time::{SystemTime, UNIX_EPOCH};

        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("gpkg_persist_missing_{nanos}.gpkg"));

        let err = Gpkg::open(&path).expect_err("missing file should fail");
        match err {
            GpkgError::Message(message) => {
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn read_only_rejects_writes() -> Result<()> {
        use std::time::{SystemTime, UNIX_EPOCH};

        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("gpkg_persist_read_only_{nanos}.gpkg"));

        drop(Gpkg::new(&path)?);
        let gpkg = Gpkg::open_read_only(&path)?;
        let err = gpkg
            .create_table(empty_table("points", 4326))
            .expect_err("read-only should fail");
        assert!(matches!(err, GpkgError::ReadOnly));

        drop(gpkg);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
