use crate::error::{GpkgError, Result};
use crate::geometry::{Extent, StandardBinary};
use crate::ogc_sql::sql_delete_all;
use crate::schema::{Feature, FeatureRow, Table, materialize};
use crate::types::{Value, WriteOptions};
use rusqlite::params_from_iter;

use super::Gpkg;

#[derive(Debug)]
/// A feature table inside a GeoPackage.
pub struct GpkgLayer<'a> {
    pub(super) conn: &'a Gpkg,
    pub table: Table,
}

impl<'a> GpkgLayer<'a> {
    /// Read every feature in rowid order.
    ///
    /// Example:
    /// ```no_run
    /// use gpkg_persist::Gpkg;
    ///
    /// let gpkg = Gpkg::open_read_only("data/example.gpkg")?;
    /// let layer = gpkg.open_layer("points")?;
    /// for feature in layer.features()? {
    ///     let _id = feature.id();
    ///     let _geom = feature.geometry()?;
    /// }
    /// # Ok::<(), gpkg_persist::GpkgError>(())
    /// ```
    pub fn features(&self) -> Result<Vec<Feature>> {
        let sql = self.table.select_statement();
        let column_count = self.table.columns.len();

        let mut stmt = self.conn.connection().prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    values.push(Value::from(row.get_ref(idx)?));
                }
                let geometry: Option<Vec<u8>> = row.get(column_count)?;
                Ok((values, geometry))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut features = Vec::with_capacity(rows.len());
        for (values, geometry) in rows {
            let blob = geometry.ok_or(GpkgError::NullGeometryValue)?;
            let binary = StandardBinary::decode(&blob)?;

            let mut id = None;
            let mut properties = Vec::with_capacity(column_count);
            for (column, value) in self.table.columns.iter().zip(values) {
                if column.primary_key {
                    id = Some(value);
                } else {
                    properties.push((column.name.clone(), value));
                }
            }

            let mut feature = Feature::from_wkb(binary.wkb().to_vec(), properties)?;
            if let Some(id) = id.filter(|id| !id.is_null()) {
                feature = feature.with_id(id);
            }
            features.push(feature);
        }

        Ok(features)
    }

    /// Coerce `features` into the table's columns and insert them.
    pub fn insert_features(&self, features: &[Feature], options: &WriteOptions) -> Result<usize> {
        let rows = materialize(&self.table, features);
        self.insert_rows(&rows, options)
    }

    /// Insert materialized rows, committing every `options.batch_size` rows,
    /// and grow the extent recorded in `gpkg_contents`.
    pub fn insert_rows(&self, rows: &[FeatureRow], options: &WriteOptions) -> Result<usize> {
        self.ensure_writable()?;

        let sql = self.table.insert_statement();
        let batch_size = options.batch_size.max(1);
        let mut extent: Option<Extent> = None;
        let mut inserted = 0;

        for chunk in rows.chunks(batch_size) {
            let tx = self.conn.connection().unchecked_transaction()?;
            {
                let mut stmt = tx.prepare_cached(&sql)?;
                for row in chunk {
                    let binary = StandardBinary::from_wkb(self.table.srs_id, &row.geometry)?
                        .with_byte_order(options.byte_order);
                    if let Some(row_extent) = binary.extent() {
                        extent = Some(match extent {
                            Some(extent) => extent.merge(row_extent),
                            None => row_extent,
                        });
                    }

                    let geometry = Value::Blob(binary.encode());
                    let params = row.values.iter().chain(std::iter::once(&geometry));
                    stmt.execute(params_from_iter(params))?;
                }
            }
            tx.commit()?;
            inserted += chunk.len();
            log::debug!(
                "committed {} rows into {} ({inserted}/{})",
                chunk.len(),
                self.table.name,
                rows.len()
            );
        }

        if let Some(extent) = extent {
            self.conn.update_extent(&self.table.name, extent)?;
        }
        Ok(inserted)
    }

    /// Extent recorded in `gpkg_contents`.
    pub fn extent(&self) -> Result<Option<Extent>> {
        self.conn.extent(&self.table.name)
    }

    /// Remove all rows from the layer.
    ///
    /// Example:
    /// ```no_run
    /// use gpkg_persist::Gpkg;
    ///
    /// let gpkg = Gpkg::open("data/example.gpkg")?;
    /// let layer = gpkg.open_layer("points")?;
    /// layer.truncate()?;
    /// # Ok::<(), gpkg_persist::GpkgError>(())
    /// ```
    pub fn truncate(&self) -> Result<usize> {
        self.ensure_writable()?;
        let sql = sql_delete_all(&self.table.name);
        Ok(self.conn.connection().execute(&sql, [])?)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.conn.is_read_only() {
            return Err(GpkgError::ReadOnly);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Result;
    use crate::geometry::{ByteOrder, StandardBinary};
    use crate::gpkg::Gpkg;
    use crate::schema::{Feature, FeatureRow, build_table};
    use crate::types::{Value, WriteOptions};
    use geo_traits::GeometryTrait;
    use geo_types::{Geometry, LineString, MultiPoint, Point, Polygon};
    use std::str::FromStr;
    use wkb::reader::{GeometryType, Wkb};
    use wkt::Wkt;

    fn wkb_of<G: GeometryTrait<T = f64>>(geometry: &G) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        wkb::writer::write_geometry(&mut buf, geometry, &Default::default())?;
        Ok(buf)
    }

    fn assert_geometry_roundtrip(gpkg: &Gpkg, layer_name: &str, wkt: &str) -> Result<()> {
        let geometry: Geometry<f64> = Wkt::from_str(wkt)
            .expect("valid wkt")
            .try_into()
            .expect("convertible wkt");
        let expected = wkb_of(&geometry)?;

        let features = vec![Feature::from_wkb(expected.clone(), [("name", "a")])?];
        let table = build_table(layer_name, "geom", 4326, "GEOMETRY", &features);
        let layer = gpkg.create_table(table)?;
        layer.insert_features(&features, &WriteOptions::default())?;

        let stored = layer.features()?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].wkb(), expected.as_slice());
        assert_eq!(stored[0].property("name"), Some(&Value::from("a")));
        Ok(())
    }

    #[test]
    fn roundtrips_geometry_types() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        assert_geometry_roundtrip(&gpkg, "point", "POINT (1 2)")?;
        assert_geometry_roundtrip(&gpkg, "line", "LINESTRING (0 0, 1 1, 2 0)")?;
        assert_geometry_roundtrip(&gpkg, "poly", "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))")?;
        assert_geometry_roundtrip(&gpkg, "multi", "MULTIPOINT ((0 0), (1 1))")?;
        assert_geometry_roundtrip(
            &gpkg,
            "collection",
            "GEOMETRYCOLLECTION (POINT (1 1), LINESTRING (0 0, 2 2))",
        )?;
        Ok(())
    }

    #[test]
    fn stored_blobs_carry_header_and_envelope() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let line = LineString::from(vec![(0.0, 0.0), (3.0, -2.0)]);
        let features = vec![Feature::new(&line, Vec::<(String, Value)>::new())?.with_id(1)];
        let table = build_table("lines", "geom", 4326, "LINESTRING", &features);
        let layer = gpkg.create_table(table)?;
        let options = WriteOptions {
            byte_order: ByteOrder::BigEndian,
            ..Default::default()
        };
        layer.insert_features(&features, &options)?;

        let blob: Vec<u8> =
            gpkg.connection()
                .query_row(r#"SELECT "geom" FROM "lines""#, [], |row| row.get(0))?;
        assert_eq!(&blob[..2], b"GP");
        let binary = StandardBinary::decode(&blob)?;
        assert_eq!(binary.srs_id(), 4326);
        assert_eq!(binary.header().byte_order(), ByteOrder::BigEndian);
        assert_eq!(binary.header().envelope(), &[0.0, 3.0, -2.0, 0.0]);
        assert_eq!(
            Wkb::try_new(binary.wkb())?.geometry_type(),
            GeometryType::LineString
        );
        Ok(())
    }

    #[test]
    fn insert_rows_commits_in_batches() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let features: Vec<Feature> = (0..7)
            .map(|i| {
                Feature::new(&Point::new(i as f64, 0.0), [("n", Value::from(i))])
                    .map(|f| f.with_id(i))
            })
            .collect::<Result<_>>()?;
        let table = build_table("pts", "geom", 4326, "POINT", &features);
        let layer = gpkg.create_table(table)?;

        let options = WriteOptions {
            batch_size: 3,
            ..Default::default()
        };
        assert_eq!(layer.insert_features(&features, &options)?, 7);

        let ids: Vec<Value> = layer
            .features()?
            .iter()
            .filter_map(|f| f.id().cloned())
            .collect();
        assert_eq!(ids, (0..7).map(Value::Integer).collect::<Vec<_>>());

        let extent = layer.extent()?.expect("extent");
        assert_eq!((extent.minx, extent.maxx), (0.0, 6.0));
        Ok(())
    }

    #[test]
    fn failing_row_rolls_back_its_batch() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let features = vec![Feature::new(&Point::new(0.0, 0.0), [("n", 1)])?.with_id(1)];
        let table = build_table("pts", "geom", 4326, "POINT", &features);
        let layer = gpkg.create_table(table)?;

        let point = wkb_of(&Point::new(1.0, 1.0))?;
        let rows = vec![
            FeatureRow {
                geometry: point.clone(),
                values: vec![Value::Integer(1), Value::Integer(10)],
            },
            FeatureRow {
                geometry: point.clone(),
                values: vec![Value::Integer(2), Value::Integer(20)],
            },
            // duplicate primary key
            FeatureRow {
                geometry: point,
                values: vec![Value::Integer(2), Value::Integer(30)],
            },
        ];
        let options = WriteOptions {
            batch_size: 2,
            ..Default::default()
        };
        assert!(layer.insert_rows(&rows, &options).is_err());
        assert_eq!(layer.features()?.len(), 2);
        Ok(())
    }

    #[test]
    fn truncate_removes_rows() -> Result<()> {
        let gpkg = Gpkg::new_in_memory()?;
        let features = vec![
            Feature::new(&MultiPoint::from(vec![(0.0, 0.0), (1.0, 1.0)]), [("k", "v")])?,
            Feature::new(
                &Polygon::new(
                    LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
                    vec![],
                ),
                [("k", "w")],
            )?,
        ];
        let layer = gpkg.store_features(
            "mixed",
            "geom",
            4326,
            "GEOMETRY",
            &features,
            &WriteOptions::default(),
        )?;
        assert_eq!(layer.truncate()?, 2);
        assert!(layer.features()?.is_empty());
        Ok(())
    }
}
