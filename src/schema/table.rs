use super::Feature;
use super::coerce::{coerce, infer_attribute_type, infer_identity_type};
use crate::conversions::column_type_to_str;
use crate::ogc_sql::{quote_ident, sql_create_table, sql_insert_feature, sql_select_columns};
use crate::types::{ColumnSpec, ColumnType, SchemaPolicy, Value};
use std::collections::HashMap;

/// Name of the identity column of synthesized tables.
pub const ID_COLUMN: &str = "id";

/// A feature table: ordered attribute columns plus one geometry column.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub name: String,
    /// Columns other than the geometry column, in storage order.
    pub columns: Vec<ColumnSpec>,
    pub geometry_column: String,
    /// Geometry type name as registered in `gpkg_geometry_columns`, e.g. `POINT`.
    pub geometry_type: String,
    pub srs_id: i32,
}

/// One materialized record. `values` follows the table's column order; the
/// geometry is bound last.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRow {
    pub geometry: Vec<u8>,
    pub values: Vec<Value>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn identity_column(&self) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// `CREATE TABLE IF NOT EXISTS` with every column and a trailing
    /// `NOT NULL` geometry column.
    pub fn create_statement(&self) -> String {
        let mut column_defs = Vec::with_capacity(self.columns.len() + 1);
        for spec in &self.columns {
            let mut def = format!(
                "{} {}",
                quote_ident(&spec.name),
                column_type_to_str(spec.column_type)
            );
            if spec.not_null {
                def.push_str(" NOT NULL");
            }
            if spec.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            column_defs.push(def);
        }
        column_defs.push(format!("{} BLOB NOT NULL", quote_ident(&self.geometry_column)));

        sql_create_table(&self.name, &column_defs.join(", "))
    }

    /// `INSERT` with one placeholder per column, the geometry placeholder last.
    pub fn insert_statement(&self) -> String {
        let columns = self.storage_columns();
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<String>>()
            .join(",");

        sql_insert_feature(&self.name, &columns.join(","), &placeholders)
    }

    /// `SELECT` of every column, the geometry column last.
    pub fn select_statement(&self) -> String {
        sql_select_columns(&self.name, &self.storage_columns().join(","))
    }

    fn storage_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|spec| spec.name.as_str())
            .chain(std::iter::once(self.geometry_column.as_str()))
            .map(quote_ident)
            .collect()
    }
}

struct Slot {
    spec: ColumnSpec,
    // false while only nulls have been seen
    settled: bool,
}

/// Derives a column set from a batch of features.
///
/// The geometry column and [`ID_COLUMN`] are reserved: attributes with
/// either name are left out of the schema and never stored.
pub struct SchemaBuilder {
    policy: SchemaPolicy,
    geometry_column: String,
    slots: Vec<Slot>,
    index_by_name: HashMap<String, usize>,
}

impl SchemaBuilder {
    pub fn new(geometry_column: &str, policy: SchemaPolicy) -> Self {
        Self {
            policy,
            geometry_column: geometry_column.to_string(),
            slots: Vec::new(),
            index_by_name: HashMap::new(),
        }
    }

    /// Record the identity and attributes of one feature.
    pub fn observe(&mut self, feature: &Feature) {
        if let Some(id) = feature.id() {
            self.observe_identity(id);
        }
        for (name, value) in feature.properties() {
            if self.is_reserved(name) {
                log::debug!("skipping attribute {name:?}: name is reserved");
                continue;
            }
            self.observe_attribute(name, value);
        }
    }

    fn is_reserved(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(ID_COLUMN) || name.eq_ignore_ascii_case(&self.geometry_column)
    }

    fn observe_identity(&mut self, id: &Value) {
        if self.index_by_name.contains_key(ID_COLUMN) {
            // the identity column never changes type; values are coerced
            return;
        }
        match infer_identity_type(id) {
            Some(column_type) => {
                self.push(ColumnSpec::primary_key(ID_COLUMN, column_type), true);
            }
            None => {
                log::debug!("ignoring feature id of unsupported type {}", id.kind());
            }
        }
    }

    fn observe_attribute(&mut self, name: &str, value: &Value) {
        let inferred = infer_attribute_type(value);
        let existing = self.index_by_name.get(name).copied();
        let Some(idx) = existing else {
            let column_type = inferred.unwrap_or(ColumnType::Text);
            self.push(ColumnSpec::new(name, column_type), inferred.is_some());
            return;
        };

        let Some(inferred) = inferred else {
            return;
        };
        let slot = &mut self.slots[idx];
        if !slot.settled {
            slot.spec.column_type = inferred;
            slot.settled = true;
            return;
        }
        if slot.spec.column_type == inferred || slot.spec.primary_key {
            return;
        }

        match self.policy {
            SchemaPolicy::FirstWins => {
                log::debug!(
                    "column {name:?} stays {:?}; {} value will be coerced",
                    slot.spec.column_type,
                    value.kind()
                );
            }
            SchemaPolicy::WidestType => {
                let widened = widen(slot.spec.column_type, inferred);
                log::debug!(
                    "column {name:?} widened from {:?} to {widened:?}",
                    slot.spec.column_type
                );
                slot.spec.column_type = widened;
            }
        }
    }

    fn push(&mut self, spec: ColumnSpec, settled: bool) {
        self.index_by_name.insert(spec.name.clone(), self.slots.len());
        self.slots.push(Slot { spec, settled });
    }

    /// Columns in order of first appearance.
    pub fn finish(self) -> Vec<ColumnSpec> {
        self.slots.into_iter().map(|slot| slot.spec).collect()
    }
}

fn widen(current: ColumnType, incoming: ColumnType) -> ColumnType {
    use ColumnType::*;
    match (current, incoming) {
        (a, b) if a == b => a,
        (Integer, Real) | (Real, Integer) => Real,
        (Blob, _) | (_, Blob) => Blob,
        _ => Text,
    }
}

/// Synthesize a table from features with [`SchemaPolicy::FirstWins`].
pub fn build_table(
    name: &str,
    geometry_column: &str,
    srs_id: i32,
    geometry_type: &str,
    features: &[Feature],
) -> Table {
    build_table_with_policy(
        name,
        geometry_column,
        srs_id,
        geometry_type,
        features,
        SchemaPolicy::FirstWins,
    )
}

pub fn build_table_with_policy(
    name: &str,
    geometry_column: &str,
    srs_id: i32,
    geometry_type: &str,
    features: &[Feature],
    policy: SchemaPolicy,
) -> Table {
    let mut builder = SchemaBuilder::new(geometry_column, policy);
    for feature in features {
        builder.observe(feature);
    }

    Table {
        name: name.to_string(),
        columns: builder.finish(),
        geometry_column: geometry_column.to_string(),
        geometry_type: geometry_type.to_string(),
        srs_id,
    }
}

/// Coerce every feature to the table's columns.
///
/// The primary key column takes the feature id; other columns take the
/// property of the same name or `Null` when absent.
pub fn materialize(table: &Table, features: &[Feature]) -> Vec<FeatureRow> {
    features
        .iter()
        .map(|feature| {
            let values = table
                .columns
                .iter()
                .map(|column| {
                    let value = if column.primary_key {
                        feature.id()
                    } else {
                        feature.property(&column.name)
                    };
                    match value {
                        Some(value) => coerce(value, column.column_type),
                        None => Value::Null,
                    }
                })
                .collect();

            FeatureRow {
                geometry: feature.wkb().to_vec(),
                values,
            }
        })
        .collect()
}
