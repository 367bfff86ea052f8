//! Dynamic schema derivation for feature batches.
//!
//! [`build_table`] scans features and fixes one column type per attribute
//! name; [`materialize`] coerces every feature into that column set.

mod coerce;
mod feature;
mod table;

pub use coerce::{coerce, infer_attribute_type, infer_identity_type};
pub use feature::Feature;
pub use table::{
    FeatureRow, ID_COLUMN, SchemaBuilder, Table, build_table, build_table_with_policy,
    materialize,
};
