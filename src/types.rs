use crate::geometry::ByteOrder;
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

/// Storage type of a feature table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// `VARCHAR(255)`, only used for string identity columns.
    Varchar,
    Integer,
    Real,
    Blob,
    Text,
}

/// A column of a feature table. Two columns are the same iff all four
/// fields match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
}

impl ColumnSpec {
    /// A nullable, non-key attribute column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            primary_key: false,
        }
    }

    /// A `NOT NULL PRIMARY KEY` identity column.
    pub fn primary_key(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: true,
            primary_key: true,
        }
    }
}

/// How a column's type is settled when records disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// The first record introducing a name fixes its type; later values are
    /// coerced into it, possibly losing precision.
    #[default]
    FirstWins,
    /// Conflicting attribute types are promoted to a type that holds both
    /// (Integer and Real become Real, anything with Text becomes Text,
    /// anything with Blob becomes Blob).
    WidestType,
}

/// Options for writing feature batches.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Rows committed per transaction.
    pub batch_size: usize,
    pub schema_policy: SchemaPolicy,
    /// Byte order of the geometry headers written.
    pub byte_order: ByteOrder,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            batch_size: 20,
            schema_policy: SchemaPolicy::FirstWins,
            byte_order: ByteOrder::LittleEndian,
        }
    }
}

/// Owned dynamic value of a feature identity or property.
///
/// The set of kinds is closed; anything without a dedicated variant is
/// carried as JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
    Integer(i64),
    UnsignedInteger(u64),
    Real(f64),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::UnsignedInteger(_) => "unsigned integer",
            Value::Real(_) => "real",
            Value::Json(_) => "json",
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Blob(v.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::Bool(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*v))),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::UnsignedInteger(v) => match i64::try_from(*v) {
                Ok(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(v)),
                Err(_) => ToSqlOutput::Owned(rusqlite::types::Value::Text(v.to_string())),
            },
            Value::Real(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::Json(v) => ToSqlOutput::Owned(rusqlite::types::Value::Text(v.to_string())),
        };
        Ok(output)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Integer(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::UnsignedInteger(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::UnsignedInteger(value as u64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use rusqlite::Connection;

    #[test]
    fn widens_native_numbers() {
        assert_eq!(Value::from(7_i8), Value::Integer(7));
        assert_eq!(Value::from(7_u16), Value::UnsignedInteger(7));
        assert_eq!(Value::from(1.5_f32), Value::Real(1.5));
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".to_string()));
    }

    #[test]
    fn binds_to_sqlite() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        let (b, big, json): (i64, String, String) = conn.query_row(
            "SELECT ?1, ?2, ?3",
            [
                Value::Bool(true),
                Value::UnsignedInteger(u64::MAX),
                Value::Json(serde_json::json!({"a": 1})),
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        assert_eq!(b, 1);
        assert_eq!(big, u64::MAX.to_string());
        assert_eq!(json, r#"{"a":1}"#);
        Ok(())
    }
}
