use crate::types::{ColumnType, Value};

/// Column type a value would get if it introduced an attribute column.
/// `None` for `Null`, which does not settle a type.
pub fn infer_attribute_type(value: &Value) -> Option<ColumnType> {
    match value {
        Value::Null => None,
        Value::Text(_) => Some(ColumnType::Text),
        Value::Blob(_) => Some(ColumnType::Blob),
        Value::Bool(_) | Value::Integer(_) | Value::UnsignedInteger(_) => {
            Some(ColumnType::Integer)
        }
        Value::Real(_) => Some(ColumnType::Real),
        Value::Json(_) => Some(ColumnType::Text),
    }
}

/// Column type of an identity column introduced by `value`. Only strings and
/// numbers can identify a feature.
pub fn infer_identity_type(value: &Value) -> Option<ColumnType> {
    match value {
        Value::Text(_) => Some(ColumnType::Varchar),
        Value::Integer(_) | Value::UnsignedInteger(_) | Value::Real(_) => {
            Some(ColumnType::Integer)
        }
        Value::Null | Value::Blob(_) | Value::Bool(_) | Value::Json(_) => None,
    }
}

/// Convert `value` so it can be stored in a column of type `target`.
///
/// Never fails: unparsable strings become zero, and combinations without a
/// conversion become `Null`.
pub fn coerce(value: &Value, target: ColumnType) -> Value {
    match target {
        ColumnType::Varchar | ColumnType::Text => coerce_text(value),
        ColumnType::Integer => coerce_integer(value),
        ColumnType::Real => coerce_real(value),
        ColumnType::Blob => coerce_blob(value),
    }
}

fn coerce_text(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Text(v) => Value::Text(v.clone()),
        Value::Blob(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        Value::Integer(v) => Value::Text(v.to_string()),
        Value::UnsignedInteger(v) => Value::Text(v.to_string()),
        Value::Bool(_) | Value::Real(_) | Value::Json(_) => Value::Text(to_json(value).to_string()),
    }
}

fn coerce_integer(value: &Value) -> Value {
    match value {
        Value::Text(v) => Value::Integer(v.trim().parse::<i64>().unwrap_or_else(|_| {
            log::debug!("cannot parse {v:?} as integer, storing 0");
            0
        })),
        Value::Bool(v) => Value::Bool(*v),
        Value::Integer(v) => Value::Integer(*v),
        Value::UnsignedInteger(v) => Value::UnsignedInteger(*v),
        // `as` truncates toward zero and saturates; NaN becomes 0
        Value::Real(v) => Value::Integer(*v as i64),
        Value::Null | Value::Blob(_) | Value::Json(_) => Value::Null,
    }
}

fn coerce_real(value: &Value) -> Value {
    match value {
        Value::Text(v) => Value::Real(v.trim().parse::<f64>().unwrap_or_else(|_| {
            log::debug!("cannot parse {v:?} as real, storing 0.0");
            0.0
        })),
        Value::Integer(v) => Value::Real(*v as f64),
        Value::UnsignedInteger(v) => Value::Real(*v as f64),
        Value::Real(v) => Value::Real(*v),
        Value::Null | Value::Blob(_) | Value::Bool(_) | Value::Json(_) => Value::Null,
    }
}

fn coerce_blob(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Text(v) => Value::Blob(v.as_bytes().to_vec()),
        Value::Blob(v) => Value::Blob(v.clone()),
        Value::Integer(v) => Value::Blob(v.to_string().into_bytes()),
        Value::UnsignedInteger(v) => Value::Blob(v.to_string().into_bytes()),
        Value::Bool(_) | Value::Real(_) | Value::Json(_) => {
            Value::Blob(to_json(value).to_string().into_bytes())
        }
    }
}

/// JSON form used when a value has no natural text representation.
pub(crate) fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Text(v) => serde_json::Value::from(v.as_str()),
        Value::Blob(v) => serde_json::Value::from(v.as_slice()),
        Value::Bool(v) => serde_json::Value::from(*v),
        Value::Integer(v) => serde_json::Value::from(*v),
        Value::UnsignedInteger(v) => serde_json::Value::from(*v),
        // non-finite numbers serialize as null
        Value::Real(v) => serde_json::Value::from(*v),
        Value::Json(v) => v.clone(),
    }
}
