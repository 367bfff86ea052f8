use crate::types::ColumnType;

#[inline]
pub(crate) fn column_type_to_str(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Varchar => "VARCHAR(255)",
        ColumnType::Integer => "INTEGER",
        ColumnType::Real => "REAL",
        ColumnType::Blob => "BLOB",
        ColumnType::Text => "TEXT",
    }
}

/// Map a SQLite declared type to a column type.
// cf. https://www.geopackage.org/spec140/index.html#_sqlite_container
#[inline]
pub(crate) fn column_type_from_str(column_type_str: &str) -> Option<ColumnType> {
    let s = column_type_str.trim();
    let base = s.split('(').next().unwrap_or(s).trim();

    if base.eq_ignore_ascii_case("VARCHAR") {
        Some(ColumnType::Varchar)
    } else if base.eq_ignore_ascii_case("TINYINT")
        || base.eq_ignore_ascii_case("SMALLINT")
        || base.eq_ignore_ascii_case("MEDIUMINT")
        || base.eq_ignore_ascii_case("INT")
        || base.eq_ignore_ascii_case("INTEGER")
        || base.eq_ignore_ascii_case("BOOLEAN")
    {
        Some(ColumnType::Integer)
    } else if base.eq_ignore_ascii_case("DOUBLE")
        || base.eq_ignore_ascii_case("FLOAT")
        || base.eq_ignore_ascii_case("REAL")
    {
        Some(ColumnType::Real)
    } else if base.eq_ignore_ascii_case("TEXT")
        || base.eq_ignore_ascii_case("DATE")
        || base.eq_ignore_ascii_case("DATETIME")
    {
        Some(ColumnType::Text)
    } else if base.eq_ignore_ascii_case("BLOB") {
        Some(ColumnType::Blob)
    } else {
        None
    }
}

/// Whether a declared type names a geometry column.
// cf. https://www.geopackage.org/spec140/index.html#geometry_types
#[inline]
pub(crate) fn is_geometry_type_name(s: &str) -> bool {
    [
        "GEOMETRY",
        "POINT",
        "LINESTRING",
        "POLYGON",
        "MULTIPOINT",
        "MULTILINESTRING",
        "MULTIPOLYGON",
        "GEOMETRYCOLLECTION",
    ]
    .iter()
    .any(|name| s.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::{column_type_from_str, column_type_to_str, is_geometry_type_name};
    use crate::types::ColumnType;

    #[test]
    fn declared_types_roundtrip() {
        for column_type in [
            ColumnType::Varchar,
            ColumnType::Integer,
            ColumnType::Real,
            ColumnType::Blob,
            ColumnType::Text,
        ] {
            assert_eq!(
                column_type_from_str(column_type_to_str(column_type)),
                Some(column_type)
            );
        }
    }

    #[test]
    fn maps_sqlite_aliases() {
        assert_eq!(column_type_from_str("varchar(32)"), Some(ColumnType::Varchar));
        assert_eq!(column_type_from_str("BOOLEAN"), Some(ColumnType::Integer));
        assert_eq!(column_type_from_str("double"), Some(ColumnType::Real));
        assert_eq!(column_type_from_str("DATETIME"), Some(ColumnType::Text));
        assert_eq!(column_type_from_str("POINT"), None);
        assert!(is_geometry_type_name("MultiPolygon"));
        assert!(!is_geometry_type_name("TEXT"));
    }
}
