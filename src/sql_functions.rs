use crate::error::Result;
use crate::geometry::{BinaryHeader, Extent, StandardBinary};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Error};

/// Register all spatial SQL helper functions in the provided connection.
///
/// The bounds come from the envelope in the geometry header when one is
/// stored; otherwise the WKB payload is walked.
///
/// Example:
/// ```no_run
/// use rusqlite::Connection;
/// use gpkg_persist::register_spatial_functions;
///
/// let conn = Connection::open_in_memory()?;
/// register_spatial_functions(&conn)?;
/// # Ok::<(), gpkg_persist::GpkgError>(())
/// ```
pub fn register_spatial_functions(conn: &Connection) -> Result<()> {
    register_extent_component(conn, "ST_MinX", |e| e.minx)?;
    register_extent_component(conn, "ST_MinY", |e| e.miny)?;
    register_extent_component(conn, "ST_MaxX", |e| e.maxx)?;
    register_extent_component(conn, "ST_MaxY", |e| e.maxy)?;
    register_st_isempty(conn)?;
    Ok(())
}

fn register_st_isempty(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "ST_IsEmpty",
        1,
        FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let blob = match blob_from_ctx(ctx)? {
                Some(blob) => blob,
                None => return Ok(None),
            };
            let is_empty = extent_from_blob(blob)
                .map_err(|err| Error::UserFunctionError(Box::new(err)))?
                .is_none();
            Ok(Some(i64::from(is_empty)))
        },
    )?;
    Ok(())
}

fn register_extent_component<F>(conn: &Connection, name: &str, f: F) -> Result<()>
where
    F: Fn(Extent) -> f64 + Copy + Send + Sync + 'static,
{
    conn.create_scalar_function(name, 1, FunctionFlags::SQLITE_DETERMINISTIC, move |ctx| {
        let blob = match blob_from_ctx(ctx)? {
            Some(blob) => blob,
            None => return Ok(None),
        };
        let extent =
            extent_from_blob(blob).map_err(|err| Error::UserFunctionError(Box::new(err)))?;
        Ok(extent.map(f))
    })?;
    Ok(())
}

fn blob_from_ctx<'a>(ctx: &'a Context<'a>) -> std::result::Result<Option<&'a [u8]>, Error> {
    match ctx.get_raw(0) {
        ValueRef::Null => Ok(None),
        ValueRef::Blob(blob) => Ok(Some(blob)),
        _ => Err(Error::InvalidFunctionParameterType(0, Type::Blob)),
    }
}

// `None` means the geometry is empty.
fn extent_from_blob(blob: &[u8]) -> Result<Option<Extent>> {
    let header = BinaryHeader::decode(blob)?.into_result()?;
    if header.is_empty() {
        return Ok(None);
    }
    if let Some(extent) = Extent::from_envelope(header.envelope())
        && !extent.minx.is_nan()
    {
        return Ok(Some(extent));
    }
    Ok(StandardBinary::decode(blob)?.extent())
}
