//! Built-in spatial reference system definitions.
//!
//! The table is read-only reference data used to fill
//! `gpkg_spatial_ref_sys` when a table refers to an SRS the package does not
//! know yet.

/// A row of `gpkg_spatial_ref_sys`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpatialRefSys {
    pub name: &'static str,
    pub srs_id: i32,
    pub organization: &'static str,
    pub organization_coordsys_id: i32,
    pub definition: &'static str,
    pub description: &'static str,
}

impl SpatialRefSys {
    /// Authority code such as `EPSG:4326`, or `None` for undefined systems.
    pub fn code(&self) -> Option<String> {
        authority_code(self.organization, self.organization_coordsys_id)
    }
}

pub(crate) fn authority_code(organization: &str, organization_coordsys_id: i32) -> Option<String> {
    if organization.eq_ignore_ascii_case("NONE") {
        return None;
    }
    Some(format!(
        "{}:{}",
        organization.to_ascii_uppercase(),
        organization_coordsys_id
    ))
}

const EPSG4326_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

const EPSG3857_WKT: &str = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],EXTENSION["PROJ4","+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs"],AUTHORITY["EPSG","3857"]]"#;

const EPSG900913_WKT: &str = r#"PROJCS["Google Maps Global Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.01745329251994328,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_2SP"],PARAMETER["standard_parallel_1",0],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",0],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["Meter",1],EXTENSION["PROJ4","+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs"],AUTHORITY["EPSG","900913"]]"#;

pub const DEFAULT_SPATIAL_REF_SYS: &[SpatialRefSys] = &[
    SpatialRefSys {
        name: "Undefined geographic SRS",
        srs_id: 0,
        organization: "NONE",
        organization_coordsys_id: 0,
        definition: "undefined",
        description: "undefined geographic coordinate reference system",
    },
    SpatialRefSys {
        name: "Undefined Cartesian SRS",
        srs_id: -1,
        organization: "NONE",
        organization_coordsys_id: -1,
        definition: "undefined",
        description: "undefined Cartesian coordinate reference system",
    },
    SpatialRefSys {
        name: "WGS 84",
        srs_id: 4326,
        organization: "EPSG",
        organization_coordsys_id: 4326,
        definition: EPSG4326_WKT,
        description: "WGS 84",
    },
    SpatialRefSys {
        name: "WGS 84 / Pseudo-Mercator",
        srs_id: 3857,
        organization: "EPSG",
        organization_coordsys_id: 3857,
        definition: EPSG3857_WKT,
        description: "Web Mercator / Pseudo-Mercator (EPSG:3857)",
    },
    SpatialRefSys {
        name: "Google Maps Global Mercator",
        srs_id: 900913,
        organization: "EPSG",
        organization_coordsys_id: 900913,
        definition: EPSG900913_WKT,
        description: "Google Maps Global Mercator",
    },
];

/// Look up a built-in definition.
pub fn default_srs(srs_id: i32) -> Option<&'static SpatialRefSys> {
    DEFAULT_SPATIAL_REF_SYS.iter().find(|srs| srs.srs_id == srs_id)
}

#[cfg(test)]
mod tests {
    use super::default_srs;

    #[test]
    fn finds_builtin_definitions() {
        let srs = default_srs(3857).expect("3857");
        assert_eq!(srs.name, "WGS 84 / Pseudo-Mercator");
        assert_eq!(srs.code().as_deref(), Some("EPSG:3857"));
        assert!(srs.definition.contains(r#"AUTHORITY["EPSG","3857"]"#));

        assert_eq!(default_srs(-1).and_then(|srs| srs.code()), None);
        assert!(default_srs(2154).is_none());
    }
}
