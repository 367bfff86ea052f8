use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, LineStringTrait, LineTrait,
    MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
    RectTrait, TriangleTrait,
};

/// Axis-aligned 2D bounding box of a geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    /// Envelope values in the order the binary header stores them.
    pub fn to_envelope(self) -> Vec<f64> {
        vec![self.minx, self.maxx, self.miny, self.maxy]
    }

    /// Read the XY part of a header envelope.
    pub fn from_envelope(envelope: &[f64]) -> Option<Self> {
        match envelope {
            [minx, maxx, miny, maxy, ..] => Some(Self {
                minx: *minx,
                miny: *miny,
                maxx: *maxx,
                maxy: *maxy,
            }),
            _ => None,
        }
    }

    pub fn merge(self, other: Extent) -> Self {
        Self {
            minx: self.minx.min(other.minx),
            miny: self.miny.min(other.miny),
            maxx: self.maxx.max(other.maxx),
            maxy: self.maxy.max(other.maxy),
        }
    }
}

/// Compute the bounding box; `None` means the geometry is empty.
pub fn bounding_box<G: GeometryTrait<T = f64>>(geom: &G) -> Option<Extent> {
    use geo_traits::GeometryType as GeoType;

    let mut bounds: Option<Extent> = None;
    match geom.as_type() {
        GeoType::Point(point) => {
            if let Some(coord) = point.coord() {
                add_coord(&mut bounds, &coord);
            }
        }
        GeoType::LineString(line) => add_line_string(&mut bounds, line),
        GeoType::Polygon(poly) => add_polygon(&mut bounds, poly),
        GeoType::MultiPoint(multi) => {
            for point in multi.points() {
                if let Some(coord) = point.coord() {
                    add_coord(&mut bounds, &coord);
                }
            }
        }
        GeoType::MultiLineString(multi) => {
            for line in multi.line_strings() {
                add_line_string(&mut bounds, &line);
            }
        }
        GeoType::MultiPolygon(multi) => {
            for poly in multi.polygons() {
                add_polygon(&mut bounds, &poly);
            }
        }
        GeoType::GeometryCollection(collection) => {
            for sub_geom in collection.geometries() {
                if let Some(sub_bounds) = bounding_box(&sub_geom) {
                    merge_bounds(&mut bounds, sub_bounds);
                }
            }
        }
        GeoType::Rect(rect) => {
            add_coord(&mut bounds, &rect.min());
            add_coord(&mut bounds, &rect.max());
        }
        GeoType::Triangle(triangle) => {
            for coord in triangle.coords() {
                add_coord(&mut bounds, &coord);
            }
        }
        GeoType::Line(line) => {
            for coord in line.coords() {
                add_coord(&mut bounds, &coord);
            }
        }
    }

    bounds
}

pub fn is_empty<G: GeometryTrait<T = f64>>(geom: &G) -> bool {
    bounding_box(geom).is_none()
}

fn add_polygon<P: PolygonTrait<T = f64>>(bounds: &mut Option<Extent>, poly: &P) {
    if let Some(ring) = poly.exterior() {
        add_line_string(bounds, &ring);
    }
    for ring in poly.interiors() {
        add_line_string(bounds, &ring);
    }
}

fn add_line_string<L: LineStringTrait<T = f64>>(bounds: &mut Option<Extent>, line: &L) {
    for coord in line.coords() {
        add_coord(bounds, &coord);
    }
}

fn add_coord<C: CoordTrait<T = f64>>(bounds: &mut Option<Extent>, coord: &C) {
    let (x, y) = coord.x_y();
    let point = Extent {
        minx: x,
        miny: y,
        maxx: x,
        maxy: y,
    };
    merge_bounds(bounds, point);
}

fn merge_bounds(bounds: &mut Option<Extent>, other: Extent) {
    *bounds = Some(match bounds {
        Some(existing) => existing.merge(other),
        None => other,
    });
}

#[cfg(test)]
mod tests {
    use super::{Extent, bounding_box};
    use geo_types::{Geometry, GeometryCollection, LineString, MultiPoint, Point, Polygon};

    #[test]
    fn point_bounds() {
        let extent = bounding_box(&Point::new(1.5, -2.0)).expect("bounds");
        assert_eq!(
            extent,
            Extent {
                minx: 1.5,
                miny: -2.0,
                maxx: 1.5,
                maxy: -2.0
            }
        );
    }

    #[test]
    fn empty_line_has_no_bounds() {
        let line: LineString<f64> = LineString::new(Vec::new());
        assert!(bounding_box(&line).is_none());
    }

    #[test]
    fn line_and_polygon_bounds() {
        let line = LineString::from(vec![(0.0, 1.0), (-3.0, 2.5), (4.0, -1.0)]);
        assert_eq!(
            bounding_box(&line).map(Extent::to_envelope),
            Some(vec![-3.0, 4.0, -1.0, 2.5])
        );

        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (6.0, 0.0), (6.0, 5.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)])],
        );
        assert_eq!(
            bounding_box(&polygon).map(Extent::to_envelope),
            Some(vec![0.0, 6.0, 0.0, 5.0])
        );
    }

    #[test]
    fn multipoint_bounds() {
        let mp = MultiPoint::from(vec![Point::new(1.0, 5.0), Point::new(-2.0, 3.0)]);
        let extent = bounding_box(&mp).expect("bounds");
        assert_eq!(extent.to_envelope(), vec![-2.0, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn collection_bounds() {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]),
            vec![],
        );
        let collection = GeometryCollection::from(vec![
            Geometry::Point(Point::new(5.0, -1.0)),
            Geometry::LineString(LineString::from(vec![(-2.0, 2.0), (1.0, 3.0)])),
            Geometry::Polygon(polygon),
        ]);
        let extent = bounding_box(&collection).expect("bounds");
        assert_eq!(extent.minx, -2.0);
        assert_eq!(extent.maxx, 5.0);
        assert_eq!(extent.miny, -1.0);
        assert_eq!(extent.maxy, 4.0);
    }

    #[test]
    fn envelope_order_roundtrips() {
        let extent = Extent {
            minx: 1.0,
            miny: 2.0,
            maxx: 3.0,
            maxy: 4.0,
        };
        assert_eq!(Extent::from_envelope(&extent.to_envelope()), Some(extent));
        assert_eq!(Extent::from_envelope(&[]), None);
    }
}
