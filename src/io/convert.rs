//! Conversions between `shapefile` polygon records and `geo` types.
//!
//! Shapefiles store a polygon as a flat ring list: each outer ring is
//! followed by its holes, with winding (CW outer, CCW inner) encoding the
//! role.  `geo` wants explicit exterior/hole grouping and does not care
//! about winding, so conversion is mostly regrouping plus winding repair.

use geo::winding_order::Winding;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile as shp;

/// Regroup a shapefile polygon's ring list into a `geo::MultiPolygon`.
/// Holes that precede any outer ring are dropped.
pub(crate) fn multi_polygon_from_shp(polygon: &shp::Polygon) -> MultiPolygon<f64> {
    let mut parts: Vec<Polygon<f64>> = Vec::new();
    for ring in polygon.rings() {
        let chain = closed_ring(ring.points());
        match ring {
            shp::PolygonRing::Outer(_) => parts.push(Polygon::new(chain, Vec::new())),
            shp::PolygonRing::Inner(_) => {
                if let Some(current) = parts.last_mut() {
                    current.interiors_push(chain);
                }
            }
        }
    }
    MultiPolygon::new(parts)
}

/// Flatten a `geo::MultiPolygon` into the shapefile ring list, restoring
/// the shapefile winding conventions.
pub(crate) fn multi_polygon_to_shp(shape: &MultiPolygon<f64>) -> shp::Polygon {
    let mut rings = Vec::new();
    for polygon in &shape.0 {
        let mut outer = polygon.exterior().clone();
        outer.make_cw_winding();
        rings.push(shp::PolygonRing::Outer(ring_points(&outer)));
        for hole in polygon.interiors() {
            let mut inner = hole.clone();
            inner.make_ccw_winding();
            rings.push(shp::PolygonRing::Inner(ring_points(&inner)));
        }
    }
    shp::Polygon::with_rings(rings)
}

/// A multi-line-string as shapefile polyline parts.
pub(crate) fn lines_to_shp(lines: &geo::MultiLineString<f64>) -> shp::Polyline {
    let parts: Vec<Vec<shp::Point>> = lines
        .0
        .iter()
        .map(|chain| chain.coords().map(|c| shp::Point::new(c.x, c.y)).collect())
        .collect();
    shp::Polyline::with_parts(parts)
}

/// Build a closed `LineString` from shapefile ring points.
fn closed_ring(points: &[shp::Point]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> =
        points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

/// Closed ring coordinates as shapefile points.
fn ring_points(ring: &LineString<f64>) -> Vec<shp::Point> {
    let mut points: Vec<shp::Point> =
        ring.coords().map(|c| shp::Point::new(c.x, c.y)).collect();
    if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
        if first.x != last.x || first.y != last.y {
            points.push(first);
        }
    }
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
