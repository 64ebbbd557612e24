use shapefile as shp;

/// Convert a shapefile shape to geo::MultiPolygon<f64>.
/// Returns `None` for null shapes and non-areal shapes (points, lines).
pub(crate) fn shape_to_multipolygon(shape: &shp::Shape) -> Option<geo::MultiPolygon<f64>> {
    match shape {
        shp::Shape::Polygon(p) => Some(rings_to_geo(p.rings(), |pt| geo::Coord { x: pt.x, y: pt.y })),
        shp::Shape::PolygonM(p) => Some(rings_to_geo(p.rings(), |pt| geo::Coord { x: pt.x, y: pt.y })),
        shp::Shape::PolygonZ(p) => Some(rings_to_geo(p.rings(), |pt| geo::Coord { x: pt.x, y: pt.y })),
        _ => None,
    }
}

/// Convert shapefile polygon rings to geo::MultiPolygon<f64>.
/// Shapefiles store each exterior ring followed by its holes.
fn rings_to_geo<P>(rings: &[shp::PolygonRing<P>], to_coord: impl Fn(&P) -> geo::Coord<f64>) -> geo::MultiPolygon<f64> {
    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<geo::LineString<f64>> = None;
    let mut current_holes: Vec<geo::LineString<f64>> = Vec::new();

    for ring in rings {
        let mut coords: Vec<geo::Coord<f64>> = ring.points().iter().map(&to_coord).collect();
        ensure_closed(&mut coords);
        let ls = geo::LineString(coords);

        match ring {
            shp::PolygonRing::Outer(_) => {
                // flush previous polygon
                if let Some(ext) = current_exterior.take() {
                    polys.push(geo::Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(ls);
            }
            shp::PolygonRing::Inner(_) => current_holes.push(ls),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(geo::Polygon::new(ext, current_holes));
    }

    geo::MultiPolygon(polys)
}

/// Ensure first and last are the same for geo::LineString coords
pub(crate) fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::Area;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64, clockwise: bool) -> Vec<shp::Point> {
        let mut pts = vec![
            shp::Point { x: x0, y: y0 },
            shp::Point { x: x0 + size, y: y0 },
            shp::Point { x: x0 + size, y: y0 + size },
            shp::Point { x: x0, y: y0 + size },
            shp::Point { x: x0, y: y0 },
        ];
        if clockwise {
            pts.reverse();
        }
        pts
    }

    #[test]
    fn exterior_with_hole_and_second_part() {
        let polygon = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square(0.0, 0.0, 4.0, true)),
            shp::PolygonRing::Inner(square(1.0, 1.0, 1.0, false)),
            shp::PolygonRing::Outer(square(10.0, 10.0, 2.0, true)),
        ]);

        let mp = shape_to_multipolygon(&shp::Shape::Polygon(polygon)).unwrap();
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_eq!(mp.0[1].interiors().len(), 0);
        assert!((mp.unsigned_area() - (16.0 - 1.0 + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn non_areal_shapes_are_skipped() {
        assert!(shape_to_multipolygon(&shp::Shape::NullShape).is_none());
        assert!(shape_to_multipolygon(&shp::Shape::Point(shp::Point { x: 1.0, y: 2.0 })).is_none());
    }

    #[test]
    fn open_rings_are_closed() {
        let mut coords = vec![geo::Coord { x: 0.0, y: 0.0 }, geo::Coord { x: 1.0, y: 0.0 }, geo::Coord { x: 1.0, y: 1.0 }];
        ensure_closed(&mut coords);
        assert_eq!(coords.len(), 4);
        assert_eq!(coords[0], coords[3]);
    }
}
