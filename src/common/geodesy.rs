use geo::Point;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two (lon, lat) points in degrees,
/// using the haversine formula on a sphere of radius `EARTH_RADIUS_KM`.
pub fn haversine_km(from: Point<f64>, to: Point<f64>) -> f64 {
    let lat1_rad = from.y().to_radians();
    let lat2_rad = to.y().to_radians();
    let delta_lat = (to.y() - from.y()).to_radians();
    let delta_lon = (to.x() - from.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Build a `geo::Point` from latitude/longitude order, the order map widgets report clicks in.
#[inline]
pub fn lat_lon(lat: f64, lon: f64) -> Point<f64> {
    Point::new(lon, lat)
}

/// Whether a (lon, lat) point has finite, in-range geographic coordinates.
pub fn is_valid_lon_lat(point: Point<f64>) -> bool {
    point.x().is_finite() && point.y().is_finite()
        && (-180.0..=180.0).contains(&point.x())
        && (-90.0..=90.0).contains(&point.y())
}
