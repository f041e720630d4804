/// Great-circle distance between two points in kilometres, by the
/// Haversine formula.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// North-south and east-west extent of a bounds rectangle in kilometres.
/// East-west is measured along the southern edge.
pub fn extent_km(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> (f64, f64) {
    let north_south = haversine_distance(lat_min, lon_min, lat_max, lon_min);
    let east_west = haversine_distance(lat_min, lon_min, lat_min, lon_max);
    (north_south, east_west)
}
