use crate::value_objects::ClientZone;

const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Symmetric zone-pair distance in km.
pub fn zone_distance_km(a: ClientZone, b: ClientZone) -> f64 {
    use ClientZone::*;
    match (a, b) {
        (CentralMetro, Periphery) | (Periphery, CentralMetro) => 15.0,
        (Periphery, Periphery) => 25.0,
        (CentralMetro, CentralMetro) => 8.0,
        (Industrial, Industrial) => 12.0,
        (CentralMetro, Industrial) | (Industrial, CentralMetro) => 18.0,
        (Periphery, Industrial) | (Industrial, Periphery) => 22.0,
    }
}
