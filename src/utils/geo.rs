const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 points.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn within_radius(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius_m: f64) -> bool {
    distance_m(lat1, lon1, lat2, lon2) <= radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_m(PARIS.0, PARIS.1, PARIS.0, PARIS.1), 0.0);
    }

    #[test]
    fn paris_to_london_is_about_344_km() {
        let d = distance_m(PARIS.0, PARIS.1, LONDON.0, LONDON.1);
        assert!((340_000.0..348_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn radius_check_separates_near_and_far() {
        // Roughly 100 m north of the first point.
        let near = (PARIS.0 + 0.0009, PARIS.1);
        assert!(within_radius(PARIS.0, PARIS.1, near.0, near.1, 500.0));
        assert!(!within_radius(PARIS.0, PARIS.1, near.0, near.1, 50.0));
    }
}
