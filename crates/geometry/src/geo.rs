//! Spherical distance, bearing and area helpers.

use cyclone_common::EARTH_RADIUS_KM;

/// Great-circle distance between two points in km (haversine).
pub fn great_circle_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = phi2 - phi1;
    let dlam = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlam / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Rhumb-line bearing from point 1 to point 2 in degrees clockwise from north,
/// in `[0, 360)`.
pub fn rhumb_bearing(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let mut dlam = (lon2 - lon1).to_radians();
    if dlam.abs() > std::f64::consts::PI {
        dlam -= dlam.signum() * 2.0 * std::f64::consts::PI;
    }
    let merc = |lat: f64| {
        let phi = lat.to_radians().clamp(-1.5707, 1.5707);
        (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln()
    };
    let dpsi = merc(lat2) - merc(lat1);
    if dlam == 0.0 && dpsi == 0.0 {
        return 0.0;
    }
    dlam.atan2(dpsi).to_degrees().rem_euclid(360.0)
}

/// Initial great-circle bearing from point 1 to point 2 in degrees, in
/// `[0, 360)`.
pub fn initial_bearing(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dlam = (lon2 - lon1).to_radians();
    let y = dlam.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlam.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Point reached by travelling `km` along a great circle leaving
/// (`lon`, `lat`) with `bearing` degrees. Crosses the poles naturally.
pub fn destination(lon: f64, lat: f64, bearing: f64, km: f64) -> (f64, f64) {
    let delta = km / EARTH_RADIUS_KM;
    let (phi1, lam1, theta) = (lat.to_radians(), lon.to_radians(), bearing.to_radians());
    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lam2 = lam1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);
    (lam2.to_degrees().rem_euclid(360.0), phi2.to_degrees())
}

/// Area in km^2 of the cell centered at `lat` spanning `dlon` x `dlat`
/// degrees, clipped at the poles.
pub fn cell_area_km2(lat: f64, dlon: f64, dlat: f64) -> f64 {
    let south = (lat - dlat / 2.0).max(-90.0).to_radians();
    let north = (lat + dlat / 2.0).min(90.0).to_radians();
    EARTH_RADIUS_KM * EARTH_RADIUS_KM * dlon.to_radians() * (north.sin() - south.sin()).abs()
}

/// Wrapped longitude difference `lon2 - lon1` in `(-180, 180]`.
pub fn lon_delta(lon1: f64, lon2: f64) -> f64 {
    let d = (lon2 - lon1).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_meridian() {
        let d = great_circle_km(0.0, 0.0, 0.0, 90.0);
        assert!((d - std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_distance_across_date_line() {
        let a = great_circle_km(179.0, 0.0, -179.0, 0.0);
        let b = great_circle_km(0.0, 0.0, 2.0, 0.0);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_distance_over_pole() {
        let d = great_circle_km(0.0, 85.0, 180.0, 85.0);
        let expected = 10.0_f64.to_radians() * EARTH_RADIUS_KM;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bearings() {
        assert!((rhumb_bearing(0.0, 0.0, 0.0, 10.0) - 0.0).abs() < 1e-9);
        assert!((rhumb_bearing(0.0, 0.0, 10.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((rhumb_bearing(0.0, 10.0, 0.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((rhumb_bearing(10.0, 0.0, 0.0, 0.0) - 270.0).abs() < 1e-9);
        // Shorter way round crosses the date line eastward.
        assert!((rhumb_bearing(179.0, 0.0, -179.0, 0.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_crosses_pole() {
        let km = 20.0_f64.to_radians() * EARTH_RADIUS_KM;
        let (lon, lat) = destination(0.0, 80.0, 0.0, km);
        assert!((lat - 80.0).abs() < 1e-6);
        assert!((lon - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_destination_inverts_bearing_and_distance() {
        let (lon, lat) = destination(170.0, 45.0, 60.0, 800.0);
        assert!((great_circle_km(170.0, 45.0, lon, lat) - 800.0).abs() < 1e-6);
        assert!((initial_bearing(170.0, 45.0, lon, lat) - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_cell_areas_sum_to_sphere() {
        let mut total = 0.0;
        for j in 0..73 {
            let lat = -90.0 + 2.5 * j as f64;
            total += 144.0 * cell_area_km2(lat, 2.5, 2.5);
        }
        let sphere = 4.0 * std::f64::consts::PI * EARTH_RADIUS_KM * EARTH_RADIUS_KM;
        assert!((total - sphere).abs() / sphere < 1e-9);
    }

    #[test]
    fn test_lon_delta() {
        assert_eq!(lon_delta(350.0, 10.0), 20.0);
        assert_eq!(lon_delta(10.0, 350.0), -20.0);
        assert_eq!(lon_delta(0.0, 180.0), 180.0);
    }
}
