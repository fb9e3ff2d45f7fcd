//! Field operators used by the center screens.
//!
//! All operators take the SLP field in hPa.

use geometry::{nb, Geometry};

/// 9-point mean: each cell replaced by the mean of itself and its 8
/// neighbors.
pub fn smooth9(geo: &Geometry, hpa: &[f64]) -> Vec<f64> {
    (0..hpa.len())
        .map(|g| {
            let sum: f64 = geo.neighbors(g).iter().map(|&n| hpa[n]).sum();
            (sum + hpa[g]) / 9.0
        })
        .collect()
}

/// Spherical discrete Laplacian at `g` in hPa/deg^2.
///
/// Derivatives are taken in colatitude (increasing southward) and longitude,
/// both in degrees:
///
/// ```text
/// lap = p_tt + cot(t) * pi/180 * p_t + p_ll / sin^2(t)
/// ```
pub fn laplacian(geo: &Geometry, field: &[f64], g: usize) -> f64 {
    let n = geo.neighbors(g);
    let (dlon, dlat) = (geo.spec.dlon, geo.spec.dlat);
    let (inv_sin2, cot_term) = geo.concavity(g);
    let p = field[g];
    let (north, south) = (field[n[nb::UPC]], field[n[nb::DNC]]);
    let (west, east) = (field[n[nb::CNM]], field[n[nb::CNP]]);

    let p_tt = (north - 2.0 * p + south) / (dlat * dlat);
    let p_t = (south - north) / (2.0 * dlat);
    let p_ll = (west - 2.0 * p + east) / (dlon * dlon);
    p_tt + cot_term * p_t + inv_sin2 * p_ll
}

/// Largest pressure difference to any 8-neighbor per great-circle distance,
/// in hPa per 100 km.
pub fn pressure_gradient(geo: &Geometry, hpa: &[f64], g: usize) -> f64 {
    geo.neighbors(g)
        .iter()
        .filter_map(|&n| {
            let d = geo.distance(g, n);
            (d > 0.0).then(|| (hpa[n] - hpa[g]).abs() / d * 100.0)
        })
        .fold(0.0, f64::max)
}
