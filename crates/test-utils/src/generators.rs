//! Synthetic SLP field generators.
//!
//! Fields are `Vec<f32>` in Pa on a normalised [`GridSpec`] (south-first
//! rows, prime-meridian-first columns), the same layout the reader produces.

use cyclone_common::{GridSpec, EARTH_RADIUS_KM};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Field of constant pressure `pa`.
pub fn uniform_field(spec: &GridSpec, pa: f32) -> Vec<f32> {
    vec![pa; spec.maxid()]
}

/// Subtract a circular Gaussian depression of `depth_pa` and width
/// `sigma_km` centered at (`lon`, `lat`).
///
/// # Example
///
/// ```
/// use cyclone_common::GridSpec;
/// use test_utils::{gaussian_low, uniform_field};
///
/// let spec = GridSpec::regular(2.5, 2.5).unwrap();
/// let mut field = uniform_field(&spec, 101_500.0);
/// gaussian_low(&spec, &mut field, 180.0, 45.0, 2_000.0, 500.0);
/// let g = spec.grid_id(72, 54);
/// assert!((field[g] - 99_500.0).abs() < 1e-3);
/// ```
pub fn gaussian_low(
    spec: &GridSpec,
    field: &mut [f32],
    lon: f64,
    lat: f64,
    depth_pa: f64,
    sigma_km: f64,
) {
    for (g, value) in field.iter_mut().enumerate() {
        let d = haversine_km(lon, lat, spec.lon_of(g), spec.lat_of(g));
        let dip = depth_pa * (-(d * d) / (2.0 * sigma_km * sigma_km)).exp();
        *value -= dip as f32;
    }
}

/// One circular Gaussian depression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Low {
    pub lon: f64,
    pub lat: f64,
    pub depth_pa: f64,
    pub sigma_km: f64,
}

/// Field of `ambient_pa` minus the summed dips of every low.
///
/// Dips are summed before subtracting, so lows placed symmetrically give
/// bit-identical values at mirrored cells.
pub fn gaussian_lows(spec: &GridSpec, ambient_pa: f64, lows: &[Low]) -> Vec<f32> {
    (0..spec.maxid())
        .map(|g| {
            let dip: f64 = lows
                .iter()
                .map(|low| {
                    let d = haversine_km(low.lon, low.lat, spec.lon_of(g), spec.lat_of(g));
                    low.depth_pa * (-(d * d) / (2.0 * low.sigma_km * low.sigma_km)).exp()
                })
                .sum();
            (ambient_pa - dip) as f32
        })
        .collect()
}

/// Add uniform noise in `[-amplitude_pa, amplitude_pa]` to every cell
/// equatorward of `lat_limit`, from a fixed seed.
pub fn white_noise(spec: &GridSpec, field: &mut [f32], amplitude_pa: f32, lat_limit: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for (g, value) in field.iter_mut().enumerate() {
        if spec.lat_of(g).abs() < lat_limit {
            *value += rng.gen_range(-amplitude_pa..=amplitude_pa);
        }
    }
}

/// Quantize a Pa field to working units with `read_scale`
/// (10 for Pa to hPa x 1000).
pub fn quantize(field: &[f32], read_scale: f64) -> Vec<i64> {
    field
        .iter()
        .map(|&v| (v as f64 * read_scale).round() as i64)
        .collect()
}

/// Position `km` along a constant bearing from (`lon`, `lat`), following the
/// great circle and wrapping over the pole.
pub fn displace(lon: f64, lat: f64, bearing_deg: f64, km: f64) -> (f64, f64) {
    let delta = km / EARTH_RADIUS_KM;
    let (phi1, lam1, theta) = (lat.to_radians(), lon.to_radians(), bearing_deg.to_radians());
    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lam2 = lam1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());
    (lam2.to_degrees().rem_euclid(360.0), phi2.to_degrees())
}

/// Series of `steps` fields with one low moving along a constant bearing at
/// `speed_ms`, sampled every `step_hours`.
#[allow(clippy::too_many_arguments)]
pub fn moving_low_series(
    spec: &GridSpec,
    ambient_pa: f32,
    start: (f64, f64),
    bearing_deg: f64,
    speed_ms: f64,
    depth_pa: f64,
    sigma_km: f64,
    step_hours: u32,
    steps: usize,
) -> Vec<Vec<f32>> {
    (0..steps)
        .map(|k| {
            let km = speed_ms * 3.6 * step_hours as f64 * k as f64;
            let (lon, lat) = displace(start.0, start.1, bearing_deg, km);
            let mut field = uniform_field(spec, ambient_pa);
            gaussian_low(spec, &mut field, lon, lat, depth_pa, sigma_km);
            field
        })
        .collect()
}

fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
    let dp = p2 - p1;
    let dl = (lon2 - lon1).to_radians();
    let a = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GridSpec {
        GridSpec::regular(2.5, 2.5).unwrap()
    }

    #[test]
    fn test_uniform_field() {
        let spec = spec();
        let field = uniform_field(&spec, 101_300.0);
        assert_eq!(field.len(), 144 * 73);
        assert!(field.iter().all(|&v| v == 101_300.0));
    }

    #[test]
    fn test_gaussian_low_minimum_at_center() {
        let spec = spec();
        let mut field = uniform_field(&spec, 101_500.0);
        gaussian_low(&spec, &mut field, 180.0, 45.0, 2_000.0, 500.0);
        let center = spec.grid_id(72, 54);
        let (argmin, _) = field
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(argmin, center);
        // Far side of the globe is untouched.
        assert_eq!(field[spec.grid_id(0, 18)], 101_500.0);
    }

    #[test]
    fn test_symmetric_lows_are_bit_identical() {
        let spec = spec();
        let low = |lon| Low {
            lon,
            lat: 45.0,
            depth_pa: 2_000.0,
            sigma_km: 250.0,
        };
        let field = gaussian_lows(&spec, 101_500.0, &[low(170.0), low(180.0)]);
        assert_eq!(field[spec.grid_id(68, 54)], field[spec.grid_id(72, 54)]);
        assert_eq!(field[spec.grid_id(69, 54)], field[spec.grid_id(71, 54)]);
    }

    #[test]
    fn test_white_noise_is_seeded_and_bounded() {
        let spec = spec();
        let mut a = uniform_field(&spec, 101_300.0);
        let mut b = uniform_field(&spec, 101_300.0);
        white_noise(&spec, &mut a, 10.0, 15.0, 42);
        white_noise(&spec, &mut b, 10.0, 15.0, 42);
        assert_eq!(a, b);
        for (g, v) in a.iter().enumerate() {
            if spec.lat_of(g).abs() >= 15.0 {
                assert_eq!(*v, 101_300.0);
            } else {
                assert!((v - 101_300.0).abs() <= 10.0);
            }
        }
    }

    #[test]
    fn test_quantize_pa_to_working_units() {
        assert_eq!(quantize(&[101_325.0], 10.0), vec![1_013_250]);
    }

    #[test]
    fn test_displace_over_pole() {
        let (lon, lat) = displace(0.0, 80.0, 0.0, 20.0_f64.to_radians() * EARTH_RADIUS_KM);
        assert!((lat - 80.0).abs() < 1e-6);
        assert!((lon - 180.0).abs() < 1e-6);
    }
}
