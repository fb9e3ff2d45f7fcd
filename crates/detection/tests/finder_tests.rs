//! Center finder scenarios on the 2.5 degree global grid.

use cyclone_common::{flags, Intensity, Stamp, TrackerConfig};
use detection::CenterFinder;
use geometry::{Geometry, Terrain};
use test_utils::{gaussian_low, global_grid, quantize, uniform_field, white_noise};

fn stamp() -> Stamp {
    Stamp::new(1979, 1, 1, 0)
}

fn build(config: &TrackerConfig) -> Geometry {
    Geometry::build(global_grid(), config, 6, None).unwrap()
}

// ============================================================================
// Single isolated low
// ============================================================================

#[test]
fn test_single_gaussian_low_is_found_at_its_center() {
    let config = TrackerConfig::default();
    let geo = build(&config);
    let spec = &geo.spec;
    let mut field = uniform_field(spec, 101_500.0);
    gaussian_low(spec, &mut field, 180.0, 45.0, 2_000.0, 500.0);
    let slp = quantize(&field, config.read_scale);

    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert_eq!(step.centers.len(), 1);
    let c = &step.centers[0];
    assert_eq!(c.grid_id, spec.grid_id(72, 54));
    assert_eq!(c.colat, 4500);
    assert_eq!(c.lon, 18000);
    assert_eq!(c.grid_slp, 995_000);
    assert!(c.reg_slp > c.grid_slp);
    assert!(c.grid_lap >= 150);
    assert_eq!(c.flags, 0);
    assert_eq!(c.intensity, Intensity::Moderate);
    assert_eq!(c.uci.to_string(), "19790101000450018000");
    assert!(c.usi.is_none());
    // One center is below the per-step minimum.
    assert!(!step.warnings.is_empty());
}

// ============================================================================
// Degenerate fields
// ============================================================================

#[test]
fn test_uniform_field_has_no_centers() {
    let config = TrackerConfig::default();
    let geo = build(&config);
    let slp = quantize(&uniform_field(&geo.spec, 101_300.0), config.read_scale);
    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert!(step.centers.is_empty());
    assert!(step.problematic.is_empty());
}

#[test]
fn test_tropical_noise_yields_no_centers() {
    for tropical_filter in [true, false] {
        let config = TrackerConfig {
            tropical_filter,
            ..TrackerConfig::default()
        };
        let geo = build(&config);
        let mut field = uniform_field(&geo.spec, 101_300.0);
        white_noise(&geo.spec, &mut field, 10.0, 15.0, 7);
        let slp = quantize(&field, config.read_scale);
        let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
        assert!(step.centers.is_empty(), "tropical_filter = {}", tropical_filter);
    }
}

// ============================================================================
// Screens
// ============================================================================

#[test]
fn test_polar_low_is_screened_unless_filter_off() {
    let spec = global_grid();
    let mut field = uniform_field(&spec, 101_500.0);
    gaussian_low(&spec, &mut field, 90.0, 87.5, 2_000.0, 500.0);

    let config = TrackerConfig::default();
    let geo = Geometry::build(spec.clone(), &config, 6, None).unwrap();
    let slp = quantize(&field, config.read_scale);
    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert!(step.centers.is_empty());

    let config = TrackerConfig {
        polar_filter: false,
        ..TrackerConfig::default()
    };
    let geo = Geometry::build(spec, &config, 6, None).unwrap();
    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert_eq!(step.centers.len(), 1);
    assert!(step.centers[0].has_flag(flags::POLAR));
}

#[test]
fn test_troubled_low_is_held_back() {
    let spec = global_grid();
    let center = spec.grid_id(40, 52);
    let mut elevation = vec![0.0_f32; spec.maxid()];
    elevation[center] = 4000.0;
    let terrain = Terrain {
        elevation,
        land: None,
    };
    let mut field = uniform_field(&spec, 101_500.0);
    gaussian_low(&spec, &mut field, spec.lon_of(center), spec.lat_of(center), 3_000.0, 500.0);

    let config = TrackerConfig::default();
    let geo = Geometry::build(spec.clone(), &config, 6, Some(&terrain)).unwrap();
    let slp = quantize(&field, config.read_scale);
    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert!(step.centers.is_empty());
    assert_eq!(step.problematic.len(), 1);
    assert!(step.problematic[0].has_flag(flags::TROUBLED));
    assert_eq!(step.problematic[0].intensity, Intensity::Strong);

    let config = TrackerConfig {
        troubled_filter: false,
        ..TrackerConfig::default()
    };
    let geo = Geometry::build(spec, &config, 6, Some(&terrain)).unwrap();
    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert_eq!(step.centers.len(), 1);
    assert!(step.centers[0].has_flag(flags::TROUBLED));
}

#[test]
fn test_shallow_low_fails_laplacian() {
    let config = TrackerConfig::default();
    let geo = build(&config);
    let mut field = uniform_field(&geo.spec, 101_500.0);
    // 0.5 hPa over a broad area is far too flat
    gaussian_low(&geo.spec, &mut field, 200.0, -50.0, 50.0, 1_500.0);
    let slp = quantize(&field, config.read_scale);
    let step = CenterFinder::new(&geo, &config).find(&stamp(), 0, &slp, None).unwrap();
    assert!(step.centers.is_empty());
}
