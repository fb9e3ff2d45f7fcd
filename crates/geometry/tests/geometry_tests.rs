//! Integration tests for grid geometry setup.

use cyclone_common::{CycloneError, GridSpec, TrackerConfig};
use geometry::{Geometry, Terrain};
use test_utils::{assert_approx_eq, global_grid, write_topography};

fn build(config: &TrackerConfig) -> Geometry {
    Geometry::build(global_grid(), config, 6, None).unwrap()
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_rebuild_is_bit_identical() {
    let config = TrackerConfig::default();
    let a = build(&config);
    let b = build(&config);
    assert_eq!(a, b);
}

// ============================================================================
// Longitude wrap
// ============================================================================

#[test]
fn test_regional_wraps_date_line_and_prime_meridian() {
    let geo = build(&TrackerConfig::default());
    let spec = &geo.spec;
    let g = spec.grid_id(0, 54);
    let west = spec.grid_id(143, 54);
    let east = spec.grid_id(1, 54);
    assert!(geo.in_regional(g, west));
    assert!(geo.in_regional(g, east));
    assert_approx_eq!(geo.distance(g, west), geo.distance(g, east), 1e-9);
    assert!(geo.regional(g).any(|r| r == west));
}

#[test]
fn test_regional_is_rotation_of_column_zero() {
    let geo = build(&TrackerConfig::default());
    let spec = &geo.spec;
    let base: Vec<usize> = geo.regional(spec.grid_id(0, 50)).collect();
    let shifted: Vec<usize> = geo.regional(spec.grid_id(37, 50)).collect();
    assert_eq!(base.len(), shifted.len());
    for (b, s) in base.iter().zip(&shifted) {
        assert_eq!(spec.rotate(*b, 37), *s);
    }
}

#[test]
fn test_cell_areas_cover_sphere() {
    let geo = build(&TrackerConfig::default());
    let total: f64 = (0..geo.maxid()).map(|g| geo.area(g)).sum();
    let sphere = 4.0 * std::f64::consts::PI * 6371.2_f64.powi(2);
    assert_approx_eq!(total / sphere, 1.0, 1e-9);
}

// ============================================================================
// Terrain
// ============================================================================

#[test]
fn test_troubled_mask_from_topography_file() {
    let spec = global_grid();
    let mut elevation = vec![0.0_f32; spec.maxid()];
    let high = spec.grid_id(40, 50);
    let steep = spec.grid_id(100, 30);
    let gentle = spec.grid_id(10, 60);
    elevation[high] = 4000.0;
    elevation[steep] = 400.0;
    for j in 59..=61 {
        for i in 9..=11 {
            elevation[spec.grid_id(i, j)] = 50.0;
        }
    }
    elevation[gentle] = 100.0;

    let tmp = tempfile::tempdir().unwrap();
    let path = write_topography(tmp.path(), &elevation, None);
    let terrain = Terrain::load(&path, &spec).unwrap();
    let geo = Geometry::build(spec.clone(), &TrackerConfig::default(), 6, Some(&terrain)).unwrap();

    assert!(geo.is_troubled(high));
    // 400 m above flat sea-level neighbors
    assert!(geo.is_troubled(steep));
    // 50 m mean relief, 100 m elevation
    assert!(!geo.is_troubled(gentle));
    // Sea-level neighbors are not land without a mask
    assert!(!geo.is_troubled(spec.grid_id(41, 50)));
}

#[test]
fn test_ocean_is_never_troubled() {
    let spec = global_grid();
    let elevation = vec![3000.0_f32; spec.maxid()];
    let land = vec![false; spec.maxid()];
    let terrain = Terrain {
        elevation,
        land: Some(land),
    };
    let geo = Geometry::build(spec, &TrackerConfig::default(), 6, Some(&terrain)).unwrap();
    assert!((0..geo.maxid()).all(|g| !geo.is_troubled(g)));
}

#[test]
fn test_topography_of_wrong_size_is_rejected() {
    let spec = global_grid();
    let terrain = Terrain {
        elevation: vec![0.0; 10],
        land: None,
    };
    let err = Geometry::build(spec, &TrackerConfig::default(), 6, Some(&terrain)).unwrap_err();
    assert!(matches!(err, CycloneError::Config(_)));
    assert_eq!(err.exit_code(), 1);
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_irregular_axes_fail_setup() {
    let mut lats: Vec<f64> = (0..73).map(|j| -90.0 + 2.5 * j as f64).collect();
    lats[10] += 0.01;
    let lons = (0..144).map(|i| 2.5 * i as f64).collect();
    assert!(GridSpec::from_axes(lats, lons).is_err());
}

#[test]
fn test_zero_time_step_fails_setup() {
    assert!(Geometry::build(global_grid(), &TrackerConfig::default(), 0, None).is_err());
}
