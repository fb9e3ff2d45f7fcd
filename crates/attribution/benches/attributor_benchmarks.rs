//! Benchmarks for attribution on the 2.5 degree global grid.
//!
//! Run with: cargo bench --package attribution --bench attributor_benchmarks

use attribution::{bridge, Attributor, ContourSlices};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cyclone_common::{Stamp, TrackerConfig};
use detection::CenterFinder;
use geometry::Geometry;
use test_utils::{gaussian_low, global_grid, quantize, uniform_field};

fn stormy_slp(config: &TrackerConfig) -> Vec<i64> {
    let spec = global_grid();
    let mut field = uniform_field(&spec, 101_300.0);
    for k in 0..12 {
        let lon = 30.0 * k as f64;
        let lat = if k % 2 == 0 { 50.0 } else { -45.0 };
        gaussian_low(&spec, &mut field, lon, lat, 1_500.0 + 100.0 * k as f64, 600.0);
    }
    quantize(&field, config.read_scale)
}

fn bench_attribute(c: &mut Criterion) {
    let config = TrackerConfig::default();
    let geo = Geometry::build(global_grid(), &config, 6, None).unwrap();
    let slp = stormy_slp(&config);
    let stamp = Stamp::new(1979, 1, 1, 0);
    let centers = CenterFinder::new(&geo, &config)
        .find(&stamp, 0, &slp, None)
        .unwrap()
        .centers;
    let attributor = Attributor::new(&geo, &config);

    c.bench_function("attribute_144x73", |b| {
        b.iter(|| attributor.attribute(black_box(&stamp), black_box(&slp), black_box(&centers)))
    });

    c.bench_function("slices_144x73", |b| {
        b.iter(|| ContourSlices::build(black_box(&slp), &config, None))
    });

    let slices = ContourSlices::build(&slp, &config, None);
    let low: Vec<usize> = (0..20).flat_map(|s| slices.grids(s).iter().copied()).collect();
    c.bench_function("bridge_low_slices", |b| b.iter(|| bridge(&geo, black_box(&low))));
}

criterion_group!(benches, bench_attribute);
criterion_main!(benches);
