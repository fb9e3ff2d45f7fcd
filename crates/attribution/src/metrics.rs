//! Shape and neighborhood metrics of an attributed region.

use cyclone_common::{TrackerConfig, Uci};
use geometry::{nb, Geometry};

/// Another center as seen from a region's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearCenter {
    pub distance_km: f64,
    pub bearing_deg: f64,
    pub uci: Uci,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionMetrics {
    pub n_grids: usize,
    pub area_km2: f64,
    pub perimeter_km: f64,
    pub min_edge_km: f64,
    pub max_edge_km: f64,
    pub mean_edge_km: f64,
    /// Outer contour minus central SLP, hPa x 10.
    pub depth: i64,
    pub nearest: Option<NearCenter>,
    pub nearest_alt: Option<NearCenter>,
}

/// Measure `region` (sorted ascending) around `center`.
///
/// Edge grids are region grids with a 4-neighbor outside the region; a
/// single-grid region is its own edge. `outer` and `central` are working
/// SLP values.
pub fn measure(
    geo: &Geometry,
    config: &TrackerConfig,
    center: usize,
    region: &[usize],
    outer: i64,
    central: i64,
) -> RegionMetrics {
    let inside = |g: usize| region.binary_search(&g).is_ok();
    let mut area = 0.0;
    let mut perimeter = 0.0;
    let mut edges = Vec::new();
    for &g in region {
        area += geo.area(g);
        let n = geo.neighbors(g);
        if [nb::UPC, nb::CNM, nb::CNP, nb::DNC]
            .iter()
            .any(|&k| !inside(n[k]))
        {
            perimeter += geo.cell_width_km(g);
            edges.push(geo.distance(center, g));
        }
    }
    if edges.is_empty() {
        edges.push(0.0);
    }
    let min_edge = edges.iter().copied().fold(f64::INFINITY, f64::min);
    let max_edge = edges.iter().copied().fold(0.0, f64::max);
    let mean_edge = edges.iter().sum::<f64>() / edges.len() as f64;

    RegionMetrics {
        n_grids: region.len(),
        area_km2: area,
        perimeter_km: perimeter,
        min_edge_km: min_edge,
        max_edge_km: max_edge,
        mean_edge_km: mean_edge,
        depth: (config.to_output(outer) - config.to_output(central)) / 100,
        nearest: None,
        nearest_alt: None,
    }
}

/// The two centers closest to `center`, ties broken by UCI.
pub fn nearest_centers(
    geo: &Geometry,
    center: usize,
    others: impl Iterator<Item = (usize, Uci)>,
) -> (Option<NearCenter>, Option<NearCenter>) {
    let mut near: Vec<NearCenter> = others
        .map(|(g, uci)| NearCenter {
            distance_km: geo.distance(center, g),
            bearing_deg: geo.bearing(center, g),
            uci,
        })
        .collect();
    near.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.uci.cmp(&b.uci))
    });
    let mut it = near.into_iter();
    (it.next(), it.next())
}
