//! One-time setup of every grid lookup used by the finder, tracker and
//! attributor.

use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use cyclone_common::{
    CycloneError, CycloneResult, FailCheck, GridSpec, TrackerConfig, EARTH_RADIUS_KM,
};

use crate::geo::{cell_area_km2, great_circle_km, lon_delta, rhumb_bearing};
use crate::terrain::Terrain;

/// 8-neighbor tuple `(upm, upc, upp, cnm, cnp, dnm, dnc, dnp)`.
///
/// "up" is the next row north, "dn" the next row south, `m`/`p` the
/// western/eastern column. Beyond a polar row the "up" (or "dn") neighbors
/// are taken from the same row, half a circle away.
pub type Neighbors = [usize; 8];

/// Positions within [`Neighbors`].
pub mod nb {
    pub const UPM: usize = 0;
    pub const UPC: usize = 1;
    pub const UPP: usize = 2;
    pub const CNM: usize = 3;
    pub const CNP: usize = 4;
    pub const DNM: usize = 5;
    pub const DNC: usize = 6;
    pub const DNP: usize = 7;
}

/// Immutable geometry of one grid under one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub spec: GridSpec,
    pub step_hours: u32,
    neighbors: Vec<Neighbors>,
    regional_radius: Vec<f64>,
    regional_template: Vec<Vec<usize>>,
    travel_radius: f64,
    travel_template: Vec<Vec<usize>>,
    concavity: Vec<(f64, f64)>,
    area: Vec<f64>,
    troubled: Vec<bool>,
    tropical_rows: Vec<bool>,
    distance_lookup: Vec<Vec<f64>>,
    angle_lookup: Vec<Vec<f64>>,
}

/// Per-row tables computed in parallel.
struct RowTables {
    distances: Vec<f64>,
    angles: Vec<f64>,
    regional_radius: f64,
    regional: Vec<usize>,
    travel: Vec<usize>,
}

impl Geometry {
    /// Build every lookup for `spec`.
    ///
    /// `step_hours` is the time step of the SLP series; `terrain` is optional
    /// and, when absent, no grid is troubled.
    pub fn build(
        spec: GridSpec,
        config: &TrackerConfig,
        step_hours: u32,
        terrain: Option<&Terrain>,
    ) -> CycloneResult<Self> {
        let started = Instant::now();
        config.validate()?;
        if step_hours == 0 {
            return Err(CycloneError::config("time step must be positive"));
        }
        if let Some(t) = terrain {
            t.validate(&spec)?;
        }

        let neighbors = compute_neighbors(&spec);
        let travel_radius = config.travel_radius_km(step_hours);

        let rows: Vec<RowTables> = (0..spec.jm)
            .into_par_iter()
            .map(|j| row_tables(&spec, &neighbors, config, travel_radius, j))
            .collect();

        for (j, row) in rows.iter().enumerate() {
            if row.regional.len() < 2 {
                return Err(CycloneError::invariant(
                    "setup",
                    FailCheck::EmptyRegional.code(),
                    format!("regional screen of row {} holds no other grid", j),
                ));
            }
        }

        let concavity = spec.lats.iter().map(|&lat| concavity_coefficients(lat)).collect();
        let area = spec
            .lats
            .iter()
            .map(|&lat| cell_area_km2(lat, spec.dlon, spec.dlat))
            .collect();
        let troubled = match terrain {
            Some(t) => t.troubled_mask(&neighbors, config),
            None => vec![false; spec.maxid()],
        };
        let tropical_rows = spec
            .lats
            .iter()
            .map(|lat| lat.abs() <= config.tropical_latitude)
            .collect();

        let mut geometry = Self {
            step_hours,
            neighbors,
            regional_radius: Vec::with_capacity(spec.jm),
            regional_template: Vec::with_capacity(spec.jm),
            travel_radius,
            travel_template: Vec::with_capacity(spec.jm),
            concavity,
            area,
            troubled,
            tropical_rows,
            distance_lookup: Vec::with_capacity(spec.jm),
            angle_lookup: Vec::with_capacity(spec.jm),
            spec,
        };
        for row in rows {
            geometry.regional_radius.push(row.regional_radius);
            geometry.regional_template.push(row.regional);
            geometry.travel_template.push(row.travel);
            geometry.distance_lookup.push(row.distances);
            geometry.angle_lookup.push(row.angles);
        }

        info!(
            im = geometry.spec.im,
            jm = geometry.spec.jm,
            troubled = geometry.troubled.iter().filter(|&&t| t).count(),
            travel_radius_km = travel_radius,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built grid geometry"
        );
        Ok(geometry)
    }

    /// Number of grid cells.
    pub fn maxid(&self) -> usize {
        self.spec.maxid()
    }

    /// 8-neighbors of `g`.
    pub fn neighbors(&self, g: usize) -> &Neighbors {
        &self.neighbors[g]
    }

    /// Column-0-relative position of `g` as seen from `from`.
    #[inline]
    fn relative(&self, from: usize, g: usize) -> usize {
        let shift = self.spec.column_offset(self.spec.col(from), 0);
        self.spec.rotate(g, shift)
    }

    /// Great-circle distance between two grid cells in km.
    pub fn distance(&self, g1: usize, g2: usize) -> f64 {
        self.distance_lookup[self.spec.row(g1)][self.relative(g1, g2)]
    }

    /// Rhumb-line bearing from `g1` to `g2` in degrees.
    pub fn bearing(&self, g1: usize, g2: usize) -> f64 {
        self.angle_lookup[self.spec.row(g1)][self.relative(g1, g2)]
    }

    /// Regional screen radius at the row of `g`, in km.
    pub fn regional_radius_km(&self, g: usize) -> f64 {
        self.regional_radius[self.spec.row(g)]
    }

    /// Every grid within the regional screen of `g` (including `g`).
    pub fn regional(&self, g: usize) -> impl Iterator<Item = usize> + '_ {
        let col = self.spec.col(g);
        self.regional_template[self.spec.row(g)]
            .iter()
            .map(move |&t| self.spec.rotate(t, col))
    }

    /// Whether `g` lies within the regional screen of `center`.
    pub fn in_regional(&self, center: usize, g: usize) -> bool {
        self.regional_template[self.spec.row(center)]
            .binary_search(&self.relative(center, g))
            .is_ok()
    }

    /// Distance a cyclone can travel in one time step, in km.
    pub fn travel_radius_km(&self) -> f64 {
        self.travel_radius
    }

    /// Every grid reachable from `g` within one time step.
    pub fn travel(&self, g: usize) -> impl Iterator<Item = usize> + '_ {
        let col = self.spec.col(g);
        self.travel_template[self.spec.row(g)]
            .iter()
            .map(move |&t| self.spec.rotate(t, col))
    }

    /// Whether `g` is reachable from `from` within one time step.
    pub fn in_travel(&self, from: usize, g: usize) -> bool {
        self.travel_template[self.spec.row(from)]
            .binary_search(&self.relative(from, g))
            .is_ok()
    }

    /// Laplacian coefficients `(1/sin^2(colat), cot(colat) * pi/180)` of `g`.
    pub fn concavity(&self, g: usize) -> (f64, f64) {
        self.concavity[self.spec.row(g)]
    }

    /// Cell area in km^2.
    pub fn area(&self, g: usize) -> f64 {
        self.area[self.spec.row(g)]
    }

    /// Characteristic width of a cell in km.
    pub fn cell_width_km(&self, g: usize) -> f64 {
        self.area(g).sqrt()
    }

    pub fn is_troubled(&self, g: usize) -> bool {
        self.troubled[g]
    }

    /// Whether the row of `g` lies within the tropical band.
    pub fn is_tropical(&self, g: usize) -> bool {
        self.tropical_rows[self.spec.row(g)]
    }

    /// Number of grid cells outside the tropical band.
    pub fn extratropical_count(&self) -> usize {
        self.tropical_rows.iter().filter(|&&t| !t).count() * self.spec.im
    }
}

/// Regional screen radius at `lat`: `pi * R * cos(lat) / k`, capped by the
/// critical radius when one is configured.
pub fn regional_radius_km(lat: f64, config: &TrackerConfig) -> f64 {
    let derived = std::f64::consts::PI * EARTH_RADIUS_KM * lat.to_radians().cos().abs()
        / config.wavenumber;
    if config.critical_radius > 0.0 {
        derived.min(config.critical_radius)
    } else {
        derived
    }
}

fn concavity_coefficients(lat: f64) -> (f64, f64) {
    let colat = (90.0 - lat).to_radians();
    let s = colat.sin();
    if s.abs() < 1e-9 {
        // On the pole both terms degenerate and are skipped.
        return (0.0, 0.0);
    }
    (1.0 / (s * s), colat.cos() / s * std::f64::consts::PI / 180.0)
}

fn compute_neighbors(spec: &GridSpec) -> Vec<Neighbors> {
    let (im, jm) = (spec.im, spec.jm);
    let antipode = |c: usize| (c + im / 2) % im;
    let mut out = Vec::with_capacity(spec.maxid());
    for j in 0..jm {
        for i in 0..im {
            let m = (i + im - 1) % im;
            let p = (i + 1) % im;
            let (up_row, up_cols) = if j + 1 < jm {
                (j + 1, [m, i, p])
            } else {
                (j, [antipode(m), antipode(i), antipode(p)])
            };
            let (dn_row, dn_cols) = if j > 0 {
                (j - 1, [m, i, p])
            } else {
                (j, [antipode(m), antipode(i), antipode(p)])
            };
            out.push([
                spec.grid_id(up_cols[0], up_row),
                spec.grid_id(up_cols[1], up_row),
                spec.grid_id(up_cols[2], up_row),
                spec.grid_id(m, j),
                spec.grid_id(p, j),
                spec.grid_id(dn_cols[0], dn_row),
                spec.grid_id(dn_cols[1], dn_row),
                spec.grid_id(dn_cols[2], dn_row),
            ]);
        }
    }
    out
}

fn row_tables(
    spec: &GridSpec,
    neighbors: &[Neighbors],
    config: &TrackerConfig,
    travel_radius: f64,
    j: usize,
) -> RowTables {
    let origin = spec.grid_id(0, j);
    let (lon0, lat0) = (spec.lons[0], spec.lats[j]);

    let mut distances = Vec::with_capacity(spec.maxid());
    let mut angles = Vec::with_capacity(spec.maxid());
    for g in 0..spec.maxid() {
        // Signed offset keeps east and west mirror images bit-identical.
        let dl = lon_delta(lon0, spec.lon_of(g));
        let lat = spec.lat_of(g);
        distances.push(great_circle_km(0.0, lat0, dl.abs(), lat));
        angles.push(rhumb_bearing(0.0, lat0, dl, lat));
    }

    // Never smaller than the farthest 8-neighbor so every screen sees its ring.
    let floor = neighbors[origin]
        .iter()
        .map(|&n| distances[n])
        .fold(0.0, f64::max);
    let regional_radius = regional_radius_km(lat0, config).max(floor);

    let regional = (0..spec.maxid())
        .filter(|&g| distances[g] <= regional_radius + 1e-9)
        .filter(|&g| !config.polar_filter || lon_delta(lon0, spec.lon_of(g)).abs() <= 90.0)
        .collect::<Vec<_>>();
    let travel = (0..spec.maxid())
        .filter(|&g| distances[g] <= travel_radius + 1e-9)
        .collect::<Vec<_>>();

    debug!(
        row = j,
        lat = lat0,
        regional_radius_km = regional_radius,
        regional = regional.len(),
        travel = travel.len(),
        "Row tables"
    );

    RowTables {
        distances,
        angles,
        regional_radius,
        regional,
        travel,
    }
}
