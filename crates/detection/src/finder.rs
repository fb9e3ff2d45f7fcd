//! Per-step center finding.

use rayon::prelude::*;
use tracing::{debug, warn};

use cyclone_common::{
    flags, CenterRecord, CycloneError, CycloneResult, FailCheck, FilterWarning, Intensity, Stamp,
    TrackerConfig, Uci,
};
use geometry::Geometry;

use crate::filters::{laplacian, pressure_gradient, smooth9};

/// Centers found at one time step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepCenters {
    /// Centers passed on to tracking and attribution, in grid-ID order.
    pub centers: Vec<CenterRecord>,
    /// Troubled centers held back by the troubled filter.
    pub problematic: Vec<CenterRecord>,
    pub warnings: Vec<FilterWarning>,
}

/// Finds cyclone centers in quantized SLP fields.
pub struct CenterFinder<'a> {
    geo: &'a Geometry,
    config: &'a TrackerConfig,
}

impl<'a> CenterFinder<'a> {
    pub fn new(geo: &'a Geometry, config: &'a TrackerConfig) -> Self {
        Self { geo, config }
    }

    /// Find the centers of one step.
    ///
    /// `slp` is in working units (hPa x accuracy). `previous` is the number
    /// of centers kept at the previous step, if any, for the step-change
    /// bound.
    pub fn find(
        &self,
        stamp: &Stamp,
        abs_time: i64,
        slp: &[i64],
        previous: Option<usize>,
    ) -> CycloneResult<StepCenters> {
        let geo = self.geo;
        let config = self.config;
        if slp.len() != geo.maxid() {
            return Err(CycloneError::data(format!(
                "{}: field has {} cells, grid has {}",
                stamp,
                slp.len(),
                geo.maxid()
            )));
        }

        let hpa: Vec<f64> = slp.iter().map(|&v| config.to_hpa(v)).collect();
        let smoothed = smooth9(geo, &hpa);

        let found: Vec<CenterRecord> = (0..geo.maxid())
            .into_par_iter()
            .filter_map(|g| self.screen(g, stamp, abs_time, slp, &hpa, &smoothed))
            .collect();

        let mut out = StepCenters::default();
        for center in found {
            if config.troubled_filter && center.has_flag(flags::TROUBLED) {
                out.problematic.push(center);
            } else {
                out.centers.push(center);
            }
        }
        out.warnings = self.count_bounds(stamp, out.centers.len(), previous);
        for w in &out.warnings {
            warn!(stamp = %stamp, check = w.check.code(), "{}", w.message);
        }
        debug!(
            stamp = %stamp,
            centers = out.centers.len(),
            problematic = out.problematic.len(),
            "Found centers"
        );
        Ok(out)
    }

    /// Run every screen on grid `g`, returning its record when it passes.
    fn screen(
        &self,
        g: usize,
        stamp: &Stamp,
        abs_time: i64,
        slp: &[i64],
        hpa: &[f64],
        smoothed: &[f64],
    ) -> Option<CenterRecord> {
        let geo = self.geo;
        let config = self.config;
        let lat = geo.spec.lat_of(g).abs();
        let mut flag_bits = 0u8;

        if lat >= config.polar_latitude {
            if config.polar_filter {
                return None;
            }
            flag_bits |= flags::POLAR;
        }
        if geo.is_tropical(g) {
            if config.tropical_filter {
                return None;
            }
            flag_bits |= flags::TROPICAL;
        }

        let reg_slp = self.regional_minimum(g, slp)?;

        let lap = laplacian(geo, smoothed, g);
        if lap < config.lap_cutoff {
            return None;
        }
        if pressure_gradient(geo, hpa, g) < config.hpg_cutoff {
            return None;
        }
        if geo.is_troubled(g) {
            flag_bits |= flags::TROUBLED;
        }

        let colat = geo.spec.colat_x100(g);
        let lon = geo.spec.lon_x100(g);
        let grid_slp = config.to_output(slp[g]);
        Some(CenterRecord {
            stamp: *stamp,
            abs_time,
            colat,
            lon,
            grid_id: g,
            grid_slp,
            reg_slp: config.to_output(reg_slp),
            grid_lap: (lap * 1000.0).round() as i64,
            flags: flag_bits,
            intensity: self.intensity(grid_slp),
            dissimilarity: 0,
            uci: Uci::new(stamp, colat, lon),
            usi: None,
        })
    }

    /// Lowest SLP among the other grids of `g`'s regional screen, or `None`
    /// when `g` is not the regional minimum. Equal values go to the lower
    /// grid-ID.
    fn regional_minimum(&self, g: usize, slp: &[i64]) -> Option<i64> {
        let p = slp[g];
        let mut lowest: Option<i64> = None;
        for r in self.geo.regional(g) {
            if r == g {
                continue;
            }
            let q = slp[r];
            if q < p || (q == p && r < g) {
                return None;
            }
            lowest = Some(lowest.map_or(q, |l| l.min(q)));
        }
        lowest
    }

    fn intensity(&self, slp_out: i64) -> Intensity {
        let depth = self.config.climatology_slp - slp_out;
        let [moderate, strong] = self.config.intensity_thresholds;
        if depth >= strong {
            Intensity::Strong
        } else if depth >= moderate {
            Intensity::Moderate
        } else {
            Intensity::Weak
        }
    }

    fn count_bounds(&self, stamp: &Stamp, count: usize, previous: Option<usize>) -> Vec<FilterWarning> {
        let config = self.config;
        let mut warnings = Vec::new();
        if count < config.min_centers {
            warnings.push(FilterWarning::new(
                *stamp,
                FailCheck::TooFewCenters,
                format!("{} centers, fewer than {}", count, config.min_centers),
            ));
        }
        if count > config.max_centers {
            warnings.push(FilterWarning::new(
                *stamp,
                FailCheck::TooManyCenters,
                format!("{} centers, more than {}", count, config.max_centers),
            ));
        }
        if let Some(prev) = previous {
            if count.abs_diff(prev) > config.max_step_change {
                warnings.push(FilterWarning::new(
                    *stamp,
                    FailCheck::CenterCountJump,
                    format!("center count changed from {} to {}", prev, count),
                ));
            }
        }
        warnings
    }
}
