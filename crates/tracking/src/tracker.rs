//! Step-by-step track stitching.

use std::collections::BTreeMap;
use tracing::debug;

use cyclone_common::{CenterRecord, TrackerConfig, Uci};
use geometry::{destination, great_circle_km, initial_bearing, Geometry};

use crate::track::Track;

/// Latitude weight applied within this many degrees of the equator.
const EQUATOR_BAND: f64 = 2.0;
/// Fixed weight inside the equatorial band.
const EQUATOR_WEIGHT: f64 = 25.0;
/// Upper bound of the written dissimilarity.
const MAX_DISSIMILARITY: u32 = 9999;

/// Counts of one step's assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub matched: usize,
    pub opened: usize,
    pub retired: usize,
}

/// Where a live track is expected next.
#[derive(Debug, Clone, Copy)]
struct Prediction {
    grid: usize,
    /// hPa x 1000
    slp: i64,
}

/// A scored (track, center) pair.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    usi: Uci,
    uci: Uci,
    center: usize,
}

/// Links the centers of consecutive steps into tracks.
pub struct Tracker<'a> {
    geo: &'a Geometry,
    config: &'a TrackerConfig,
    live: BTreeMap<Uci, Track>,
    exported: Vec<Track>,
    discarded: usize,
}

impl<'a> Tracker<'a> {
    pub fn new(geo: &'a Geometry, config: &'a TrackerConfig) -> Self {
        Self {
            geo,
            config,
            live: BTreeMap::new(),
            exported: Vec::new(),
            discarded: 0,
        }
    }

    /// Number of live tracks.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Match one step's centers to the live tracks.
    ///
    /// Every center leaves with its USI and dissimilarity set. Tracks that
    /// found no center are retired.
    pub fn step(&mut self, centers: &mut [CenterRecord]) -> StepSummary {
        let mut candidates = Vec::new();
        for (usi, track) in &self.live {
            let pred = self.predict(track);
            for (k, c) in centers.iter().enumerate() {
                if self.geo.in_travel(pred.grid, c.grid_id) {
                    candidates.push(Candidate {
                        cost: self.cost(&pred, c),
                        usi: *usi,
                        uci: c.uci,
                        center: k,
                    });
                }
            }
        }
        candidates.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then_with(|| a.usi.cmp(&b.usi))
                .then_with(|| a.uci.cmp(&b.uci))
        });

        let mut center_taken = vec![false; centers.len()];
        let mut assignment: BTreeMap<Uci, (usize, f64)> = BTreeMap::new();
        for cand in candidates {
            if center_taken[cand.center] || assignment.contains_key(&cand.usi) {
                continue;
            }
            center_taken[cand.center] = true;
            assignment.insert(cand.usi, (cand.center, cand.cost));
        }

        let mut summary = StepSummary::default();
        let live = std::mem::take(&mut self.live);
        for (usi, mut track) in live {
            match assignment.get(&usi) {
                Some(&(k, cost)) => {
                    centers[k].dissimilarity = self.dissimilarity(cost);
                    track.extend(self.geo, centers[k].clone());
                    centers[k].usi = Some(usi);
                    self.live.insert(usi, track);
                    summary.matched += 1;
                }
                None => {
                    self.retire(track);
                    summary.retired += 1;
                }
            }
        }

        for (k, center) in centers.iter_mut().enumerate() {
            if center_taken[k] {
                continue;
            }
            center.dissimilarity = 0;
            center.usi = Some(center.uci);
            let track = Track::open(center.clone());
            self.live.insert(track.usi, track);
            summary.opened += 1;
        }

        debug!(
            matched = summary.matched,
            opened = summary.opened,
            retired = summary.retired,
            live = self.live.len(),
            "Tracker step"
        );
        summary
    }

    /// Retire every live track and return the exported tracks ordered by USI.
    pub fn finish(mut self) -> Vec<Track> {
        let live = std::mem::take(&mut self.live);
        for (_, track) in live {
            self.retire(track);
        }
        debug!(
            exported = self.exported.len(),
            discarded = self.discarded,
            "Tracker finished"
        );
        let mut exported = self.exported;
        exported.sort_by(|a, b| a.usi.cmp(&b.usi));
        exported
    }

    /// Whether a retired track passes the export filters.
    pub fn is_exportable(&self, track: &Track) -> bool {
        let config = self.config;
        if track.age_hours(self.geo.step_hours) < config.age_limit {
            return false;
        }
        if track.travel_km() < config.min_travel {
            return false;
        }
        if track.min_slp() > config.track_slp_cutoff {
            return false;
        }
        if config.tropical_filter
            && track.members.iter().all(|c| self.geo.is_tropical(c.grid_id))
        {
            return false;
        }
        true
    }

    fn retire(&mut self, track: Track) {
        if self.is_exportable(&track) {
            self.exported.push(track);
        } else {
            self.discarded += 1;
        }
    }

    /// Linear extrapolation of the head along the great circle through the
    /// last two centers, continuing over the pole if need be.
    fn predict(&self, track: &Track) -> Prediction {
        let head = track.head();
        let Some(prev) = track.prev() else {
            return Prediction {
                grid: head.grid_id,
                slp: head.grid_slp,
            };
        };
        let spec = &self.geo.spec;
        let (hlon, hlat) = (spec.lon_of(head.grid_id), spec.lat_of(head.grid_id));
        let (plon, plat) = (spec.lon_of(prev.grid_id), spec.lat_of(prev.grid_id));
        let step_km = great_circle_km(plon, plat, hlon, hlat);
        let grid = if step_km > 0.0 {
            let back = initial_bearing(hlon, hlat, plon, plat);
            let (lon, lat) = destination(hlon, hlat, (back + 180.0).rem_euclid(360.0), step_km);
            spec.nearest_grid(lon, lat)
        } else {
            head.grid_id
        };
        Prediction {
            grid,
            slp: 2 * head.grid_slp - prev.grid_slp,
        }
    }

    fn cost(&self, pred: &Prediction, center: &CenterRecord) -> f64 {
        let config = self.config;
        let km = self.geo.distance(pred.grid, center.grid_id);
        let dslp_hpa = (pred.slp - center.grid_slp).abs() as f64 / 1000.0;
        config.alpha * km + config.beta * dslp_hpa + config.gamma * latitude_weight(center.lat())
    }

    fn dissimilarity(&self, cost: f64) -> u32 {
        let radius = self.geo.travel_radius_km();
        (cost / radius * 100.0)
            .round()
            .clamp(0.0, MAX_DISSIMILARITY as f64) as u32
    }
}

/// `sin 60 / sin |lat|`, fixed inside the equatorial band.
pub fn latitude_weight(lat: f64) -> f64 {
    let lat = lat.abs();
    if lat <= EQUATOR_BAND {
        EQUATOR_WEIGHT
    } else {
        60.0_f64.to_radians().sin() / lat.to_radians().sin()
    }
}
