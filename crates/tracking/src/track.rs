//! A cyclone track and its derived quantities.

use serde::{Deserialize, Serialize};

use cyclone_common::{CenterRecord, Uci};
use geometry::Geometry;

/// Time-ordered centers sharing one USI, one per consecutive step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub usi: Uci,
    pub members: Vec<CenterRecord>,
    travel_km: f64,
}

impl Track {
    /// Open a track on its first center.
    pub fn open(mut first: CenterRecord) -> Self {
        first.usi = Some(first.uci);
        Self {
            usi: first.uci,
            members: vec![first],
            travel_km: 0.0,
        }
    }

    /// Append the center matched at the next step.
    pub fn extend(&mut self, geo: &Geometry, mut next: CenterRecord) {
        self.travel_km += geo.distance(self.head().grid_id, next.grid_id);
        next.usi = Some(self.usi);
        self.members.push(next);
    }

    pub fn head(&self) -> &CenterRecord {
        &self.members[self.members.len() - 1]
    }

    /// Center before the head, if the track has one.
    pub fn prev(&self) -> Option<&CenterRecord> {
        self.members.len().checked_sub(2).map(|k| &self.members[k])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Lifetime in hours from first to last center.
    pub fn age_hours(&self, step_hours: u32) -> f64 {
        (self.members.len().saturating_sub(1) as u64 * step_hours as u64) as f64
    }

    /// Cumulative great-circle travel in km.
    pub fn travel_km(&self) -> f64 {
        self.travel_km
    }

    /// Lowest central SLP over the track, hPa x 1000.
    pub fn min_slp(&self) -> i64 {
        self.members.iter().map(|c| c.grid_slp).min().unwrap_or(i64::MAX)
    }

    pub fn dissimilarity_sum(&self) -> u64 {
        self.members.iter().map(|c| c.dissimilarity as u64).sum()
    }
}
