//! Topography and land mask used to flag troubled grids.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use cyclone_common::{CycloneError, CycloneResult, GridSpec, TrackerConfig};

use crate::setup::Neighbors;

/// Surface elevation (m) and optional land flag for every grid cell, on the
/// normalised grid (south-first rows, prime-meridian-first columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub elevation: Vec<f32>,
    #[serde(default)]
    pub land: Option<Vec<bool>>,
}

impl Terrain {
    /// Read a terrain JSON file and check it against the grid.
    pub fn load<P: AsRef<Path>>(path: P, spec: &GridSpec) -> CycloneResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CycloneError::config(format!("cannot read topography {}: {}", path.display(), e))
        })?;
        let terrain: Terrain = serde_json::from_str(&content)?;
        terrain.validate(spec)?;
        info!(path = %path.display(), cells = terrain.elevation.len(), "Loaded topography");
        Ok(terrain)
    }

    /// Check the arrays cover the grid exactly.
    pub fn validate(&self, spec: &GridSpec) -> CycloneResult<()> {
        if self.elevation.len() != spec.maxid() {
            return Err(CycloneError::config(format!(
                "topography has {} cells, grid has {}",
                self.elevation.len(),
                spec.maxid()
            )));
        }
        if let Some(land) = &self.land {
            if land.len() != spec.maxid() {
                return Err(CycloneError::config(format!(
                    "land mask has {} cells, grid has {}",
                    land.len(),
                    spec.maxid()
                )));
            }
        }
        Ok(())
    }

    fn is_land(&self, g: usize) -> bool {
        match &self.land {
            Some(land) => land[g],
            None => self.elevation[g] > 0.0,
        }
    }

    /// Mean absolute elevation difference between a cell and its 8 neighbors.
    pub fn relative_relief(&self, g: usize, neighbors: &Neighbors) -> f64 {
        let center = self.elevation[g] as f64;
        let sum: f64 = neighbors
            .iter()
            .map(|&n| (self.elevation[n] as f64 - center).abs())
            .sum();
        sum / neighbors.len() as f64
    }

    /// Land grids that are high or steep enough to make SLP reduction unreliable.
    pub fn troubled_mask(&self, neighbors: &[Neighbors], config: &TrackerConfig) -> Vec<bool> {
        (0..self.elevation.len())
            .map(|g| {
                self.is_land(g)
                    && (self.elevation[g] as f64 >= config.troubled_elevation
                        || self.relative_relief(g, &neighbors[g]) >= config.troubled_relief)
            })
            .collect()
    }
}
