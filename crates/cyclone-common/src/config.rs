//! Tracker configuration.
//!
//! SLP-valued options (contours, cutoffs, climatology) are integers in
//! hPa x 1000, independent of the working `accuracy`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{CycloneError, CycloneResult};

/// Full set of tunables for setup, center finding, tracking and attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    // === Setup ===
    /// Zonal wavenumber bounding the regional screen radius.
    pub wavenumber: f64,
    /// Upper bound on the regional radius in km (0 derives it from the wavenumber).
    pub critical_radius: f64,
    /// Maximum cyclone translation speed in m/s.
    pub max_cyclone_speed: f64,
    /// Land grids at or above this elevation (m) are troubled.
    pub troubled_elevation: f64,
    /// Land grids whose 9-point mean relative relief reaches this (m) are troubled.
    pub troubled_relief: f64,

    // === Center finder ===
    pub polar_filter: bool,
    /// Latitude (absolute, degrees) of the polar screen.
    pub polar_latitude: f64,
    pub tropical_filter: bool,
    /// Tropical boundary latitude (absolute, degrees); rows at or inside it
    /// are tropical.
    pub tropical_latitude: f64,
    pub troubled_filter: bool,
    /// Minimum discrete Laplacian in hPa/deg^2.
    pub lap_cutoff: f64,
    /// Minimum horizontal pressure gradient in hPa per 100 km, not hPa/km:
    /// at 0.07 hPa/km a 20 hPa low of 500 km radius would already fail.
    pub hpg_cutoff: f64,
    /// Climatological SLP the intensity classes are banded against.
    pub climatology_slp: i64,
    /// Depths below climatology (moderate, strong) in hPa x 1000.
    pub intensity_thresholds: [i64; 2],
    pub min_centers: usize,
    pub max_centers: usize,
    pub max_step_change: usize,

    // === Tracker ===
    /// Minimum track lifetime in hours.
    pub age_limit: f64,
    /// Minimum cumulative track travel in km.
    pub min_travel: f64,
    /// A track must reach at or below this SLP at least once.
    pub track_slp_cutoff: i64,
    /// Cost weight per km of displacement.
    pub alpha: f64,
    /// Cost weight per hPa of SLP change (km/hPa).
    pub beta: f64,
    /// Cost weight of the latitude term (km).
    pub gamma: f64,

    // === Attributor ===
    pub min_contour: i64,
    pub max_contour: i64,
    pub interval: i64,
    pub check_inflate: usize,
    pub check_flare: usize,
    pub inflated: f64,
    /// Fraction of the regional radius a region may wander to.
    pub scale_b: f64,
    pub coverage_min: f64,
    pub coverage_max: f64,

    // === Units ===
    /// Integer quantization: working SLP is hPa x accuracy.
    pub accuracy: i64,
    /// Multiplier from source units to hPa x accuracy.
    pub read_scale: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            wavenumber: 13.0,
            critical_radius: 0.0,
            max_cyclone_speed: 30.0,
            troubled_elevation: 1000.0,
            troubled_relief: 150.0,

            polar_filter: true,
            polar_latitude: 85.0,
            tropical_filter: true,
            tropical_latitude: 15.0,
            troubled_filter: true,
            lap_cutoff: 0.15,
            hpg_cutoff: 0.07,
            climatology_slp: 1_012_000,
            intensity_thresholds: [10_000, 25_000],
            min_centers: 10,
            max_centers: 60,
            max_step_change: 10,

            age_limit: 24.0,
            min_travel: 0.0,
            track_slp_cutoff: 1_010_000,
            alpha: 1.0,
            beta: 200.0,
            gamma: 10.0,

            min_contour: 940_000,
            max_contour: 1_030_000,
            interval: 2_000,
            check_inflate: 10,
            check_flare: 10,
            inflated: 5.0,
            scale_b: 0.5,
            coverage_min: 0.01,
            coverage_max: 0.30,

            accuracy: 1000,
            // Pa -> hPa x 1000
            read_scale: 10.0,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a YAML file; missing keys keep their defaults.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> CycloneResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CycloneError::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded tracker config file");
        Ok(config)
    }

    /// Apply `CYCLONE_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        env_override("CYCLONE_WAVENUMBER", &mut self.wavenumber);
        env_override("CYCLONE_CRITICAL_RADIUS", &mut self.critical_radius);
        env_override("CYCLONE_MAX_SPEED", &mut self.max_cyclone_speed);
        env_override("CYCLONE_AGE_LIMIT", &mut self.age_limit);
        env_override("CYCLONE_POLAR_FILTER", &mut self.polar_filter);
        env_override("CYCLONE_POLAR_LATITUDE", &mut self.polar_latitude);
        env_override("CYCLONE_TROPICAL_FILTER", &mut self.tropical_filter);
        env_override("CYCLONE_TROPICAL_LATITUDE", &mut self.tropical_latitude);
        env_override("CYCLONE_TROUBLED_FILTER", &mut self.troubled_filter);
        env_override("CYCLONE_LAP_CUTOFF", &mut self.lap_cutoff);
        env_override("CYCLONE_HPG_CUTOFF", &mut self.hpg_cutoff);
        env_override("CYCLONE_MIN_CONTOUR", &mut self.min_contour);
        env_override("CYCLONE_MAX_CONTOUR", &mut self.max_contour);
        env_override("CYCLONE_INTERVAL", &mut self.interval);
        env_override("CYCLONE_CHECK_INFLATE", &mut self.check_inflate);
        env_override("CYCLONE_CHECK_FLARE", &mut self.check_flare);
        env_override("CYCLONE_INFLATED", &mut self.inflated);
        env_override("CYCLONE_ACCURACY", &mut self.accuracy);
        env_override("CYCLONE_READ_SCALE", &mut self.read_scale);
        env_override("CYCLONE_MIN_TRAVEL", &mut self.min_travel);
        env_override("CYCLONE_TRACK_SLP_CUTOFF", &mut self.track_slp_cutoff);
        self
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> CycloneResult<()> {
        if !(self.wavenumber > 0.0) {
            return Err(CycloneError::config("wavenumber must be > 0"));
        }
        if self.critical_radius < 0.0 {
            return Err(CycloneError::config("critical_radius must be >= 0"));
        }
        if !(self.max_cyclone_speed > 0.0) {
            return Err(CycloneError::config("max_cyclone_speed must be > 0"));
        }
        if self.accuracy <= 0 {
            return Err(CycloneError::config("accuracy must be > 0"));
        }
        if !(self.read_scale > 0.0) {
            return Err(CycloneError::config("read_scale must be > 0"));
        }
        if self.interval <= 0 {
            return Err(CycloneError::config("interval must be > 0"));
        }
        if self.max_contour < self.min_contour {
            return Err(CycloneError::config("max_contour must be >= min_contour"));
        }
        if self.to_working(self.interval) == 0 {
            return Err(CycloneError::config(
                "interval vanishes at the configured accuracy",
            ));
        }
        if !(self.inflated > 1.0) {
            return Err(CycloneError::config("inflated must be > 1"));
        }
        if !(self.scale_b > 0.0 && self.scale_b <= 1.0) {
            return Err(CycloneError::config("scale_b must be in (0, 1]"));
        }
        if self.min_centers > self.max_centers {
            return Err(CycloneError::config("min_centers must be <= max_centers"));
        }
        if self.coverage_min > self.coverage_max {
            return Err(CycloneError::config("coverage_min must be <= coverage_max"));
        }
        if self.intensity_thresholds[0] > self.intensity_thresholds[1] {
            return Err(CycloneError::config("intensity thresholds must ascend"));
        }
        if !(0.0..=90.0).contains(&self.tropical_latitude)
            || !(0.0..=90.0).contains(&self.polar_latitude)
        {
            return Err(CycloneError::config("screen latitudes must be within [0, 90]"));
        }
        Ok(())
    }

    /// Convert an hPa x 1000 value to working units (hPa x accuracy).
    pub fn to_working(&self, hpa_x1000: i64) -> i64 {
        if self.accuracy == 1000 {
            hpa_x1000
        } else {
            (hpa_x1000 as f64 * self.accuracy as f64 / 1000.0).round() as i64
        }
    }

    /// Convert a working-unit value to hPa x 1000.
    pub fn to_output(&self, working: i64) -> i64 {
        if self.accuracy == 1000 {
            working
        } else {
            (working as f64 * 1000.0 / self.accuracy as f64).round() as i64
        }
    }

    /// Convert a working-unit value to hPa.
    pub fn to_hpa(&self, working: i64) -> f64 {
        working as f64 / self.accuracy as f64
    }

    /// Distance a cyclone may travel in one time step, in km.
    pub fn travel_radius_km(&self, step_hours: u32) -> f64 {
        self.max_cyclone_speed * 3.6 * step_hours as f64
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.trim().parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = key, value = %val, "Ignoring unparsable environment override"),
        }
    }
}
