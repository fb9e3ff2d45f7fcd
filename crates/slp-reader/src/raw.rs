//! Raw yearly format: `header.json` plus a little-endian `f32` value block.
//!
//! ```text
//! <root>/<year>/header.json   { lats, lons, start, step_hours, steps, calendar, scale }
//! <root>/<year>/slp.f32       steps x jm x im values, source axis order
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use cyclone_common::{Calendar, Stamp, TimeAxis};

use crate::error::{ReaderError, ReaderResult};
use crate::normalize::AxisOrder;
use crate::SlpYear;

pub const HEADER_FILE: &str = "header.json";
pub const VALUES_FILE: &str = "slp.f32";

/// Contents of `header.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHeader {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// ISO or `YYYYMMDDHH` stamp of the first step
    pub start: String,
    pub step_hours: u32,
    pub steps: usize,
    #[serde(default = "default_calendar")]
    pub calendar: String,
    /// Multiplier from stored units to working units; the configured
    /// `read_scale` applies when absent.
    #[serde(default)]
    pub scale: Option<f64>,
}

fn default_calendar() -> String {
    "standard".to_string()
}

/// Whether `dir` holds a raw-format year.
pub fn is_raw_year(dir: &Path) -> bool {
    dir.join(HEADER_FILE).is_file()
}

/// Read a raw-format year directory.
pub fn read_raw_year(dir: &Path, year: i32) -> ReaderResult<SlpYear> {
    let header_path = dir.join(HEADER_FILE);
    let header_bytes = fs::read(&header_path).map_err(|e| {
        ReaderError::MissingData(format!("{}: {}", header_path.display(), e))
    })?;
    let header: RawHeader = serde_json::from_slice(&header_bytes)?;

    let (order, spec) = AxisOrder::resolve(&header.lats, &header.lons)?;
    let calendar = Calendar::from_str(&header.calendar)?;
    let start = Stamp::parse(&header.start)?;

    let values_path = dir.join(VALUES_FILE);
    let bytes = fs::read(&values_path).map_err(|e| {
        ReaderError::MissingData(format!("{}: {}", values_path.display(), e))
    })?;
    let cells = spec.maxid();
    let expected = header
        .steps
        .checked_mul(cells)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            ReaderError::InvalidFormat(format!(
                "{}: {} steps of {} cells overflow",
                header_path.display(),
                header.steps,
                cells
            ))
        })?;
    if bytes.len() != expected {
        return Err(ReaderError::InvalidFormat(format!(
            "{} holds {} bytes, expected {} ({} steps x {} cells)",
            values_path.display(),
            bytes.len(),
            expected,
            header.steps,
            cells
        )));
    }

    // The value file size has proven the step count.
    let axis = TimeAxis::new(calendar, start, header.step_hours, header.steps)?;

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let fields = values
        .chunks_exact(cells)
        .map(|src| order.apply(src))
        .collect();

    debug!(
        year = year,
        steps = header.steps,
        flip_lat = order.flip_lat,
        lon_shift = order.lon_shift,
        "Read raw SLP year"
    );

    SlpYear::new(year, spec, axis, header.scale, fields)
}
