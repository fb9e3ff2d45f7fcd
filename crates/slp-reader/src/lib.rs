//! Reader for yearly sea-level-pressure series.
//!
//! A year is read from `<root>/<year>/` in the raw format (see [`raw`]) or,
//! with the `netcdf` feature, from `<root>/<year>.nc`. Either way the result
//! is normalised: rows run south to north, column 0 contains the prime
//! meridian, and every value is finite.

pub mod error;
#[cfg(feature = "netcdf")]
pub mod nc;
pub mod normalize;
pub mod raw;

use std::path::Path;
use tracing::info;

use cyclone_common::{GridSpec, TimeAxis};

pub use error::{ReaderError, ReaderResult};
pub use normalize::AxisOrder;
pub use raw::RawHeader;

/// One year of SLP on the normalised grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SlpYear {
    pub year: i32,
    pub spec: GridSpec,
    pub axis: TimeAxis,
    /// Stored-unit to working-unit multiplier carried by the source, if any
    pub scale: Option<f64>,
    fields: Vec<Vec<f32>>,
}

impl SlpYear {
    /// Assemble a year, rejecting mismatched sizes and non-finite values.
    pub fn new(
        year: i32,
        spec: GridSpec,
        axis: TimeAxis,
        scale: Option<f64>,
        fields: Vec<Vec<f32>>,
    ) -> ReaderResult<Self> {
        if fields.len() != axis.len() {
            return Err(ReaderError::InvalidFormat(format!(
                "{} fields for {} time steps",
                fields.len(),
                axis.len()
            )));
        }
        for (step, field) in fields.iter().enumerate() {
            if field.len() != spec.maxid() {
                return Err(ReaderError::InvalidFormat(format!(
                    "step {} has {} cells, grid has {}",
                    step,
                    field.len(),
                    spec.maxid()
                )));
            }
            if let Some(index) = field.iter().position(|v| !v.is_finite()) {
                return Err(ReaderError::NonFinite { step, index });
            }
        }
        Ok(Self {
            year,
            spec,
            axis,
            scale,
            fields,
        })
    }

    /// Number of time steps.
    pub fn steps(&self) -> usize {
        self.fields.len()
    }

    /// Field of step `k` in stored units.
    pub fn field(&self, k: usize) -> &[f32] {
        &self.fields[k]
    }

    /// Field of step `k` quantized to working units.
    ///
    /// The source's own scale wins over `read_scale`.
    pub fn quantized(&self, k: usize, read_scale: f64) -> Vec<i64> {
        let scale = self.scale.unwrap_or(read_scale);
        self.fields[k]
            .iter()
            .map(|&v| (v as f64 * scale).round() as i64)
            .collect()
    }
}

/// Read year `year` from `root`.
pub fn read_year(root: &Path, year: i32) -> ReaderResult<SlpYear> {
    let dir = root.join(year.to_string());
    let slp = if raw::is_raw_year(&dir) {
        raw::read_raw_year(&dir, year)?
    } else {
        read_other(root, year)?
    };
    info!(
        year = year,
        steps = slp.steps(),
        im = slp.spec.im,
        jm = slp.spec.jm,
        calendar = ?slp.axis.calendar,
        "Loaded SLP year"
    );
    Ok(slp)
}

#[cfg(feature = "netcdf")]
fn read_other(root: &Path, year: i32) -> ReaderResult<SlpYear> {
    let path = root.join(format!("{}.nc", year));
    if path.is_file() {
        nc::read_netcdf_year(&path, year)
    } else {
        Err(ReaderError::MissingData(format!(
            "no SLP for {} under {}",
            year,
            root.display()
        )))
    }
}

#[cfg(not(feature = "netcdf"))]
fn read_other(root: &Path, year: i32) -> ReaderResult<SlpYear> {
    Err(ReaderError::MissingData(format!(
        "no raw SLP for {} under {}",
        year,
        root.display()
    )))
}
