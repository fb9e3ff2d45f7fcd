//! NetCDF input (`netcdf` feature).
//!
//! Expects `lat`/`latitude`, `lon`/`longitude` and `time` coordinate
//! variables and one pressure variable (`slp`, `psl`, `msl` or `prmsl`)
//! shaped `(time, lat, lon)`. `scale_factor`/`add_offset` are applied; the
//! CF `units` of `time` must be `hours since ...` or `days since ...`.

use std::path::Path;
use tracing::debug;

use cyclone_common::{Calendar, Stamp, TimeAxis};

use crate::error::{ReaderError, ReaderResult};
use crate::normalize::AxisOrder;
use crate::SlpYear;

const PRESSURE_NAMES: [&str; 4] = ["slp", "psl", "msl", "prmsl"];

/// Read one year from a NetCDF file.
pub fn read_netcdf_year(path: &Path, year: i32) -> ReaderResult<SlpYear> {
    let file = netcdf::open(path)
        .map_err(|e| ReaderError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let lats = read_axis(&file, &["lat", "latitude"])?;
    let lons = read_axis(&file, &["lon", "longitude"])?;
    let (order, spec) = AxisOrder::resolve(&lats, &lons)?;

    let time_var = file
        .variable("time")
        .ok_or_else(|| ReaderError::MissingData("time variable".to_string()))?;
    let times: Vec<f64> = time_var
        .get_values(..)
        .map_err(|e| ReaderError::InvalidFormat(format!("Failed to read time: {}", e)))?;
    let units = get_str_attr(&time_var, "units")
        .ok_or_else(|| ReaderError::MissingData("time units".to_string()))?;
    let calendar = match get_str_attr(&time_var, "calendar") {
        Some(name) => Calendar::from_str(&name)?,
        None => Calendar::Standard,
    };
    let (hours_per_unit, epoch) = parse_time_units(&units)?;
    if times.is_empty() {
        return Err(ReaderError::MissingData("empty time axis".to_string()));
    }
    let step_hours = if times.len() > 1 {
        ((times[1] - times[0]) * hours_per_unit).round() as u32
    } else {
        6
    };
    let start = epoch.advance(calendar, (times[0] * hours_per_unit).round() as u32)?;
    let axis = TimeAxis::new(calendar, start, step_hours, times.len())?;

    let var = PRESSURE_NAMES
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| ReaderError::MissingData("pressure variable".to_string()))?;
    let raw: Vec<f32> = var
        .get_values(..)
        .map_err(|e| ReaderError::InvalidFormat(format!("Failed to read SLP: {}", e)))?;
    let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);

    let cells = spec.maxid();
    if raw.len() != cells * times.len() {
        return Err(ReaderError::InvalidFormat(format!(
            "pressure variable holds {} values, expected {}",
            raw.len(),
            cells * times.len()
        )));
    }
    let fields = raw
        .chunks_exact(cells)
        .map(|src| {
            let scaled: Vec<f32> = src.iter().map(|v| v * scale_factor + add_offset).collect();
            order.apply(&scaled)
        })
        .collect();

    debug!(path = %path.display(), steps = times.len(), "Read NetCDF SLP year");
    SlpYear::new(year, spec, axis, None, fields)
}

fn read_axis(file: &netcdf::File, names: &[&str]) -> ReaderResult<Vec<f64>> {
    let var = names
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| ReaderError::MissingData(format!("{} variable", names[0])))?;
    var.get_values(..)
        .map_err(|e| ReaderError::InvalidFormat(format!("Failed to read {}: {}", names[0], e)))
}

/// Split CF time units into hours per unit and the epoch stamp.
fn parse_time_units(units: &str) -> ReaderResult<(f64, Stamp)> {
    let (unit, since) = units
        .split_once(" since ")
        .ok_or_else(|| ReaderError::InvalidFormat(format!("time units '{}'", units)))?;
    let hours = match unit.trim() {
        "hours" | "hour" | "h" => 1.0,
        "days" | "day" | "d" => 24.0,
        other => {
            return Err(ReaderError::InvalidFormat(format!(
                "unsupported time unit '{}'",
                other
            )))
        }
    };
    let since = since.trim();
    let stamp = if since.len() <= 10 {
        Stamp::parse(&format!("{}T00:00", since))?
    } else {
        Stamp::parse(&since.replacen(' ', "T", 1))?
    };
    Ok((hours, stamp))
}

fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
