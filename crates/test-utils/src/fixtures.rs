//! On-disk fixtures for reader, records and pipeline tests.

use std::fs;
use std::path::{Path, PathBuf};

use cyclone_common::GridSpec;

/// The 2.5° global grid every end-to-end scenario runs on.
pub fn global_grid() -> GridSpec {
    // 144 x 73, poles included
    match GridSpec::regular(2.5, 2.5) {
        Ok(spec) => spec,
        Err(e) => panic!("2.5 degree grid must build: {}", e),
    }
}

/// Description of one year written in the raw format.
#[derive(Debug, Clone)]
pub struct RawYear<'a> {
    pub year: i32,
    pub lats: &'a [f64],
    pub lons: &'a [f64],
    /// ISO start stamp, e.g. `1979-01-01T00:00`
    pub start: &'a str,
    pub step_hours: u32,
    pub calendar: &'a str,
    /// Multiplier from the stored units to hPa x accuracy
    pub scale: f64,
}

impl<'a> RawYear<'a> {
    /// A standard-calendar, 6-hourly year on `spec` starting 1 January, in Pa.
    pub fn on_grid(year: i32, spec: &'a GridSpec) -> Self {
        Self {
            year,
            lats: &spec.lats,
            lons: &spec.lons,
            start: "",
            step_hours: 6,
            calendar: "standard",
            scale: 10.0,
        }
    }
}

/// Write `fields` as `<root>/<year>/header.json` and `<root>/<year>/slp.f32`.
///
/// Each field must already be laid out in the order of `raw.lats` and
/// `raw.lons`. An empty `raw.start` means `<year>-01-01T00:00`.
pub fn write_raw_year(root: &Path, raw: &RawYear<'_>, fields: &[Vec<f32>]) -> PathBuf {
    let dir = root.join(raw.year.to_string());
    fs::create_dir_all(&dir).expect("create year directory");

    let start = if raw.start.is_empty() {
        format!("{:04}-01-01T00:00", raw.year)
    } else {
        raw.start.to_string()
    };
    let header = serde_json::json!({
        "lats": raw.lats,
        "lons": raw.lons,
        "start": start,
        "step_hours": raw.step_hours,
        "steps": fields.len(),
        "calendar": raw.calendar,
        "scale": raw.scale,
    });
    fs::write(
        dir.join("header.json"),
        serde_json::to_vec_pretty(&header).expect("serialize header"),
    )
    .expect("write header");

    let mut values: Vec<f32> = Vec::with_capacity(fields.iter().map(Vec::len).sum());
    for field in fields {
        values.extend_from_slice(field);
    }
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(dir.join("slp.f32"), bytes).expect("write slp values");
    dir
}

/// Write `<dir>/topography.json` with the given elevation and land mask.
pub fn write_topography(dir: &Path, elevation: &[f32], land: Option<&[bool]>) -> PathBuf {
    fs::create_dir_all(dir).expect("create shared directory");
    let path = dir.join("topography.json");
    let body = serde_json::json!({
        "elevation": elevation,
        "land": land,
    });
    fs::write(&path, serde_json::to_vec(&body).expect("serialize topography"))
        .expect("write topography");
    path
}
