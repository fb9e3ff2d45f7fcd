//! The shared state of a run.

use std::path::Path;
use std::sync::Arc;

use cyclone_common::{CycloneError, CycloneResult, TrackerConfig};
use geometry::{Geometry, Terrain};
use records::{FileKind, Header, Record, RecordWriter};
use slp_reader::{read_year, SlpYear};

use crate::cache::GeometryCache;
use crate::cancel::CancelToken;
use crate::paths::Paths;

/// Runs the per-year stages.
///
/// A `Pipeline` is `Sync`: year workers share one behind an `Arc`, along
/// with its geometry cache and cancel token.
pub struct Pipeline {
    pub(crate) config: TrackerConfig,
    pub(crate) paths: Paths,
    pub(crate) geometries: GeometryCache,
    pub(crate) cancel: CancelToken,
}

impl Pipeline {
    /// Validates `config` up front so workers never start on a bad one.
    pub fn new(config: TrackerConfig, paths: Paths) -> CycloneResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            paths,
            geometries: GeometryCache::new(),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn geometries(&self) -> &GeometryCache {
        &self.geometries
    }

    /// Read a year of SLP and the geometry of its grid.
    pub(crate) fn load_year(&self, year: i32) -> CycloneResult<(SlpYear, Arc<Geometry>)> {
        let slp = read_year(&self.paths.slp_dir, year)?;
        let step_hours = slp.axis.step_hours;
        let geo = self.geometries.get_or_build(&slp.spec, step_hours, || {
            let terrain = match self.paths.topography() {
                Some(path) => Some(Terrain::load(path, &slp.spec)?),
                None => None,
            };
            Geometry::build(slp.spec.clone(), &self.config, step_hours, terrain.as_ref())
        })?;
        Ok((slp, geo))
    }
}

/// Header of a `kind` file for `slp`.
pub(crate) fn header_for(kind: FileKind, slp: &SlpYear) -> Header {
    Header {
        kind,
        year: slp.year,
        im: slp.spec.im,
        jm: slp.spec.jm,
        step_hours: slp.axis.step_hours,
    }
}

/// Reject a record file written for another kind, year, grid or step.
pub(crate) fn check_header(path: &Path, found: &Header, expected: &Header) -> CycloneResult<()> {
    if found != expected {
        return Err(CycloneError::config(format!(
            "{} has header {:?}, expected {:?}",
            path.display(),
            found,
            expected
        )));
    }
    Ok(())
}

/// Write `records` to `path` under `header`.
pub(crate) fn write_records(path: &Path, header: &Header, records: &[Record]) -> CycloneResult<usize> {
    let mut writer = RecordWriter::create(path, header)?;
    for record in records {
        writer.write(record)?;
    }
    Ok(writer.finish()?)
}
