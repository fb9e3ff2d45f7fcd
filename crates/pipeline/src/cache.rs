//! Geometry shared between year workers.

use std::sync::{Arc, Mutex};
use tracing::debug;

use cyclone_common::{CycloneResult, GridSpec};
use geometry::Geometry;

/// Built geometries keyed by grid and time step.
///
/// The lock is held while building, so concurrent workers on the same grid
/// wait for one build instead of racing.
#[derive(Default)]
pub struct GeometryCache {
    built: Mutex<Vec<Arc<Geometry>>>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The geometry of `spec` at `step_hours`, running `build` on a miss.
    pub fn get_or_build<F>(
        &self,
        spec: &GridSpec,
        step_hours: u32,
        build: F,
    ) -> CycloneResult<Arc<Geometry>>
    where
        F: FnOnce() -> CycloneResult<Geometry>,
    {
        let mut built = self.built.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(geo) = built
            .iter()
            .find(|g| g.step_hours == step_hours && g.spec == *spec)
        {
            debug!(im = spec.im, jm = spec.jm, step_hours, "Geometry cache hit");
            return Ok(Arc::clone(geo));
        }
        let geo = Arc::new(build()?);
        built.push(Arc::clone(&geo));
        Ok(geo)
    }

    pub fn len(&self) -> usize {
        self.built.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclone_common::{CycloneError, TrackerConfig};
    use test_utils::global_grid;

    #[test]
    fn test_second_request_reuses_the_build() {
        let config = TrackerConfig::default();
        let spec = global_grid();
        let cache = GeometryCache::new();
        let mut builds = 0;
        let a = cache
            .get_or_build(&spec, 6, || {
                builds += 1;
                Geometry::build(spec.clone(), &config, 6, None)
            })
            .unwrap();
        let b = cache
            .get_or_build(&spec, 6, || {
                builds += 1;
                Geometry::build(spec.clone(), &config, 6, None)
            })
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds, 1);

        cache
            .get_or_build(&spec, 12, || Geometry::build(spec.clone(), &config, 12, None))
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let spec = global_grid();
        let cache = GeometryCache::new();
        let err = cache.get_or_build(&spec, 6, || Err(CycloneError::config("no grid")));
        assert!(err.is_err());
        assert!(cache.is_empty());
    }
}
