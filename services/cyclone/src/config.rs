//! Run configuration assembled from flags, files and the environment.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use cyclone_common::TrackerConfig;
use pipeline::Paths;

/// Tracker options: defaults, then the YAML file if given, then `CYCLONE_*`
/// environment overrides.
pub fn load_tracker_config(file: Option<&Path>) -> Result<TrackerConfig> {
    let config = match file {
        Some(path) => TrackerConfig::from_yaml(path)
            .with_context(|| format!("loading tracker config {}", path.display()))?
            .with_env_overrides(),
        None => TrackerConfig::from_env(),
    };
    debug!(config = ?config, "Tracker configuration");
    Ok(config)
}

/// Input and output directories; the output directory is created if needed.
pub fn prepare_paths(
    slp_dir: PathBuf,
    output_dir: PathBuf,
    shared_dir: Option<PathBuf>,
) -> Result<Paths> {
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let mut paths = Paths::new(slp_dir, output_dir);
    if let Some(dir) = shared_dir {
        paths = paths.with_shared_dir(dir);
    }
    info!(
        slp_dir = %paths.slp_dir.display(),
        output_dir = %paths.output_dir.display(),
        topography = paths.topography().is_some(),
        "Paths configured"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclone_common::CycloneError;

    #[test]
    fn test_yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.yaml");
        std::fs::write(&path, "wavenumber: 10.0\ncheck_flare: 20\n").unwrap();
        let config = load_tracker_config(Some(&path)).unwrap();
        assert_eq!(config.wavenumber, 10.0);
        assert_eq!(config.check_flare, 20);
        assert_eq!(config.interval, TrackerConfig::default().interval);
    }

    #[test]
    fn test_missing_config_file_keeps_its_kind() {
        let err = load_tracker_config(Some(Path::new("/nonexistent/tracker.yaml"))).unwrap_err();
        let kind = err.downcast_ref::<CycloneError>().map(CycloneError::exit_code);
        assert_eq!(kind, Some(1));
    }

    #[test]
    fn test_output_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/nested");
        let paths = prepare_paths(dir.path().to_path_buf(), out.clone(), None).unwrap();
        assert!(out.is_dir());
        assert_eq!(paths.output_dir, out);
    }
}
