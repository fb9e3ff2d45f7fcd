//! Input and output locations of a run.

use std::path::PathBuf;

use records::FileKind;

/// Name of the optional topography file under the shared directory.
pub const TOPOGRAPHY_FILE: &str = "topography.json";

/// Directories a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Root of the yearly SLP inputs
    pub slp_dir: PathBuf,
    /// Where center, track, attribution and redo files go
    pub output_dir: PathBuf,
    /// Precomputed shared inputs (topography)
    pub shared_dir: Option<PathBuf>,
}

impl Paths {
    pub fn new(slp_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            slp_dir: slp_dir.into(),
            output_dir: output_dir.into(),
            shared_dir: None,
        }
    }

    pub fn with_shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shared_dir = Some(dir.into());
        self
    }

    /// Output file of `kind` for `year`.
    pub fn output(&self, kind: FileKind, year: i32) -> PathBuf {
        self.output_dir.join(kind.file_name(year))
    }

    /// Redo list of `year`.
    pub fn redo_list(&self, year: i32) -> PathBuf {
        self.output_dir.join(format!("redo_{}.txt", year))
    }

    /// The topography file, when a shared directory is set and holds one.
    pub fn topography(&self) -> Option<PathBuf> {
        self.shared_dir
            .as_deref()
            .map(|dir| dir.join(TOPOGRAPHY_FILE))
            .filter(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        let paths = Paths::new("/data/slp", "/data/out");
        assert_eq!(
            paths.output(FileKind::Centers, 1979),
            PathBuf::from("/data/out/centers_1979.txt")
        );
        assert_eq!(
            paths.output(FileKind::Attributions, 1979),
            PathBuf::from("/data/out/atts_1979.txt")
        );
        assert_eq!(paths.redo_list(1979), PathBuf::from("/data/out/redo_1979.txt"));
    }

    #[test]
    fn test_missing_topography_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new("/data/slp", "/data/out").with_shared_dir(dir.path());
        assert!(paths.topography().is_none());
        std::fs::write(dir.path().join(TOPOGRAPHY_FILE), "{}").unwrap();
        assert_eq!(paths.topography(), Some(dir.path().join(TOPOGRAPHY_FILE)));
    }
}
