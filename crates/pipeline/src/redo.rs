//! Per-year redo lists.
//!
//! One line per filter warning, `YYYYMMDDHH CC message`, sorted by stamp
//! and check number. Both stages share the file: each rewrites only the
//! checks it raises and keeps the other's lines.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use cyclone_common::{CycloneError, CycloneResult, FailCheck, FilterWarning, Stamp};

/// Stage that raises a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Track,
    Attribute,
}

impl Stage {
    pub fn of(check: FailCheck) -> Self {
        match check {
            FailCheck::ContourPartition
            | FailCheck::AttributionOverlap
            | FailCheck::CoverageLow
            | FailCheck::CoverageHigh => Stage::Attribute,
            FailCheck::TooFewCenters
            | FailCheck::TooManyCenters
            | FailCheck::CenterCountJump
            | FailCheck::EmptyRegional => Stage::Track,
        }
    }
}

/// Warnings of one year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedoList {
    entries: Vec<FilterWarning>,
}

impl RedoList {
    pub fn new(mut entries: Vec<FilterWarning>) -> Self {
        sort(&mut entries);
        Self { entries }
    }

    /// Read `path`; a missing file is an empty list.
    pub fn load(path: &Path) -> CycloneResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let mut entries = Vec::new();
        for (k, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            entries.push(parse_line(line).map_err(|e| {
                CycloneError::parse(format!("{} line {}: {}", path.display(), k + 1, e))
            })?);
        }
        Ok(Self::new(entries))
    }

    pub fn save(&self, path: &Path) -> CycloneResult<()> {
        let mut text = String::new();
        for w in &self.entries {
            text.push_str(&format!("{} {:02} {}\n", w.stamp, w.check.code(), w.message));
        }
        fs::write(path, text)?;
        debug!(path = %path.display(), entries = self.entries.len(), "Wrote redo list");
        Ok(())
    }

    pub fn entries(&self) -> &[FilterWarning] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct stamps listed.
    pub fn stamps(&self) -> BTreeSet<Stamp> {
        self.entries.iter().map(|w| w.stamp).collect()
    }

    /// Replace `stage`'s entries at the stamps `redone` selects with `fresh`.
    pub fn replace(
        &mut self,
        stage: Stage,
        redone: impl Fn(&Stamp) -> bool,
        fresh: impl IntoIterator<Item = FilterWarning>,
    ) {
        self.entries
            .retain(|w| Stage::of(w.check) != stage || !redone(&w.stamp));
        self.entries.extend(fresh);
        sort(&mut self.entries);
    }
}

fn sort(entries: &mut Vec<FilterWarning>) {
    entries.sort_by(|a, b| {
        (a.stamp, a.check.code(), &a.message).cmp(&(b.stamp, b.check.code(), &b.message))
    });
    entries.dedup();
}

fn parse_line(line: &str) -> CycloneResult<FilterWarning> {
    let mut parts = line.splitn(3, ' ');
    let stamp = Stamp::parse(parts.next().unwrap_or_default())?;
    let code = parts.next().unwrap_or_default();
    let check = code
        .parse::<u8>()
        .ok()
        .and_then(FailCheck::from_code)
        .ok_or_else(|| CycloneError::parse(format!("unknown check '{}'", code)))?;
    let message = parts.next().unwrap_or_default().trim();
    Ok(FilterWarning::new(stamp, check, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(hour: u32, check: FailCheck) -> FilterWarning {
        FilterWarning::new(Stamp::new(1979, 1, 2, hour), check, "threshold hit")
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redo_1979.txt");
        let list = RedoList::new(vec![
            warning(12, FailCheck::CoverageLow),
            warning(6, FailCheck::TooFewCenters),
        ]);
        list.save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "1979010206 01 threshold hit\n1979010212 06 threshold hit\n"
        );
        assert_eq!(RedoList::load(&path).unwrap(), list);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = RedoList::load(&dir.path().join("redo_1980.txt")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_bad_check_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redo_1979.txt");
        fs::write(&path, "1979010206 42 what\n").unwrap();
        let err = RedoList::load(&path).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_replace_keeps_the_other_stage() {
        let mut list = RedoList::new(vec![
            warning(0, FailCheck::TooManyCenters),
            warning(0, FailCheck::CoverageHigh),
            warning(6, FailCheck::CoverageLow),
        ]);
        let redone = Stamp::new(1979, 1, 2, 0);
        list.replace(Stage::Attribute, |s| *s == redone, Vec::new());
        assert_eq!(
            list.entries(),
            &[
                warning(0, FailCheck::TooManyCenters),
                warning(6, FailCheck::CoverageLow)
            ]
        );
        assert_eq!(list.stamps().len(), 2);
    }
}
