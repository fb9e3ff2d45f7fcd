//! Fixed-interval SLP contour slices.

use cyclone_common::{CycloneError, CycloneResult, FailCheck, Stamp, TrackerConfig};

/// Partition of the grid into SLP slices `[floor(s), top(s))`.
///
/// Values below the lowest slice fall into slice 0 and values above the
/// highest into the last slice, so every grid belongs to exactly one slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourSlices {
    base: i64,
    interval: i64,
    slice_of: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl ContourSlices {
    /// Slice a working-unit SLP field.
    ///
    /// `lowest_center` is the working SLP of the deepest center, if any;
    /// when it lies below the configured minimum contour the slices are
    /// shifted down so that center sits in its own slice.
    pub fn build(slp: &[i64], config: &TrackerConfig, lowest_center: Option<i64>) -> Self {
        let interval = config.to_working(config.interval).max(1);
        let mut base = config.to_working(config.min_contour);
        if let Some(low) = lowest_center {
            base = base.min(low.div_euclid(interval) * interval);
        }
        let top = config.to_working(config.max_contour);
        let count = ((top - base).div_euclid(interval) + 1).max(1) as usize;

        let mut members = vec![Vec::new(); count];
        let slice_of: Vec<usize> = slp
            .iter()
            .enumerate()
            .map(|(g, &v)| {
                let s = (v - base).div_euclid(interval).clamp(0, count as i64 - 1) as usize;
                members[s].push(g);
                s
            })
            .collect();

        Self {
            base,
            interval,
            slice_of,
            members,
        }
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Slice holding grid `g`.
    pub fn slice_of(&self, g: usize) -> usize {
        self.slice_of[g]
    }

    /// Grids of slice `s`, ascending.
    pub fn grids(&self, s: usize) -> &[usize] {
        &self.members[s]
    }

    /// Lower bound of slice `s` in working units.
    pub fn floor(&self, s: usize) -> i64 {
        self.base + s as i64 * self.interval
    }

    /// Exclusive upper bound of slice `s` in working units.
    pub fn top(&self, s: usize) -> i64 {
        self.floor(s + 1)
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// Verify the slices are disjoint and together hold every grid.
    pub fn check_partition(&self, stamp: &Stamp) -> CycloneResult<()> {
        let maxid = self.slice_of.len();
        let mut seen = vec![false; maxid];
        for (s, grids) in self.members.iter().enumerate() {
            for &g in grids {
                if g >= maxid || seen[g] || self.slice_of[g] != s {
                    return Err(CycloneError::invariant(
                        stamp.to_string(),
                        FailCheck::ContourPartition.code(),
                        format!("grid {} held by more than one contour slice", g),
                    ));
                }
                seen[g] = true;
            }
        }
        if let Some(g) = seen.iter().position(|&s| !s) {
            return Err(CycloneError::invariant(
                stamp.to_string(),
                FailCheck::ContourPartition.code(),
                format!("grid {} is in no contour slice", g),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slices_partition_and_clamp() {
        let config = TrackerConfig::default();
        let slp = vec![900_000, 940_000, 941_999, 995_000, 1_031_999, 1_100_000];
        let slices = ContourSlices::build(&slp, &config, None);
        assert_eq!(slices.len(), 46);
        assert_eq!(slices.slice_of(0), 0);
        assert_eq!(slices.slice_of(1), 0);
        assert_eq!(slices.slice_of(2), 0);
        assert_eq!(slices.slice_of(3), 27);
        assert_eq!(slices.slice_of(4), 45);
        assert_eq!(slices.slice_of(5), 45);
        assert_eq!(slices.floor(27), 994_000);
        assert_eq!(slices.top(27), 996_000);
        slices.check_partition(&Stamp::new(1979, 1, 1, 0)).unwrap();
    }

    #[test]
    fn test_deep_center_shifts_base() {
        let config = TrackerConfig::default();
        let slp = vec![931_500, 1_000_000];
        let slices = ContourSlices::build(&slp, &config, Some(931_500));
        assert_eq!(slices.floor(0), 930_000);
        assert_eq!(slices.slice_of(0), 0);
        assert_eq!(slices.len(), 51);
        assert!(slices.floor(slices.slice_of(1)) <= 1_000_000);
        assert!(slices.top(slices.slice_of(1)) > 1_000_000);
    }

    #[test]
    fn test_corrupted_partition_is_an_invariant_error() {
        let config = TrackerConfig::default();
        let mut slices = ContourSlices::build(&[1_000_000, 1_000_000], &config, None);
        let s = slices.slice_of(0);
        slices.members[s].push(0);
        let err = slices.check_partition(&Stamp::new(1979, 1, 1, 0)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
