//! Joining slice grids into connected segments.

use geometry::Geometry;

/// Group `grids` into 8-connected segments.
///
/// Connectivity follows the grid's neighbor table, so segments run across
/// the date line and over the poles. Each segment is sorted ascending and
/// segments are ordered by their lowest grid, which makes the result a pure
/// function of the set of grids: bridging the union of the output again
/// returns the same segments.
pub fn bridge(geo: &Geometry, grids: &[usize]) -> Vec<Vec<usize>> {
    let mut member = vec![false; geo.maxid()];
    for &g in grids {
        member[g] = true;
    }

    let mut segments = Vec::new();
    let mut stack = Vec::new();
    for seed in 0..member.len() {
        if !member[seed] {
            continue;
        }
        member[seed] = false;
        stack.push(seed);
        let mut segment = Vec::new();
        while let Some(g) = stack.pop() {
            segment.push(g);
            for &n in geo.neighbors(g) {
                if member[n] {
                    member[n] = false;
                    stack.push(n);
                }
            }
        }
        segment.sort_unstable();
        segments.push(segment);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclone_common::{GridSpec, TrackerConfig};

    fn geo() -> Geometry {
        let spec = GridSpec::regular(2.5, 2.5).unwrap();
        Geometry::build(spec, &TrackerConfig::default(), 6, None).unwrap()
    }

    #[test]
    fn test_segments_join_across_date_line() {
        let geo = geo();
        let s = &geo.spec;
        let grids = [s.grid_id(143, 54), s.grid_id(0, 54), s.grid_id(1, 55)];
        let segments = bridge(&geo, &grids);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 3);
    }

    #[test]
    fn test_diagonal_counts_as_connected() {
        let geo = geo();
        let s = &geo.spec;
        let segments = bridge(&geo, &[s.grid_id(10, 30), s.grid_id(11, 31), s.grid_id(20, 30)]);
        assert_eq!(segments, vec![vec![s.grid_id(10, 30), s.grid_id(11, 31)], vec![s.grid_id(20, 30)]]);
    }

    #[test]
    fn test_bridge_is_idempotent() {
        let geo = geo();
        let s = &geo.spec;
        let grids: Vec<usize> = [(140, 50), (143, 50), (0, 51), (70, 20), (71, 20), (72, 72), (0, 72)]
            .iter()
            .map(|&(i, j)| s.grid_id(i, j))
            .collect();
        let once = bridge(&geo, &grids);
        let flat: Vec<usize> = once.iter().flatten().copied().collect();
        assert_eq!(bridge(&geo, &flat), once);
        for segment in &once {
            assert_eq!(bridge(&geo, segment), vec![segment.clone()]);
        }
        // Input order does not matter.
        let mut reversed = grids.clone();
        reversed.reverse();
        assert_eq!(bridge(&geo, &reversed), once);
    }

    #[test]
    fn test_empty_slice() {
        assert!(bridge(&geo(), &[]).is_empty());
    }
}
