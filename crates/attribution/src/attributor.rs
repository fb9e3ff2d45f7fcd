//! Per-step attribution of grids to centers.
//!
//! Every center starts as a one-grid region. Slices are visited from the
//! lowest pressure upward; at each slice the unowned grids below the slice
//! top are bridged into segments, and a region grows by the segments it
//! touches unless the wander, flare or hill test rejects the growth.
//! Regions that reach the same segment are entangled into a storm whose
//! further growth is shared.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use cyclone_common::{
    flags, CenterRecord, CycloneError, CycloneResult, FailCheck, FilterWarning, Stamp,
    TrackerConfig, Uci,
};
use geometry::{nb, Geometry};

use crate::bridge::bridge;
use crate::metrics::{measure, nearest_centers, NearCenter, RegionMetrics};
use crate::slices::ContourSlices;

/// Attribution of one center at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    /// The center, with the EMPTY and ENTANGLED flags set as they apply.
    pub center: CenterRecord,
    /// Exclusive grids, ascending. Always holds the center grid.
    pub att: Vec<usize>,
    /// Outer contour in working units.
    pub outer_contour: i64,
    /// Index into [`StepAttribution::storms`] when entangled.
    pub storm: Option<usize>,
    pub metrics: RegionMetrics,
}

impl Attribution {
    pub fn is_empty(&self) -> bool {
        self.center.has_flag(flags::EMPTY)
    }
}

/// Entangled centers enclosed by one shared outer contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Storm {
    /// Indices into [`StepAttribution::attributions`], primary first.
    pub members: Vec<usize>,
    /// Shared grids, ascending.
    pub atts: Vec<usize>,
    pub outer_contour: i64,
    /// Measured over every member's ATT plus ATTS from the primary center;
    /// the nearest entries are the first two partners.
    pub metrics: RegionMetrics,
}

impl Storm {
    pub fn primary(&self) -> usize {
        self.members[0]
    }
}

/// Everything attributed at one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepAttribution {
    /// One per input center, in input order.
    pub attributions: Vec<Attribution>,
    pub storms: Vec<Storm>,
    pub warnings: Vec<FilterWarning>,
}

impl StepAttribution {
    /// Exclusive plus shared grid count.
    pub fn attributed_grids(&self) -> usize {
        self.attributions.iter().map(|a| a.att.len()).sum::<usize>()
            + self.storms.iter().map(|s| s.atts.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitState {
    Active,
    Inactive,
    Absorbed,
}

/// A growing region: a single center, or a storm after entanglement.
#[derive(Debug)]
struct Unit {
    /// Center indices in rank order; the first is the primary.
    members: Vec<usize>,
    footprint: Vec<usize>,
    shared: Vec<usize>,
    start: usize,
    outer: i64,
    state: UnitState,
}

/// Units reaching the segments of one slice.
#[derive(Debug, Default)]
struct Group {
    units: Vec<usize>,
    segments: Vec<usize>,
    blocked: bool,
}

/// Attributes SLP grids to the centers of one step.
pub struct Attributor<'a> {
    geo: &'a Geometry,
    config: &'a TrackerConfig,
}

impl<'a> Attributor<'a> {
    pub fn new(geo: &'a Geometry, config: &'a TrackerConfig) -> Self {
        Self { geo, config }
    }

    /// Attribute the working-unit field `slp` to `centers`.
    pub fn attribute(
        &self,
        stamp: &Stamp,
        slp: &[i64],
        centers: &[CenterRecord],
    ) -> CycloneResult<StepAttribution> {
        let geo = self.geo;
        if slp.len() != geo.maxid() {
            return Err(CycloneError::data(format!(
                "{}: field has {} cells, grid has {}",
                stamp,
                slp.len(),
                geo.maxid()
            )));
        }
        if let Some(c) = centers.iter().find(|c| c.grid_id >= geo.maxid()) {
            return Err(CycloneError::data(format!(
                "{}: center {} lies off the grid",
                stamp, c.uci
            )));
        }

        let lowest = centers.iter().map(|c| slp[c.grid_id]).min();
        let slices = ContourSlices::build(slp, self.config, lowest);
        slices.check_partition(stamp)?;

        let mut growth = Growth::new(geo, self.config, slp, &slices, centers, stamp)?;
        growth.grow();
        growth.fill_holes();

        let mut step = growth.finish(centers);
        step.warnings.extend(resolve_overlaps(stamp, &mut step.attributions, slp)?);
        self.measure_all(&mut step, slp);
        step.warnings.extend(self.coverage(stamp, &step));

        for w in &step.warnings {
            warn!(stamp = %stamp, check = w.check.code(), "{}", w.message);
        }
        debug!(
            stamp = %stamp,
            centers = centers.len(),
            storms = step.storms.len(),
            empty = step.attributions.iter().filter(|a| a.is_empty()).count(),
            grids = step.attributed_grids(),
            "Attributed step"
        );
        Ok(step)
    }

    fn measure_all(&self, step: &mut StepAttribution, slp: &[i64]) {
        let (geo, config) = (self.geo, self.config);
        let grids: Vec<(usize, Uci)> = step
            .attributions
            .iter()
            .map(|a| (a.center.grid_id, a.center.uci))
            .collect();

        let metrics: Vec<RegionMetrics> = step
            .attributions
            .par_iter()
            .enumerate()
            .map(|(k, a)| {
                let g = a.center.grid_id;
                let mut m = measure(geo, config, g, &a.att, a.outer_contour, slp[g]);
                let others = grids
                    .iter()
                    .enumerate()
                    .filter(|&(o, _)| o != k)
                    .map(|(_, &pair)| pair);
                (m.nearest, m.nearest_alt) = nearest_centers(geo, g, others);
                m
            })
            .collect();
        for (a, m) in step.attributions.iter_mut().zip(metrics) {
            a.metrics = m;
        }

        for storm in &mut step.storms {
            let primary = &step.attributions[storm.primary()];
            let g = primary.center.grid_id;
            let mut region: Vec<usize> = storm
                .members
                .iter()
                .flat_map(|&k| step.attributions[k].att.iter().copied())
                .chain(storm.atts.iter().copied())
                .collect();
            region.sort_unstable();
            let mut m = measure(geo, config, g, &region, storm.outer_contour, slp[g]);
            let partner = |k: usize| {
                let other = &step.attributions[k].center;
                NearCenter {
                    distance_km: geo.distance(g, other.grid_id),
                    bearing_deg: geo.bearing(g, other.grid_id),
                    uci: other.uci,
                }
            };
            m.nearest = storm.members.get(1).map(|&k| partner(k));
            m.nearest_alt = storm.members.get(2).map(|&k| partner(k));
            storm.metrics = m;
        }
    }

    /// Attributed share of the extratropical grid outside the configured bounds.
    fn coverage(&self, stamp: &Stamp, step: &StepAttribution) -> Vec<FilterWarning> {
        if step.attributions.is_empty() {
            return Vec::new();
        }
        let total = step.attributed_grids() as f64;
        let n = self.geo.extratropical_count().max(1) as f64;
        let share = total / n;
        if share < self.config.coverage_min {
            vec![FilterWarning::new(
                *stamp,
                FailCheck::CoverageLow,
                format!("{:.2}% of extratropical grids attributed", share * 100.0),
            )]
        } else if share > self.config.coverage_max {
            vec![FilterWarning::new(
                *stamp,
                FailCheck::CoverageHigh,
                format!("{:.2}% of extratropical grids attributed", share * 100.0),
            )]
        } else {
            Vec::new()
        }
    }
}

/// Mutable state of one step's growth.
struct Growth<'s> {
    geo: &'s Geometry,
    config: &'s TrackerConfig,
    slp: &'s [i64],
    slices: &'s ContourSlices,
    grid_of: Vec<usize>,
    rank_of: Vec<usize>,
    units: Vec<Unit>,
    owner: Vec<Option<usize>>,
    att: Vec<Vec<usize>>,
}

impl<'s> Growth<'s> {
    fn new(
        geo: &'s Geometry,
        config: &'s TrackerConfig,
        slp: &'s [i64],
        slices: &'s ContourSlices,
        centers: &[CenterRecord],
        stamp: &Stamp,
    ) -> CycloneResult<Self> {
        let grid_of: Vec<usize> = centers.iter().map(|c| c.grid_id).collect();
        let mut order: Vec<usize> = (0..centers.len()).collect();
        order.sort_by_key(|&k| (slp[grid_of[k]], grid_of[k]));
        let mut rank_of = vec![0; centers.len()];
        for (rank, &k) in order.iter().enumerate() {
            rank_of[k] = rank;
        }

        let mut owner = vec![None; geo.maxid()];
        let mut units = Vec::with_capacity(order.len());
        for (u, &k) in order.iter().enumerate() {
            let g = grid_of[k];
            if owner[g].is_some() {
                return Err(CycloneError::data(format!(
                    "{}: two centers on grid {}",
                    stamp, g
                )));
            }
            owner[g] = Some(u);
            units.push(Unit {
                members: vec![k],
                footprint: vec![g],
                shared: Vec::new(),
                start: slices.slice_of(g),
                outer: slp[g],
                state: UnitState::Active,
            });
        }

        Ok(Self {
            geo,
            config,
            slp,
            slices,
            att: grid_of.iter().map(|&g| vec![g]).collect(),
            grid_of,
            rank_of,
            units,
            owner,
        })
    }

    fn participates(&self, u: usize, s: usize) -> bool {
        let unit = &self.units[u];
        unit.state == UnitState::Active && unit.start <= s
    }

    /// Visit every slice from the lowest center upward.
    fn grow(&mut self) {
        let Some(first) = self.units.iter().map(|u| u.start).min() else {
            return;
        };
        for s in first..self.slices.len() {
            if !self.units.iter().any(|u| u.state == UnitState::Active) {
                break;
            }
            let top = self.slices.top(s);
            let segments = self.pool_segments(s, top);
            let groups = self.group(s, &segments);

            let mut touched = vec![false; self.units.len()];
            for group in groups.into_values() {
                for &u in &group.units {
                    touched[u] = true;
                }
                let mut candidate: Vec<usize> = group
                    .segments
                    .iter()
                    .flat_map(|&k| segments[k].iter().copied())
                    .collect();
                candidate.sort_unstable();
                self.advance(s, &group.units, candidate, group.blocked);
            }
            // Nothing left to reach below this contour.
            for u in 0..self.units.len() {
                if !touched[u] && self.participates(u, s) {
                    self.units[u].outer = top;
                }
            }
        }
    }

    /// Unowned grids below `top` bridged into segments, one hemisphere at a time.
    fn pool_segments(&self, s: usize, top: i64) -> Vec<Vec<usize>> {
        let spec = &self.geo.spec;
        let (mut south, mut north) = (Vec::new(), Vec::new());
        for k in 0..=s {
            for &g in self.slices.grids(k) {
                if self.owner[g].is_some() || self.slp[g] >= top {
                    continue;
                }
                match spec.hemisphere(g) {
                    1 => north.push(g),
                    -1 => south.push(g),
                    _ => {}
                }
            }
        }
        let mut segments = bridge(self.geo, &south);
        segments.extend(bridge(self.geo, &north));
        segments
    }

    /// Join participating units reaching a common segment.
    ///
    /// Groups are keyed by their lowest-ranked unit. A segment touching an
    /// inactive unit blocks every group reaching it.
    fn group(&self, s: usize, segments: &[Vec<usize>]) -> BTreeMap<usize, Group> {
        let mut parent: Vec<usize> = (0..self.units.len()).collect();
        fn find(parent: &mut [usize], mut u: usize) -> usize {
            while parent[u] != u {
                parent[u] = parent[parent[u]];
                u = parent[u];
            }
            u
        }

        let mut reach = Vec::with_capacity(segments.len());
        for segment in segments {
            let mut touching = BTreeSet::new();
            for &g in segment {
                for &n in self.geo.neighbors(g) {
                    if let Some(u) = self.owner[n] {
                        touching.insert(u);
                    }
                }
            }
            let blocked = touching
                .iter()
                .any(|&u| self.units[u].state == UnitState::Inactive);
            let active: Vec<usize> = touching
                .into_iter()
                .filter(|&u| self.participates(u, s))
                .collect();
            for &u in active.iter().skip(1) {
                let (a, b) = (find(&mut parent, active[0]), find(&mut parent, u));
                let (lo, hi) = (a.min(b), a.max(b));
                parent[hi] = lo;
            }
            reach.push((active, blocked));
        }

        let mut groups: BTreeMap<usize, Group> = BTreeMap::new();
        for u in 0..self.units.len() {
            if self.participates(u, s) {
                let root = find(&mut parent, u);
                if root != u || reach.iter().any(|(a, _)| a.contains(&u)) {
                    groups.entry(root).or_default().units.push(u);
                }
            }
        }
        for (k, (active, blocked)) in reach.into_iter().enumerate() {
            if let Some(&u) = active.first() {
                let root = find(&mut parent, u);
                if let Some(group) = groups.get_mut(&root) {
                    group.segments.push(k);
                    group.blocked |= blocked;
                }
            }
        }
        groups
    }

    /// Apply the wander, flare and hill tests to one group's growth at
    /// slice `s`, then commit what survives.
    fn advance(&mut self, s: usize, group: &[usize], mut candidate: Vec<usize>, blocked: bool) {
        if blocked {
            self.deactivate(group, s, "touches a finished region");
            return;
        }
        let members: Vec<usize> = group
            .iter()
            .flat_map(|&u| self.units[u].members.iter().copied())
            .collect();
        let size: usize = group.iter().map(|&u| self.units[u].footprint.len()).sum();

        if candidate.iter().any(|&g| !self.within_reach(&members, g)) {
            self.deactivate(group, s, "wander");
            return;
        }
        if size >= self.config.check_inflate
            && candidate.len() as f64 >= self.config.inflated * size as f64
        {
            self.deactivate(group, s, "flare");
            return;
        }
        if size >= self.config.check_flare && self.gap_count(s, group, &candidate) > size {
            candidate.retain(|&g| {
                self.geo
                    .neighbors(g)
                    .iter()
                    .any(|&n| self.owner[n].is_some_and(|u| group.contains(&u)))
            });
        }

        let target = group[0];
        for &other in &group[1..] {
            self.absorb(target, other);
        }
        let storm = self.units[target].members.len() > 1;
        for &g in &candidate {
            self.owner[g] = Some(target);
        }
        let unit = &mut self.units[target];
        unit.footprint.extend_from_slice(&candidate);
        if storm {
            unit.shared.extend_from_slice(&candidate);
        } else {
            self.att[unit.members[0]].extend_from_slice(&candidate);
        }
        unit.outer = self.slices.top(s);
    }

    fn deactivate(&mut self, group: &[usize], s: usize, reason: &str) {
        for &u in group {
            self.units[u].state = UnitState::Inactive;
        }
        debug!(units = group.len(), slice = s, reason, "Region stopped growing");
    }

    /// Fold unit `other` into `target`.
    fn absorb(&mut self, target: usize, other: usize) {
        let taken = std::mem::replace(
            &mut self.units[other],
            Unit {
                members: Vec::new(),
                footprint: Vec::new(),
                shared: Vec::new(),
                start: 0,
                outer: 0,
                state: UnitState::Absorbed,
            },
        );
        for &g in &taken.footprint {
            self.owner[g] = Some(target);
        }
        let rank_of = &self.rank_of;
        let unit = &mut self.units[target];
        unit.members.extend(taken.members);
        unit.members.sort_by_key(|&k| rank_of[k]);
        unit.footprint.extend(taken.footprint);
        unit.shared.extend(taken.shared);
        unit.outer = unit.outer.max(taken.outer);
    }

    /// Whether `g` lies within the scaled regional screen of any member.
    fn within_reach(&self, members: &[usize], g: usize) -> bool {
        let geo = self.geo;
        members.iter().any(|&k| {
            let c = self.grid_of[k];
            geo.in_regional(c, g)
                && geo.distance(c, g) <= self.config.scale_b * geo.regional_radius_km(c)
        })
    }

    /// Grids above slice `s` left inside the group's row spans once the
    /// candidate is added. The widest run of each row is taken as outside.
    fn gap_count(&self, s: usize, group: &[usize], candidate: &[usize]) -> usize {
        let spec = &self.geo.spec;
        let rows: BTreeSet<usize> = candidate.iter().map(|&g| spec.row(g)).collect();
        let mut gaps = 0;
        for j in rows {
            let covered: Vec<usize> = (0..spec.im)
                .filter(|&i| {
                    let g = spec.grid_id(i, j);
                    candidate.binary_search(&g).is_ok()
                        || self.owner[g].is_some_and(|u| group.contains(&u))
                })
                .collect();
            if covered.len() < 2 {
                continue;
            }
            let runs: Vec<(usize, usize)> = (0..covered.len())
                .filter_map(|w| {
                    let a = covered[w];
                    let b = covered[(w + 1) % covered.len()];
                    let len = (b + spec.im - a - 1) % spec.im;
                    (len > 0).then_some((a + 1, len))
                })
                .collect();
            let widest = runs
                .iter()
                .enumerate()
                .max_by_key(|(_, r)| r.1)
                .map(|(k, _)| k);
            for (k, &(start, len)) in runs.iter().enumerate() {
                if Some(k) == widest {
                    continue;
                }
                gaps += (0..len)
                    .map(|d| spec.grid_id((start + d) % spec.im, j))
                    .filter(|&g| self.slices.slice_of(g) > s)
                    .count();
            }
        }
        gaps
    }

    /// Claim unowned grids enclosed by a region, no higher than its outer
    /// contour.
    fn fill_holes(&mut self) {
        let spec = &self.geo.spec;
        for u in 0..self.units.len() {
            if self.units[u].state == UnitState::Absorbed {
                continue;
            }
            let rows: Vec<usize> = self.units[u].footprint.iter().map(|&g| spec.row(g)).collect();
            let (Some(&jmin), Some(&jmax)) = (rows.iter().min(), rows.iter().max()) else {
                continue;
            };
            let lo = jmin.saturating_sub(1);
            let hi = (jmax + 1).min(spec.jm - 1);
            let open_row = |j: usize| (j == lo && jmin > 0) || (j == hi && jmax < spec.jm - 1);

            let mut seen = vec![false; (hi - lo + 1) * spec.im];
            let index = |g: usize| (spec.row(g) - lo) * spec.im + spec.col(g);
            let mut holes = Vec::new();
            for seed in spec.row_start(lo)..=spec.row_end(hi) {
                if seen[index(seed)] || self.owner[seed] == Some(u) {
                    continue;
                }
                seen[index(seed)] = true;
                let mut stack = vec![seed];
                let mut component = Vec::new();
                let mut enclosed = true;
                while let Some(g) = stack.pop() {
                    component.push(g);
                    enclosed &= !open_row(spec.row(g));
                    let n = self.geo.neighbors(g);
                    for k in [nb::UPC, nb::CNM, nb::CNP, nb::DNC] {
                        let m = n[k];
                        let j = spec.row(m);
                        if j < lo || j > hi || seen[index(m)] || self.owner[m] == Some(u) {
                            continue;
                        }
                        seen[index(m)] = true;
                        stack.push(m);
                    }
                }
                if enclosed {
                    holes.extend(component);
                }
            }

            let outer = self.units[u].outer;
            let members = &self.units[u].members;
            holes.retain(|&g| {
                self.owner[g].is_none()
                    && self.slp[g] <= outer
                    && members.iter().any(|&k| self.geo.in_regional(self.grid_of[k], g))
            });
            if holes.is_empty() {
                continue;
            }
            holes.sort_unstable();
            for &g in &holes {
                self.owner[g] = Some(u);
            }
            let unit = &mut self.units[u];
            unit.footprint.extend_from_slice(&holes);
            if unit.members.len() > 1 {
                unit.shared.extend_from_slice(&holes);
            } else {
                self.att[unit.members[0]].extend_from_slice(&holes);
            }
        }
    }

    /// Split the grown state into attributions and storms.
    fn finish(self, centers: &[CenterRecord]) -> StepAttribution {
        let mut outer = vec![0; centers.len()];
        let mut storm_of = vec![None; centers.len()];
        let mut storms = Vec::new();
        for unit in &self.units {
            if unit.state == UnitState::Absorbed {
                continue;
            }
            for &k in &unit.members {
                outer[k] = unit.outer;
            }
            if unit.members.len() > 1 {
                for &k in &unit.members {
                    storm_of[k] = Some(storms.len());
                }
                let mut atts = unit.shared.clone();
                atts.sort_unstable();
                storms.push(Storm {
                    members: unit.members.clone(),
                    atts,
                    outer_contour: unit.outer,
                    metrics: RegionMetrics::default(),
                });
            }
        }

        let attributions = centers
            .iter()
            .zip(self.att)
            .enumerate()
            .map(|(k, (center, mut att))| {
                att.sort_unstable();
                let mut center = center.clone();
                if storm_of[k].is_some() {
                    center.flags |= flags::ENTANGLED;
                } else if att.len() == 1 {
                    center.flags |= flags::EMPTY;
                }
                Attribution {
                    center,
                    att,
                    outer_contour: outer[k],
                    storm: storm_of[k],
                    metrics: RegionMetrics::default(),
                }
            })
            .collect();

        StepAttribution {
            attributions,
            storms,
            warnings: Vec::new(),
        }
    }
}

/// Make the exclusive regions disjoint.
///
/// A grid claimed by two centers stays with the lower `(SLP, grid-ID)`
/// center, except that no center loses its own grid. Any overlap left
/// afterwards is an invariant violation.
pub fn resolve_overlaps(
    stamp: &Stamp,
    attributions: &mut [Attribution],
    slp: &[i64],
) -> CycloneResult<Vec<FilterWarning>> {
    let mut order: Vec<usize> = (0..attributions.len()).collect();
    order.sort_by_key(|&k| {
        let g = attributions[k].center.grid_id;
        (slp[g], g)
    });

    let mut claim: BTreeMap<usize, usize> = BTreeMap::new();
    let mut moved = 0;
    for &k in &order {
        let own = attributions[k].center.grid_id;
        let att = std::mem::take(&mut attributions[k].att);
        let mut kept = Vec::with_capacity(att.len());
        for g in att {
            match claim.get(&g).copied() {
                None => {
                    claim.insert(g, k);
                    kept.push(g);
                }
                Some(holder) if g == own => {
                    attributions[holder].att.retain(|&x| x != g);
                    claim.insert(g, k);
                    kept.push(g);
                    moved += 1;
                }
                Some(_) => moved += 1,
            }
        }
        attributions[k].att = kept;
    }

    let mut seen = BTreeSet::new();
    for a in attributions.iter() {
        if a.att.binary_search(&a.center.grid_id).is_err() {
            return Err(CycloneError::invariant(
                stamp.to_string(),
                FailCheck::AttributionOverlap.code(),
                format!("center {} lost its own grid", a.center.uci),
            ));
        }
        for &g in &a.att {
            if !seen.insert(g) {
                return Err(CycloneError::invariant(
                    stamp.to_string(),
                    FailCheck::AttributionOverlap.code(),
                    format!("grid {} attributed to two centers", g),
                ));
            }
        }
    }

    if moved == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![FilterWarning::new(
        *stamp,
        FailCheck::AttributionOverlap,
        format!("{} contested grids moved to the deeper center", moved),
    )])
}
