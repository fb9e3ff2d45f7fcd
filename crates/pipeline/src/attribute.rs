//! The attribute stage: regions of the centers of one year.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, instrument};

use attribution::{Attributor, RegionMetrics, StepAttribution};
use cyclone_common::{CenterRecord, CycloneError, CycloneResult, Stamp};
use records::{read_record_file, AttBlock, FileKind, Record};

use crate::redo::{RedoList, Stage};
use crate::runner::{check_header, header_for, write_records, Pipeline};

/// What the attribute stage produced for one year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeReport {
    pub year: i32,
    pub steps: usize,
    /// Steps attributed in this run; fewer than `steps` on a redo run
    pub processed: usize,
    pub attributed: usize,
    pub empty: usize,
    pub storms: usize,
    pub warnings: usize,
}

impl Pipeline {
    /// Attribute the centers in `centers_<year>.txt` and write
    /// `atts_<year>.txt`.
    ///
    /// With `redo`, only the stamps in the year's redo list are attributed
    /// again; every other step keeps its lines from the existing file.
    #[instrument(skip(self))]
    pub fn attribute_year(&self, year: i32, redo: bool) -> CycloneResult<AttributeReport> {
        let started = Instant::now();
        let redo_path = self.paths.redo_list(year);
        let mut redo_list = RedoList::load(&redo_path)?;
        let only: Option<BTreeSet<Stamp>> = redo.then(|| redo_list.stamps());
        if only.as_ref().is_some_and(|s| s.is_empty()) {
            info!(year, "Redo list is empty");
            return Ok(AttributeReport {
                year,
                ..AttributeReport::default()
            });
        }

        let (slp, geo) = self.load_year(year)?;
        let config = &self.config;

        let centers_path = self.paths.output(FileKind::Centers, year);
        let centers_file = read_record_file(&centers_path)?;
        check_header(
            &centers_path,
            &centers_file.header,
            &header_for(FileKind::Centers, &slp),
        )?;
        let mut centers: BTreeMap<Stamp, Vec<CenterRecord>> = BTreeMap::new();
        for record in centers_file.records {
            // Problematic centers are never attributed.
            if let Record::Center(c) = record {
                if slp.axis.index_of(&c.stamp).is_none() {
                    return Err(CycloneError::data(format!(
                        "{}: center {} is not on the SLP time axis",
                        centers_path.display(),
                        c.uci
                    )));
                }
                centers.entry(c.stamp).or_default().push(c);
            }
        }

        let atts_path = self.paths.output(FileKind::Attributions, year);
        let atts_header = header_for(FileKind::Attributions, &slp);
        let mut kept: BTreeMap<Stamp, Vec<Record>> = BTreeMap::new();
        if only.is_some() {
            let existing = read_record_file(&atts_path)?;
            check_header(&atts_path, &existing.header, &atts_header)?;
            for record in existing.records {
                kept.entry(record.center().stamp).or_default().push(record);
            }
        }

        let attributor = Attributor::new(&geo, config);
        let mut report = AttributeReport {
            year,
            steps: slp.steps(),
            ..AttributeReport::default()
        };
        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for k in 0..slp.steps() {
            let stamp = slp.axis.stamps[k];
            if let Some(stamps) = &only {
                if !stamps.contains(&stamp) {
                    records.extend(kept.remove(&stamp).unwrap_or_default());
                    continue;
                }
            }
            self.cancel.check(&stamp)?;
            let step_centers = centers.remove(&stamp).unwrap_or_default();
            let field = slp.quantized(k, config.read_scale);
            let step = attributor.attribute(&stamp, &field, &step_centers)?;
            debug!(
                stamp = %stamp,
                centers = step.attributions.len(),
                storms = step.storms.len(),
                grids = step.attributed_grids(),
                "Attributed step"
            );
            report.processed += 1;
            report.storms += step.storms.len();
            for a in &step.attributions {
                if a.is_empty() {
                    report.empty += 1;
                } else {
                    report.attributed += 1;
                }
            }
            records.extend(step_records(&step));
            warnings.extend(step.warnings);
        }
        report.warnings = warnings.len();

        write_records(&atts_path, &atts_header, &records)?;
        redo_list.replace(
            Stage::Attribute,
            |s| only.as_ref().map_or(true, |stamps| stamps.contains(s)),
            warnings,
        );
        redo_list.save(&redo_path)?;

        info!(
            year,
            processed = report.processed,
            attributed = report.attributed,
            empty = report.empty,
            storms = report.storms,
            warnings = report.warnings,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Attribute stage complete"
        );
        Ok(report)
    }
}

/// Lines of one step: a line per center in input order, then one shared
/// line per storm headed by its primary center.
pub fn step_records(step: &StepAttribution) -> Vec<Record> {
    let mut records = Vec::with_capacity(step.attributions.len() + step.storms.len());
    for a in &step.attributions {
        let block = att_block(&a.metrics, &a.att);
        records.push(if a.is_empty() {
            Record::Empty(a.center.clone(), block)
        } else {
            Record::Attributed(a.center.clone(), block)
        });
    }
    for storm in &step.storms {
        let primary = &step.attributions[storm.primary()].center;
        records.push(Record::Shared(
            primary.clone(),
            att_block(&storm.metrics, &storm.atts),
        ));
    }
    records
}

/// Round region metrics to the whole-km fields of an attribution line.
pub fn att_block(metrics: &RegionMetrics, grids: &[usize]) -> AttBlock {
    let km = |v: f64| v.round() as i64;
    AttBlock {
        area_km2: km(metrics.area_km2),
        perimeter_km: km(metrics.perimeter_km),
        min_edge_km: km(metrics.min_edge_km),
        max_edge_km: km(metrics.max_edge_km),
        mean_edge_km: km(metrics.mean_edge_km),
        depth: metrics.depth,
        nearest_km: metrics.nearest.map_or(0, |n| km(n.distance_km)),
        nearest_alt_km: metrics.nearest_alt.map_or(0, |n| km(n.distance_km)),
        nearest_uci: metrics.nearest.map(|n| n.uci),
        nearest_alt_uci: metrics.nearest_alt.map(|n| n.uci),
        grids: grids.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribution::NearCenter;
    use cyclone_common::Uci;

    #[test]
    fn test_att_block_rounds_to_km() {
        let uci = Uci::new(&Stamp::new(1979, 1, 1, 0), 4500, 18000);
        let metrics = RegionMetrics {
            n_grids: 3,
            area_km2: 123_456.6,
            perimeter_km: 801.4,
            min_edge_km: 0.0,
            max_edge_km: 277.5,
            mean_edge_km: 150.49,
            depth: 90,
            nearest: Some(NearCenter {
                distance_km: 1_234.5,
                bearing_deg: 90.0,
                uci,
            }),
            nearest_alt: None,
        };
        let block = att_block(&metrics, &[3, 5, 8]);
        assert_eq!(block.area_km2, 123_457);
        assert_eq!(block.perimeter_km, 801);
        assert_eq!(block.max_edge_km, 278);
        assert_eq!(block.mean_edge_km, 150);
        assert_eq!(block.nearest_km, 1_235);
        assert_eq!(block.nearest_uci, Some(uci));
        assert_eq!(block.nearest_alt_km, 0);
        assert_eq!(block.nearest_alt_uci, None);
        assert_eq!(block.grids, vec![3, 5, 8]);
    }

    #[test]
    fn test_empty_step_has_no_lines() {
        assert!(step_records(&StepAttribution::default()).is_empty());
    }
}
