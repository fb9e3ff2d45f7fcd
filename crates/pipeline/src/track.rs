//! The track stage: centers and tracks of one year.

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

use cyclone_common::CycloneResult;
use detection::CenterFinder;
use records::{FileKind, Header, Record, RecordWriter};
use tracking::{Track, Tracker};

use crate::redo::{RedoList, Stage};
use crate::runner::{header_for, write_records, Pipeline};

/// What the track stage produced for one year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackReport {
    pub year: i32,
    pub steps: usize,
    pub centers: usize,
    pub problematic: usize,
    pub tracks: usize,
    pub warnings: usize,
}

impl Pipeline {
    /// Find the centers of every step of `year`, stitch them into tracks and
    /// write `centers_<year>.txt` and `tracks_<year>.txt`.
    ///
    /// Nothing is written when the run fails or is cancelled.
    #[instrument(skip(self))]
    pub fn track_year(&self, year: i32) -> CycloneResult<TrackReport> {
        let started = Instant::now();
        let (slp, geo) = self.load_year(year)?;
        let config = &self.config;
        let finder = CenterFinder::new(&geo, config);
        let mut tracker = Tracker::new(&geo, config);

        let mut report = TrackReport {
            year,
            steps: slp.steps(),
            ..TrackReport::default()
        };
        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut previous = None;
        for k in 0..slp.steps() {
            let stamp = slp.axis.stamps[k];
            self.cancel.check(&stamp)?;
            let field = slp.quantized(k, config.read_scale);
            let abs_time = slp.axis.absolute_time(k)?;
            let mut found = finder.find(&stamp, abs_time, &field, previous)?;
            let summary = tracker.step(&mut found.centers);
            debug!(
                stamp = %stamp,
                centers = found.centers.len(),
                matched = summary.matched,
                opened = summary.opened,
                retired = summary.retired,
                "Tracked step"
            );
            previous = Some(found.centers.len());
            report.centers += found.centers.len();
            report.problematic += found.problematic.len();
            records.extend(found.centers.into_iter().map(Record::Center));
            records.extend(found.problematic.into_iter().map(Record::Problematic));
            warnings.extend(found.warnings);
        }
        let tracks = tracker.finish();
        report.tracks = tracks.len();
        report.warnings = warnings.len();

        let centers_path = self.paths.output(FileKind::Centers, year);
        write_records(&centers_path, &header_for(FileKind::Centers, &slp), &records)?;
        let tracks_path = self.paths.output(FileKind::Tracks, year);
        write_tracks(&tracks_path, &header_for(FileKind::Tracks, &slp), &tracks)?;

        let redo_path = self.paths.redo_list(year);
        let mut redo = RedoList::load(&redo_path)?;
        redo.replace(Stage::Track, |_| true, warnings);
        redo.save(&redo_path)?;

        info!(
            year,
            steps = report.steps,
            centers = report.centers,
            tracks = report.tracks,
            warnings = report.warnings,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Track stage complete"
        );
        Ok(report)
    }
}

/// Exported tracks in USI order, each headed by a `# track <usi> <length>`
/// comment.
fn write_tracks(path: &Path, header: &Header, tracks: &[Track]) -> CycloneResult<usize> {
    let mut writer = RecordWriter::create(path, header)?;
    for track in tracks {
        writer.comment(&format!("track {} {}", track.usi, track.len()))?;
        for member in &track.members {
            writer.write(&Record::Center(member.clone()))?;
        }
    }
    Ok(writer.finish()?)
}
