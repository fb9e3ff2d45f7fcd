//! Per-year drivers for the cyclone tracker.
//!
//! A year runs in two stages. [`Pipeline::track_year`] reads the year's SLP,
//! finds centers step by step and stitches them into tracks, writing
//! `centers_<year>.txt` and `tracks_<year>.txt`. [`Pipeline::attribute_year`]
//! reads the centers back, attributes grids to them and writes
//! `atts_<year>.txt`. Filter warnings of both stages land in
//! `redo_<year>.txt`, and an attribute run with `redo` re-processes only the
//! stamps listed there.
//!
//! Steps inside a year run strictly in time order. Years are independent:
//! callers may run them on separate threads over one shared [`Pipeline`],
//! which builds each grid's geometry once. Cancellation is honoured between
//! time steps; a cancelled or failed year writes nothing.

pub mod attribute;
pub mod cache;
pub mod cancel;
pub mod paths;
pub mod redo;
pub mod runner;
pub mod track;

pub use attribute::{att_block, step_records, AttributeReport};
pub use cache::GeometryCache;
pub use cancel::CancelToken;
pub use paths::{Paths, TOPOGRAPHY_FILE};
pub use redo::{RedoList, Stage};
pub use runner::Pipeline;
pub use track::TrackReport;
