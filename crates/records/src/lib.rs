//! Line-oriented text records.
//!
//! Every line is a center record, optionally followed by an attribution
//! block. A leading sentinel marks empty centers (`-999`), shared storm
//! regions (`-888`) and problematic centers (`-777`). Files start with `#`
//! header lines naming the file kind, year, grid size and time step.

pub mod error;
pub mod file;
pub mod line;
pub mod record;

pub use error::{RecordError, RecordResult};
pub use file::{read_record_file, read_records, FileKind, Header, RecordFile, RecordWriter};
pub use line::{encode_block, encode_center, AttBlock};
pub use record::{Record, EMPTY_SENTINEL, PROBLEMATIC_SENTINEL, SHARED_SENTINEL};
