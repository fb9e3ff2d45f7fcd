//! Common types and utilities shared across the cyclone tracker crates.

pub mod center;
pub mod config;
pub mod error;
pub mod flags;
pub mod grid;
pub mod time;
pub mod warning;

pub use center::{CenterRecord, Intensity, Uci};
pub use config::TrackerConfig;
pub use error::{CycloneError, CycloneResult};
pub use grid::{GridSpec, EARTH_RADIUS_KM};
pub use time::{Calendar, Stamp, TimeAxis};
pub use warning::{FailCheck, FilterWarning};
