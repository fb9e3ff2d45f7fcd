//! Cyclone track stitching.
//!
//! Each step, every live track predicts its next position by continuing the
//! great circle through its last two centers. Track/center pairs within the
//! travel radius of the prediction are scored
//!
//! ```text
//! cost = alpha * km + beta * |dSLP hPa| + gamma * latitude_weight
//! ```
//!
//! and consumed greedily in ascending cost, ties going to the lower track
//! USI and then the lower center UCI. Unmatched centers open tracks;
//! unmatched tracks retire at once and are exported only when they pass
//! the age, travel, depth and tropical filters.

pub mod track;
pub mod tracker;

pub use track::Track;
pub use tracker::{latitude_weight, StepSummary, Tracker};
