//! Contour attribution of SLP grids to cyclone centers.
//!
//! The field is cut into fixed-interval slices ([`ContourSlices`]). Each
//! center grows a region outward through successive slices until a growth
//! test stops it; centers whose regions meet inside one contour become a
//! storm sharing the grids beyond that contour. The result per center is an
//! exclusive grid set (ATT), per storm a shared set (ATTS), and the region
//! metrics written to the attribution records.

pub mod attributor;
pub mod bridge;
pub mod metrics;
pub mod slices;

pub use attributor::{resolve_overlaps, Attribution, Attributor, StepAttribution, Storm};
pub use bridge::bridge;
pub use metrics::{NearCenter, RegionMetrics};
pub use slices::ContourSlices;
