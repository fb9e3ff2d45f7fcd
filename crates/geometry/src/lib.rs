//! Grid geometry precomputation for the cyclone tracker.
//!
//! Everything here is built once per grid and configuration and is
//! read-only afterwards, so a single [`Geometry`] can be shared across
//! year workers behind an `Arc`.
//!
//! # Longitude invariance
//!
//! On a regular lat/lon grid the distance between two cells only depends on
//! their rows and on the difference of their columns. Every per-cell lookup
//! is therefore stored once per row, relative to column 0, and rotated onto
//! the requested column on access:
//!
//! ```text
//! distance(g1, g2) = distance_lookup[row(g1)][rotate(g2, -col(g1))]
//! regional(g)      = { rotate(t, col(g)) : t in regional_template[row(g)] }
//! ```

pub mod geo;
pub mod setup;
pub mod terrain;

pub use geo::{
    cell_area_km2, destination, great_circle_km, initial_bearing, lon_delta, rhumb_bearing,
};
pub use setup::{nb, regional_radius_km, Geometry, Neighbors};
pub use terrain::Terrain;
