//! Cyclone center finder.
//!
//! A grid is a center when it is the strict regional minimum of SLP, the
//! 9-point smoothed field is concave up at it, and the pressure gradient
//! to its neighbors is large enough. Polar and tropical grids are screened
//! out (or only flagged when the screens are off); troubled grids are
//! flagged and, with the troubled filter on, held back as problematic.

pub mod filters;
pub mod finder;

pub use finder::{CenterFinder, StepCenters};
