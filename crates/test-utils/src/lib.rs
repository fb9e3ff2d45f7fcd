//! Shared test utilities for the cyclone tracker workspace.
//!
//! - Synthetic SLP fields: uniform, Gaussian lows, seeded noise
//! - On-disk fixtures in the raw year format, plus topography files
//! - `assert_approx_eq!` for distances, areas and bearings
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Tolerance used by the two-argument form of [`assert_approx_eq!`].
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Assert two numbers agree to within a tolerance (default
/// [`DEFAULT_TOLERANCE`]). Both sides are compared as `f64`.
///
/// ```ignore
/// assert_approx_eq!(geo.distance(a, b), 277.5, 0.1);
/// assert_approx_eq!(total_area / sphere, 1.0);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, $crate::DEFAULT_TOLERANCE)
    };
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let (left, right, tolerance) = ($left as f64, $right as f64, $tolerance as f64);
        if !((left - right).abs() <= tolerance) {
            panic!(
                "values differ: {} = {:?}, {} = {:?}, |diff| = {:?} > {:?}",
                stringify!($left),
                left,
                stringify!($right),
                right,
                (left - right).abs(),
                tolerance
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_close_values_pass() {
        assert_approx_eq!(1012.0004, 1012.0, 0.001);
        assert_approx_eq!(-45.0_f32, -45.0000001_f64);
    }

    #[test]
    #[should_panic(expected = "values differ")]
    fn test_distant_values_fail() {
        assert_approx_eq!(277.5, 278.0, 0.1);
    }

    #[test]
    #[should_panic(expected = "values differ")]
    fn test_nan_never_passes() {
        assert_approx_eq!(f64::NAN, f64::NAN, 1.0);
    }
}
