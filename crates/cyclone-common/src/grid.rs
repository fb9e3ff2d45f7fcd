//! Grid specification for regular global lat/lon SLP grids.
//!
//! Grid cells are addressed by a dense integer grid-ID `j * im + i`, where
//! `j` counts latitude rows from the most southern and `i` counts longitude
//! columns from the column containing the prime meridian.

use serde::{Deserialize, Serialize};

use crate::error::{CycloneError, CycloneResult};

/// Mean Earth radius used for all great-circle work.
pub const EARTH_RADIUS_KM: f64 = 6371.2;

/// Maximum relative deviation from the nominal spacing tolerated in
/// latitude and longitude axes.
pub const SPACING_TOLERANCE: f64 = 1e-6;

/// Specification of a regular global lat/lon grid in normalised order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of longitudes
    pub im: usize,
    /// Number of latitudes
    pub jm: usize,
    /// Longitude spacing in degrees
    pub dlon: f64,
    /// Latitude spacing in degrees
    pub dlat: f64,
    /// Latitudes, south to north
    pub lats: Vec<f64>,
    /// Longitudes in [0, 360), first column contains 0°
    pub lons: Vec<f64>,
}

impl GridSpec {
    /// Build a grid from already normalised axes, rejecting any
    /// ambiguous geometry.
    pub fn from_axes(lats: Vec<f64>, lons: Vec<f64>) -> CycloneResult<Self> {
        if lats.len() < 3 || lons.len() < 4 {
            return Err(CycloneError::geometry(format!(
                "grid too small: {} latitudes x {} longitudes",
                lats.len(),
                lons.len()
            )));
        }
        if lats.iter().chain(lons.iter()).any(|v| !v.is_finite()) {
            return Err(CycloneError::geometry("non-finite coordinate in axis"));
        }
        if lats[0] < -90.0 - SPACING_TOLERANCE || lats[lats.len() - 1] > 90.0 + SPACING_TOLERANCE {
            return Err(CycloneError::geometry("latitudes outside [-90, 90]"));
        }

        let dlat = regular_spacing("latitude", &lats)?;
        let dlon = regular_spacing("longitude", &lons)?;
        if dlat <= 0.0 {
            return Err(CycloneError::geometry("latitudes must increase northward"));
        }
        if dlon <= 0.0 {
            return Err(CycloneError::geometry("longitudes must increase eastward"));
        }

        let span = dlon * lons.len() as f64;
        if ((span - 360.0) / 360.0).abs() > SPACING_TOLERANCE {
            return Err(CycloneError::geometry(format!(
                "longitudes do not wrap the globe: {} x {} = {}",
                lons.len(),
                dlon,
                span
            )));
        }
        if lons[0].rem_euclid(360.0) > dlon * 0.5 && 360.0 - lons[0].rem_euclid(360.0) > dlon * 0.5 {
            return Err(CycloneError::geometry(format!(
                "first longitude {} does not contain the prime meridian",
                lons[0]
            )));
        }

        Ok(Self {
            im: lons.len(),
            jm: lats.len(),
            dlon,
            dlat,
            lats,
            lons: lons.iter().map(|l| l.rem_euclid(360.0)).collect(),
        })
    }

    /// Regular global grid with the given spacing, poles included when the
    /// spacing divides 180°.
    pub fn regular(dlon: f64, dlat: f64) -> CycloneResult<Self> {
        let im = (360.0 / dlon).round() as usize;
        let jm = (180.0 / dlat).round() as usize + 1;
        let lats = (0..jm).map(|j| -90.0 + j as f64 * dlat).collect();
        let lons = (0..im).map(|i| i as f64 * dlon).collect();
        Self::from_axes(lats, lons)
    }

    /// Total number of grid cells.
    pub fn maxid(&self) -> usize {
        self.im * self.jm
    }

    /// Grid-ID of column `i`, row `j`.
    #[inline]
    pub fn grid_id(&self, i: usize, j: usize) -> usize {
        j * self.im + i
    }

    /// Latitude row of a grid-ID.
    #[inline]
    pub fn row(&self, g: usize) -> usize {
        g / self.im
    }

    /// Longitude column of a grid-ID.
    #[inline]
    pub fn col(&self, g: usize) -> usize {
        g % self.im
    }

    /// First grid-ID of row `j`.
    pub fn row_start(&self, j: usize) -> usize {
        j * self.im
    }

    /// Last grid-ID of row `j`.
    pub fn row_end(&self, j: usize) -> usize {
        j * self.im + self.im - 1
    }

    /// Latitude of a grid cell in degrees.
    pub fn lat_of(&self, g: usize) -> f64 {
        self.lats[self.row(g)]
    }

    /// Longitude of a grid cell in degrees east.
    pub fn lon_of(&self, g: usize) -> f64 {
        self.lons[self.col(g)]
    }

    /// Shift a grid-ID `di` columns eastward, wrapping in longitude.
    #[inline]
    pub fn rotate(&self, g: usize, di: usize) -> usize {
        let j = self.row(g);
        let i = (self.col(g) + di) % self.im;
        self.grid_id(i, j)
    }

    /// Column offset that rotates column `from` onto column `to`.
    #[inline]
    pub fn column_offset(&self, from: usize, to: usize) -> usize {
        (to + self.im - from % self.im) % self.im
    }

    /// Nearest grid cell to a geographic position.
    pub fn nearest_grid(&self, lon: f64, lat: f64) -> usize {
        let jf = ((lat - self.lats[0]) / self.dlat).round();
        let j = jf.clamp(0.0, (self.jm - 1) as f64) as usize;
        let rel = (lon - self.lons[0]).rem_euclid(360.0);
        let i = (rel / self.dlon).round() as usize % self.im;
        self.grid_id(i, j)
    }

    /// Colatitude of a grid cell in hundredths of a degree.
    pub fn colat_x100(&self, g: usize) -> u32 {
        ((90.0 - self.lat_of(g)) * 100.0).round().max(0.0) as u32
    }

    /// Longitude of a grid cell in hundredths of a degree.
    pub fn lon_x100(&self, g: usize) -> u32 {
        ((self.lon_of(g) * 100.0).round() as u32) % 36000
    }

    /// Hemisphere of a grid cell: `1` north, `-1` south, `0` on the equator.
    pub fn hemisphere(&self, g: usize) -> i8 {
        let lat = self.lat_of(g);
        if lat > 0.0 {
            1
        } else if lat < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Check that an axis is evenly spaced and return the spacing.
fn regular_spacing(name: &str, axis: &[f64]) -> CycloneResult<f64> {
    let step = axis[1] - axis[0];
    if step == 0.0 {
        return Err(CycloneError::geometry(format!("repeated {} value", name)));
    }
    for (k, pair) in axis.windows(2).enumerate() {
        let d = pair[1] - pair[0];
        if ((d - step) / step).abs() > SPACING_TOLERANCE {
            return Err(CycloneError::geometry(format!(
                "irregular {} spacing at index {}: {} vs {}",
                name,
                k + 1,
                d,
                step
            )));
        }
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_2p5_grid() {
        let grid = GridSpec::regular(2.5, 2.5).unwrap();
        assert_eq!(grid.im, 144);
        assert_eq!(grid.jm, 73);
        assert_eq!(grid.maxid(), 144 * 73);
        assert_eq!(grid.lats[0], -90.0);
        assert_eq!(grid.lats[72], 90.0);
    }

    #[test]
    fn test_grid_id_round_trip() {
        let grid = GridSpec::regular(2.5, 2.5).unwrap();
        let g = grid.grid_id(72, 54);
        assert_eq!(grid.row(g), 54);
        assert_eq!(grid.col(g), 72);
        assert!((grid.lat_of(g) - 45.0).abs() < 1e-9);
        assert!((grid.lon_of(g) - 180.0).abs() < 1e-9);
        assert_eq!(grid.row_start(54), 54 * 144);
        assert_eq!(grid.row_end(54), 54 * 144 + 143);
    }

    #[test]
    fn test_rotate_wraps() {
        let grid = GridSpec::regular(2.5, 2.5).unwrap();
        let g = grid.grid_id(143, 10);
        assert_eq!(grid.rotate(g, 1), grid.grid_id(0, 10));
        assert_eq!(grid.column_offset(143, 0), 1);
    }

    #[test]
    fn test_nearest_grid_wraps_date_line() {
        let grid = GridSpec::regular(2.5, 2.5).unwrap();
        assert_eq!(grid.nearest_grid(-0.5, 0.0), grid.grid_id(0, 36));
        assert_eq!(grid.nearest_grid(359.0, 0.0), grid.grid_id(0, 36));
        assert_eq!(grid.nearest_grid(-180.0, 45.0), grid.grid_id(72, 54));
    }

    #[test]
    fn test_rejects_irregular_latitudes() {
        let lats = vec![-10.0, -7.5, -5.0, -2.0, 0.0];
        let lons = (0..144).map(|i| i as f64 * 2.5).collect();
        assert!(matches!(
            GridSpec::from_axes(lats, lons),
            Err(CycloneError::Geometry(_))
        ));
    }

    #[test]
    fn test_rejects_descending_latitudes() {
        let lats = vec![10.0, 7.5, 5.0, 2.5];
        let lons = (0..144).map(|i| i as f64 * 2.5).collect();
        assert!(GridSpec::from_axes(lats, lons).is_err());
    }

    #[test]
    fn test_rejects_regional_grid() {
        let lats = vec![0.0, 2.5, 5.0, 7.5];
        let lons = (0..40).map(|i| i as f64 * 2.5).collect();
        assert!(GridSpec::from_axes(lats, lons).is_err());
    }

    #[test]
    fn test_colat_and_lon_encoding() {
        let grid = GridSpec::regular(2.5, 2.5).unwrap();
        let g = grid.grid_id(1, 0);
        assert_eq!(grid.colat_x100(g), 18000);
        assert_eq!(grid.lon_x100(g), 250);
        assert_eq!(grid.hemisphere(g), -1);
        assert_eq!(grid.hemisphere(grid.grid_id(0, 36)), 0);
    }
}
