//! Reordering of source axes onto the canonical grid layout.

use cyclone_common::GridSpec;

use crate::error::{ReaderError, ReaderResult};

/// How source rows and columns map onto the normalised grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisOrder {
    /// Source latitudes run north to south.
    pub flip_lat: bool,
    /// Source column that becomes column 0.
    pub lon_shift: usize,
    pub im: usize,
    pub jm: usize,
}

impl AxisOrder {
    /// Work out the reordering for the given source axes and return it with
    /// the normalised grid.
    pub fn resolve(lats: &[f64], lons: &[f64]) -> ReaderResult<(Self, GridSpec)> {
        if lats.len() < 2 || lons.is_empty() {
            return Err(ReaderError::InvalidFormat(format!(
                "degenerate axes: {} latitudes, {} longitudes",
                lats.len(),
                lons.len()
            )));
        }
        let flip_lat = lats[0] > lats[lats.len() - 1];
        let mut norm_lats = lats.to_vec();
        if flip_lat {
            norm_lats.reverse();
        }

        let wrapped: Vec<f64> = lons.iter().map(|l| l.rem_euclid(360.0)).collect();
        // Column nearest the prime meridian from the east side of the seam
        let lon_shift = wrapped
            .iter()
            .enumerate()
            .min_by(|a, b| seam_distance(*a.1).total_cmp(&seam_distance(*b.1)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mut norm_lons = Vec::with_capacity(lons.len());
        norm_lons.extend_from_slice(&wrapped[lon_shift..]);
        norm_lons.extend_from_slice(&wrapped[..lon_shift]);
        // Keep the axis increasing across the seam for spacing checks
        for k in 1..norm_lons.len() {
            while norm_lons[k] < norm_lons[k - 1] {
                norm_lons[k] += 360.0;
            }
        }

        let spec = GridSpec::from_axes(norm_lats, norm_lons)?;
        Ok((
            Self {
                flip_lat,
                lon_shift,
                im: lons.len(),
                jm: lats.len(),
            },
            spec,
        ))
    }

    /// Whether the source already is in canonical order.
    pub fn is_identity(&self) -> bool {
        !self.flip_lat && self.lon_shift == 0
    }

    /// Reorder one source field into canonical order.
    pub fn apply(&self, src: &[f32]) -> Vec<f32> {
        if self.is_identity() {
            return src.to_vec();
        }
        let mut out = Vec::with_capacity(src.len());
        for j in 0..self.jm {
            let sj = if self.flip_lat { self.jm - 1 - j } else { j };
            let row = &src[sj * self.im..(sj + 1) * self.im];
            out.extend_from_slice(&row[self.lon_shift..]);
            out.extend_from_slice(&row[..self.lon_shift]);
        }
        out
    }
}

/// Distance east of the prime meridian, treating values just west of it as
/// almost a full turn away.
fn seam_distance(lon: f64) -> f64 {
    if lon > 359.999_999 {
        0.0
    } else {
        lon
    }
}
