//! Cyclone center records and their identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CycloneError;
use crate::time::Stamp;

/// Unique center identifier: `YYYYMMDDHH` followed by the zero-padded
/// colatitude and longitude in hundredths of a degree (20 digits).
///
/// Ordering matches the lexical ordering of the 20-character form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uci {
    pub stamp: u64,
    pub colat: u32,
    pub lon: u32,
}

impl Uci {
    /// Placeholder written where no identifier applies.
    pub const NONE: &'static str = "00000000000000000000";

    pub fn new(stamp: &Stamp, colat: u32, lon: u32) -> Self {
        Self {
            stamp: stamp.code(),
            colat,
            lon,
        }
    }

    /// Format an optional identifier, using zeros for `None`.
    pub fn format_opt(uci: Option<&Uci>) -> String {
        match uci {
            Some(u) => u.to_string(),
            None => Self::NONE.to_string(),
        }
    }

    /// Parse an optional identifier, mapping the all-zero form to `None`.
    pub fn parse_opt(s: &str) -> Result<Option<Uci>, CycloneError> {
        if s == Self::NONE {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl fmt::Display for Uci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}{:05}{:05}", self.stamp, self.colat, self.lon)
    }
}

impl FromStr for Uci {
    type Err = CycloneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 20 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CycloneError::parse(format!("invalid UCI: '{}'", s)));
        }
        let num = |r: std::ops::Range<usize>| -> Result<u64, CycloneError> {
            s[r].parse::<u64>()
                .map_err(|e| CycloneError::parse(format!("invalid UCI '{}': {}", s, e)))
        };
        Ok(Self {
            stamp: num(0..10)?,
            colat: num(10..15)? as u32,
            lon: num(15..20)? as u32,
        })
    }
}

/// Intensity class banded against the climatological SLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Intensity {
    Weak = 1,
    Moderate = 2,
    Strong = 3,
}

impl Intensity {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Intensity::Weak),
            2 => Some(Intensity::Moderate),
            3 => Some(Intensity::Strong),
            _ => None,
        }
    }
}

/// One cyclone center at one time step.
///
/// Pressure fields are in hPa x 1000 regardless of the working accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterRecord {
    pub stamp: Stamp,
    /// Julian day x 100, or the step number on non-standard calendars
    pub abs_time: i64,
    /// Colatitude in degrees x 100
    pub colat: u32,
    /// Longitude in degrees x 100
    pub lon: u32,
    pub grid_id: usize,
    pub grid_slp: i64,
    /// Lowest SLP among the other grids of the regional screen
    pub reg_slp: i64,
    /// Discrete Laplacian in hPa/deg^2 x 1000
    pub grid_lap: i64,
    pub flags: u8,
    pub intensity: Intensity,
    /// Tracker match cost relative to the travel radius, x 100
    pub dissimilarity: u32,
    pub uci: Uci,
    pub usi: Option<Uci>,
}

impl CenterRecord {
    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        90.0 - self.colat as f64 / 100.0
    }

    /// Longitude in degrees east.
    pub fn lon_deg(&self) -> f64 {
        self.lon as f64 / 100.0
    }

    /// Central SLP in hPa.
    pub fn slp_hpa(&self) -> f64 {
        self.grid_slp as f64 / 1000.0
    }

    pub fn has_flag(&self, bit: u8) -> bool {
        crate::flags::has(self.flags, bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uci_format() {
        let uci = Uci::new(&Stamp::new(1979, 1, 2, 6), 4500, 18000);
        assert_eq!(uci.to_string(), "19790102060450018000");
        assert_eq!(uci.to_string().len(), 20);
    }

    #[test]
    fn test_uci_parse() {
        let uci: Uci = "19790102060450018000".parse().unwrap();
        assert_eq!(uci.stamp, 1979010206);
        assert_eq!(uci.colat, 4500);
        assert_eq!(uci.lon, 18000);
        assert!("1979".parse::<Uci>().is_err());
        assert!("1979010206045001800x".parse::<Uci>().is_err());
    }

    #[test]
    fn test_uci_ordering_is_lexical() {
        let a: Uci = "19790102060450018000".parse().unwrap();
        let b: Uci = "19790102060450100000".parse().unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_optional_uci() {
        assert_eq!(Uci::parse_opt(Uci::NONE).unwrap(), None);
        assert_eq!(Uci::format_opt(None), Uci::NONE);
    }

    #[test]
    fn test_intensity_codes() {
        assert_eq!(Intensity::Strong.code(), 3);
        assert_eq!(Intensity::from_code(2), Some(Intensity::Moderate));
        assert_eq!(Intensity::from_code(0), None);
    }
}
