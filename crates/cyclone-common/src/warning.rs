//! Non-fatal filter warnings collected per year.
//!
//! A warning never stops processing; its time stamp lands in the year's
//! redo list so a later run can re-process just those steps.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::Stamp;

/// Numbered consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailCheck {
    TooFewCenters = 1,
    TooManyCenters = 2,
    CenterCountJump = 3,
    ContourPartition = 4,
    AttributionOverlap = 5,
    CoverageLow = 6,
    CoverageHigh = 7,
    EmptyRegional = 8,
}

impl FailCheck {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::TooFewCenters),
            2 => Some(Self::TooManyCenters),
            3 => Some(Self::CenterCountJump),
            4 => Some(Self::ContourPartition),
            5 => Some(Self::AttributionOverlap),
            6 => Some(Self::CoverageLow),
            7 => Some(Self::CoverageHigh),
            8 => Some(Self::EmptyRegional),
            _ => None,
        }
    }
}

/// A filter threshold hit at one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterWarning {
    pub stamp: Stamp,
    pub check: FailCheck,
    pub message: String,
}

impl FilterWarning {
    pub fn new(stamp: Stamp, check: FailCheck, message: impl Into<String>) -> Self {
        Self {
            stamp,
            check,
            message: message.into(),
        }
    }
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02} {}", self.stamp, self.check.code(), self.message)
    }
}
