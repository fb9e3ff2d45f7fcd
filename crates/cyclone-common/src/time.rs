//! Calendar handling and time stamps for SLP time steps.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CycloneError, CycloneResult};

/// Calendar attached to an SLP time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Calendar {
    /// Proleptic Gregorian; absolute time is Julian day x 100.
    #[default]
    Standard,
    /// 365-day years without leap days.
    NoLeap,
    /// Twelve 30-day months.
    Day360,
}

impl Calendar {
    /// Parse a CF-style calendar attribute (case-insensitive).
    pub fn from_str(s: &str) -> CycloneResult<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Self::Standard),
            "noleap" | "no_leap" | "365_day" => Ok(Self::NoLeap),
            "360_day" | "day360" => Ok(Self::Day360),
            other => Err(CycloneError::config(format!("unsupported calendar: {}", other))),
        }
    }

    /// Whether absolute time is a Julian day rather than a step index.
    pub fn is_standard(&self) -> bool {
        matches!(self, Calendar::Standard)
    }

    fn days_in_month(&self, year: i32, month: u32) -> u32 {
        match self {
            Calendar::Day360 => 30,
            Calendar::NoLeap => NOLEAP_DAYS[(month - 1) as usize],
            Calendar::Standard => {
                let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
                if month == 2 && leap {
                    29
                } else {
                    NOLEAP_DAYS[(month - 1) as usize]
                }
            }
        }
    }
}

const NOLEAP_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Canonical `(year, month, day, hour)` stamp of one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl Stamp {
    pub fn new(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self { year, month, day, hour }
    }

    /// `YYYYMMDDHH` as an integer.
    pub fn code(&self) -> u64 {
        self.year.max(0) as u64 * 1_000_000
            + self.month as u64 * 10_000
            + self.day as u64 * 100
            + self.hour as u64
    }

    /// Parse a `YYYYMMDDHH` code.
    pub fn from_code(code: u64) -> CycloneResult<Self> {
        let stamp = Self {
            year: (code / 1_000_000) as i32,
            month: ((code / 10_000) % 100) as u32,
            day: ((code / 100) % 100) as u32,
            hour: (code % 100) as u32,
        };
        stamp.check()?;
        Ok(stamp)
    }

    /// Parse `YYYY-MM-DDTHH[:MM[:SS]]` or a bare `YYYYMMDDHH`.
    pub fn parse(s: &str) -> CycloneResult<Self> {
        let s = s.trim();
        if s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit()) {
            let code = s
                .parse::<u64>()
                .map_err(|e| CycloneError::parse(format!("stamp '{}': {}", s, e)))?;
            return Self::from_code(code);
        }

        let trimmed = s.trim_end_matches('Z');
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Self::new(ndt.year(), ndt.month(), ndt.day(), ndt.hour()));
            }
        }
        if let Some((date, hour)) = trimmed.split_once('T') {
            // Non-standard calendars carry dates chrono rejects (e.g. Feb 30).
            let parts: Vec<&str> = date.split('-').collect();
            let hour = hour.split(':').next().unwrap_or("0");
            if parts.len() == 3 {
                let parsed = (
                    parts[0].parse::<i32>(),
                    parts[1].parse::<u32>(),
                    parts[2].parse::<u32>(),
                    hour.parse::<u32>(),
                );
                if let (Ok(y), Ok(m), Ok(d), Ok(h)) = parsed {
                    let stamp = Self::new(y, m, d, h);
                    stamp.check()?;
                    return Ok(stamp);
                }
            }
        }
        Err(CycloneError::parse(format!("invalid time stamp: {}", s)))
    }

    fn check(&self) -> CycloneResult<()> {
        if !(1..=12).contains(&self.month) || !(1..=31).contains(&self.day) || self.hour > 23 {
            return Err(CycloneError::parse(format!("invalid time stamp: {}", self)));
        }
        Ok(())
    }

    /// Julian day x 100, rounded to the nearest hundredth.
    pub fn julian_x100(&self) -> CycloneResult<i64> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or_else(|| CycloneError::data(format!("not a Gregorian date: {}", self)))?;
        // JD of 0001-01-01T00:00 is 1721425.5 and that day has num_days_from_ce() == 1.
        let day = 1_721_424 + date.num_days_from_ce() as i64;
        let frac = 50 + (self.hour as i64 * 100 + 12) / 24;
        Ok(day * 100 + frac)
    }

    /// Stamp `hours` later within `calendar`.
    pub fn advance(&self, calendar: Calendar, hours: u32) -> CycloneResult<Self> {
        if calendar.is_standard() {
            let ndt = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
                .and_then(|d| d.and_hms_opt(self.hour, 0, 0))
                .ok_or_else(|| CycloneError::data(format!("not a Gregorian date: {}", self)))?;
            let next = ndt + Duration::hours(hours as i64);
            return Ok(Self::new(next.year(), next.month(), next.day(), next.hour()));
        }

        let mut s = *self;
        let total = s.hour + hours;
        s.hour = total % 24;
        let mut days = total / 24;
        while days > 0 {
            let dim = calendar.days_in_month(s.year, s.month);
            if s.day + days <= dim {
                s.day += days;
                days = 0;
            } else {
                days -= dim - s.day + 1;
                s.day = 1;
                s.month += 1;
                if s.month > 12 {
                    s.month = 1;
                    s.year += 1;
                }
            }
        }
        Ok(s)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour
        )
    }
}

/// Uniformly stepped time axis of one year of SLP data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub calendar: Calendar,
    pub start: Stamp,
    pub step_hours: u32,
    pub stamps: Vec<Stamp>,
}

impl TimeAxis {
    /// Build an axis of `steps` stamps starting at `start`.
    pub fn new(calendar: Calendar, start: Stamp, step_hours: u32, steps: usize) -> CycloneResult<Self> {
        if step_hours == 0 || step_hours > 24 * 31 {
            return Err(CycloneError::config(format!(
                "invalid time step: {} hours",
                step_hours
            )));
        }
        let mut stamps = Vec::new();
        let mut current = start;
        for k in 0..steps {
            if k > 0 {
                current = current.advance(calendar, step_hours)?;
            }
            stamps.push(current);
        }
        Ok(Self {
            calendar,
            start,
            step_hours,
            stamps,
        })
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Absolute time index of step `k`: Julian day x 100 on the standard
    /// calendar, the step number otherwise.
    pub fn absolute_time(&self, k: usize) -> CycloneResult<i64> {
        if self.calendar.is_standard() {
            self.stamps[k].julian_x100()
        } else {
            Ok(k as i64)
        }
    }

    /// Index of a stamp on this axis.
    pub fn index_of(&self, stamp: &Stamp) -> Option<usize> {
        self.stamps.iter().position(|s| s == stamp)
    }
}
