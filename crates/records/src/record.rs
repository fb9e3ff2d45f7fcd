//! The five record kinds and their sentinels.

use std::fmt;
use std::str::FromStr;

use cyclone_common::CenterRecord;

use crate::error::{RecordError, RecordResult};
use crate::line::{encode_block, encode_center, parse_block, parse_center, AttBlock, Fields};

/// Sentinel leading an empty-center line.
pub const EMPTY_SENTINEL: &str = "-999";
/// Sentinel leading a shared (storm) attribution line.
pub const SHARED_SENTINEL: &str = "-888";
/// Sentinel leading a problematic-center line.
pub const PROBLEMATIC_SENTINEL: &str = "-777";

/// One output line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A center as found and tracked.
    Center(CenterRecord),
    /// A center with its exclusive region.
    Attributed(CenterRecord, AttBlock),
    /// A storm's shared region, headed by its primary center.
    Shared(CenterRecord, AttBlock),
    /// A center whose region is its own grid only.
    Empty(CenterRecord, AttBlock),
    /// A troubled center held back from tracking.
    Problematic(CenterRecord),
}

impl Record {
    pub fn center(&self) -> &CenterRecord {
        match self {
            Record::Center(c)
            | Record::Problematic(c)
            | Record::Attributed(c, _)
            | Record::Shared(c, _)
            | Record::Empty(c, _) => c,
        }
    }

    pub fn block(&self) -> Option<&AttBlock> {
        match self {
            Record::Attributed(_, b) | Record::Shared(_, b) | Record::Empty(_, b) => Some(b),
            Record::Center(_) | Record::Problematic(_) => None,
        }
    }

    pub fn sentinel(&self) -> Option<&'static str> {
        match self {
            Record::Empty(..) => Some(EMPTY_SENTINEL),
            Record::Shared(..) => Some(SHARED_SENTINEL),
            Record::Problematic(_) => Some(PROBLEMATIC_SENTINEL),
            Record::Center(_) | Record::Attributed(..) => None,
        }
    }

    pub fn encode(&self) -> String {
        let mut line = String::new();
        if let Some(s) = self.sentinel() {
            line.push_str(s);
            line.push(' ');
        }
        line.push_str(&encode_center(self.center()));
        if let Some(b) = self.block() {
            line.push(' ');
            line.push_str(&encode_block(b));
        }
        line
    }

    pub fn parse(line: &str) -> RecordResult<Self> {
        let mut fields = Fields::new(line);
        let sentinel = match fields.peek() {
            Some(s @ (EMPTY_SENTINEL | SHARED_SENTINEL | PROBLEMATIC_SENTINEL)) => {
                fields.token("sentinel")?;
                Some(s)
            }
            _ => None,
        };
        let center = parse_center(&mut fields)?;
        let record = match sentinel {
            Some(PROBLEMATIC_SENTINEL) => Record::Problematic(center),
            Some(EMPTY_SENTINEL) => Record::Empty(center, parse_block(&mut fields)?),
            Some(_) => Record::Shared(center, parse_block(&mut fields)?),
            None if fields.is_empty() => Record::Center(center),
            None => Record::Attributed(center, parse_block(&mut fields)?),
        };
        fields.finish()?;
        Ok(record)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Record {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Record::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclone_common::{Intensity, Stamp, Uci};

    fn center() -> CenterRecord {
        let stamp = Stamp::new(1980, 2, 29, 18);
        let uci = Uci::new(&stamp, 13_500, 35_750);
        CenterRecord {
            stamp,
            abs_time: 244_429_925,
            colat: 13_500,
            lon: 35_750,
            grid_id: 2_591,
            grid_slp: 972_500,
            reg_slp: 980_000,
            grid_lap: 2_100,
            flags: 0,
            intensity: Intensity::Strong,
            dissimilarity: 0,
            uci,
            usi: Some(uci),
        }
    }

    fn block(grids: Vec<usize>) -> AttBlock {
        AttBlock {
            area_km2: 4_321,
            depth: 0,
            grids,
            ..AttBlock::default()
        }
    }

    #[test]
    fn test_every_kind_parses_back() {
        let records = [
            Record::Center(center()),
            Record::Attributed(center(), block(vec![2_590, 2_591])),
            Record::Shared(center(), block(vec![2_447])),
            Record::Empty(center(), block(vec![2_591])),
            Record::Problematic(center()),
        ];
        for r in records {
            let line = r.to_string();
            assert_eq!(line.parse::<Record>().unwrap(), r, "{}", line);
        }
    }

    #[test]
    fn test_sentinels_lead_the_line() {
        assert!(Record::Empty(center(), block(vec![2_591])).encode().starts_with("-999 1980"));
        assert!(Record::Shared(center(), block(vec![])).encode().starts_with("-888 1980"));
        assert!(Record::Problematic(center()).encode().starts_with("-777 1980"));
        assert!(Record::Center(center()).encode().starts_with("1980 02 29 18"));
    }

    #[test]
    fn test_problematic_line_takes_no_block() {
        let line = format!("{} {}", Record::Problematic(center()), "1 2 3");
        assert!(matches!(Record::parse(&line), Err(RecordError::Trailing(3))));
    }

    #[test]
    fn test_block_grid_count_is_checked() {
        let mut line = Record::Attributed(center(), block(vec![2_590, 2_591])).encode();
        line.push_str("   2592");
        assert!(matches!(Record::parse(&line), Err(RecordError::Trailing(1))));
    }
}
