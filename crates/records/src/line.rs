//! Center lines and attribution blocks.

use std::str::{FromStr, SplitWhitespace};

use cyclone_common::{CenterRecord, Intensity, Stamp, Uci};

use crate::error::{RecordError, RecordResult};

/// Trailing block of an attribution line.
///
/// Distances and areas are whole km / km^2; `depth` is hPa x 10.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttBlock {
    pub area_km2: i64,
    pub perimeter_km: i64,
    pub min_edge_km: i64,
    pub max_edge_km: i64,
    pub mean_edge_km: i64,
    pub depth: i64,
    pub nearest_km: i64,
    pub nearest_alt_km: i64,
    pub nearest_uci: Option<Uci>,
    pub nearest_alt_uci: Option<Uci>,
    pub grids: Vec<usize>,
}

/// Whitespace-separated field cursor.
pub(crate) struct Fields<'a> {
    tokens: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace(),
        }
    }

    pub(crate) fn peek(&self) -> Option<&'a str> {
        self.tokens.clone().next()
    }

    pub(crate) fn token(&mut self, name: &'static str) -> RecordResult<&'a str> {
        self.tokens.next().ok_or(RecordError::Missing(name))
    }

    pub(crate) fn next<T: FromStr>(&mut self, name: &'static str) -> RecordResult<T> {
        let raw = self.token(name)?;
        raw.parse().map_err(|_| RecordError::Field {
            name,
            value: raw.to_string(),
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.peek().is_none()
    }

    pub(crate) fn finish(self) -> RecordResult<()> {
        match self.tokens.count() {
            0 => Ok(()),
            n => Err(RecordError::Trailing(n)),
        }
    }
}

/// The 16 center fields.
pub fn encode_center(c: &CenterRecord) -> String {
    format!(
        "{:4} {:02} {:02} {:02} {:9} {:5} {:5} {:7} {:7} {:7} {:5} {:2} {:2} {:4} {} {}",
        c.stamp.year,
        c.stamp.month,
        c.stamp.day,
        c.stamp.hour,
        c.abs_time,
        c.colat,
        c.lon,
        c.grid_id,
        c.grid_slp,
        c.reg_slp,
        c.grid_lap,
        c.flags,
        c.intensity.code(),
        c.dissimilarity,
        c.uci,
        Uci::format_opt(c.usi.as_ref()),
    )
}

pub(crate) fn parse_center(fields: &mut Fields<'_>) -> RecordResult<CenterRecord> {
    let stamp = Stamp::new(
        fields.next("year")?,
        fields.next("month")?,
        fields.next("day")?,
        fields.next("hour")?,
    );
    let abs_time = fields.next("absolute time")?;
    let colat = fields.next("colatitude")?;
    let lon = fields.next("longitude")?;
    let grid_id = fields.next("grid id")?;
    let grid_slp = fields.next("grid SLP")?;
    let reg_slp = fields.next("regional SLP")?;
    let grid_lap = fields.next("Laplacian")?;
    let flags = fields.next("flags")?;
    let code: u8 = fields.next("intensity")?;
    let intensity = Intensity::from_code(code).ok_or(RecordError::Field {
        name: "intensity",
        value: code.to_string(),
    })?;
    let dissimilarity = fields.next("dissimilarity")?;
    let uci: Uci = fields.token("UCI")?.parse()?;
    let usi = Uci::parse_opt(fields.token("USI")?)?;
    if uci.stamp != stamp.code() {
        return Err(RecordError::Field {
            name: "UCI",
            value: uci.to_string(),
        });
    }
    Ok(CenterRecord {
        stamp,
        abs_time,
        colat,
        lon,
        grid_id,
        grid_slp,
        reg_slp,
        grid_lap,
        flags,
        intensity,
        dissimilarity,
        uci,
        usi,
    })
}

/// The attribution block, grid list included.
pub fn encode_block(b: &AttBlock) -> String {
    let mut out = format!(
        "{:5} {:9} {:6} {:5} {:5} {:5} {:4} {:5} {:5} {} {}",
        b.grids.len(),
        b.area_km2,
        b.perimeter_km,
        b.min_edge_km,
        b.max_edge_km,
        b.mean_edge_km,
        b.depth,
        b.nearest_km,
        b.nearest_alt_km,
        Uci::format_opt(b.nearest_uci.as_ref()),
        Uci::format_opt(b.nearest_alt_uci.as_ref()),
    );
    for g in &b.grids {
        out.push_str(&format!(" {:6}", g));
    }
    out
}

pub(crate) fn parse_block(fields: &mut Fields<'_>) -> RecordResult<AttBlock> {
    let n: usize = fields.next("grid count")?;
    let mut block = AttBlock {
        area_km2: fields.next("area")?,
        perimeter_km: fields.next("perimeter")?,
        min_edge_km: fields.next("min edge")?,
        max_edge_km: fields.next("max edge")?,
        mean_edge_km: fields.next("mean edge")?,
        depth: fields.next("depth")?,
        nearest_km: fields.next("nearest distance")?,
        nearest_alt_km: fields.next("alternate distance")?,
        nearest_uci: Uci::parse_opt(fields.token("nearest UCI")?)?,
        nearest_alt_uci: Uci::parse_opt(fields.token("alternate UCI")?)?,
        grids: Vec::new(),
    };
    for _ in 0..n {
        block.grids.push(fields.next("grid id")?);
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CenterRecord {
        let stamp = Stamp::new(1979, 1, 2, 6);
        CenterRecord {
            stamp,
            abs_time: 244_386_075,
            colat: 4500,
            lon: 18000,
            grid_id: 7848,
            grid_slp: 995_000,
            reg_slp: 996_213,
            grid_lap: 1234,
            flags: 16,
            intensity: Intensity::Moderate,
            dissimilarity: 42,
            uci: Uci::new(&stamp, 4500, 18000),
            usi: Some(Uci::new(&Stamp::new(1979, 1, 1, 0), 4750, 17500)),
        }
    }

    #[test]
    fn test_center_line_layout() {
        let line = encode_center(&sample());
        assert_eq!(
            line,
            "1979 01 02 06 244386075  4500 18000    7848  995000  996213  1234 16  2   42 \
             19790102060450018000 19790101000475017500"
        );
    }

    #[test]
    fn test_center_line_round_trip() {
        let mut c = sample();
        c.grid_lap = -17;
        c.usi = None;
        let line = encode_center(&c);
        let mut fields = Fields::new(&line);
        assert_eq!(parse_center(&mut fields).unwrap(), c);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_bad_intensity_is_rejected() {
        let line = encode_center(&sample()).replacen(" 16  2 ", " 16  7 ", 1);
        let err = parse_center(&mut Fields::new(&line)).unwrap_err();
        assert!(err.to_string().contains("intensity"));
    }

    #[test]
    fn test_uci_must_match_stamp() {
        let line = encode_center(&sample()).replacen("1979 01 02", "1979 01 03", 1);
        assert!(parse_center(&mut Fields::new(&line)).is_err());
    }

    #[test]
    fn test_block_round_trip() {
        let block = AttBlock {
            area_km2: 812_345,
            perimeter_km: 3_100,
            min_edge_km: 196,
            max_edge_km: 488,
            mean_edge_km: 350,
            depth: 90,
            nearest_km: 0,
            nearest_alt_km: 0,
            nearest_uci: None,
            nearest_alt_uci: None,
            grids: vec![7703, 7704, 7848],
        };
        let text = encode_block(&block);
        assert!(text.starts_with("    3    812345"));
        let mut fields = Fields::new(&text);
        assert_eq!(parse_block(&mut fields).unwrap(), block);
        fields.finish().unwrap();
    }

    #[test]
    fn test_huge_grid_count_is_a_parse_error() {
        let block = AttBlock {
            depth: 20,
            grids: vec![7703, 7704],
            ..AttBlock::default()
        };
        let text = encode_block(&block).replacen("    2 ", "4611686018427387904 ", 1);
        let err = parse_block(&mut Fields::new(&text)).unwrap_err();
        assert!(matches!(err, RecordError::Missing("grid id")));
    }

    #[test]
    fn test_truncated_block() {
        let err = parse_block(&mut Fields::new("    3    812345   3100")).unwrap_err();
        assert!(matches!(err, RecordError::Missing("min edge")));
    }
}
