//! Record files: `#` header lines followed by one record per line.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{RecordError, RecordResult};
use crate::record::Record;

/// What a record file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Centers,
    Tracks,
    Attributions,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Centers => "centers",
            FileKind::Tracks => "tracks",
            FileKind::Attributions => "atts",
        }
    }

    /// Conventional file name for `year`.
    pub fn file_name(&self, year: i32) -> String {
        format!("{}_{}.txt", self.as_str(), year)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "centers" => Ok(FileKind::Centers),
            "tracks" => Ok(FileKind::Tracks),
            "atts" => Ok(FileKind::Attributions),
            other => Err(RecordError::Header(format!("unknown file kind '{}'", other))),
        }
    }
}

/// Leading `#` lines of a record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub kind: FileKind,
    pub year: i32,
    pub im: usize,
    pub jm: usize,
    pub step_hours: u32,
}

impl Header {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("# kind {}", self.kind),
            format!("# year {}", self.year),
            format!("# grid {} {}", self.im, self.jm),
            format!("# step {}", self.step_hours),
        ]
    }

    /// Parse header lines; unknown keys are ignored.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> RecordResult<Self> {
        let mut kind: Option<FileKind> = None;
        let mut year: Option<i32> = None;
        let mut grid: Option<(usize, usize)> = None;
        let mut step: Option<u32> = None;
        for line in lines {
            let body = line.trim_start_matches('#').trim();
            let mut parts = body.split_whitespace();
            let bad = || RecordError::Header(line.to_string());
            match parts.next() {
                Some("kind") => kind = Some(parts.next().ok_or_else(bad)?.parse()?),
                Some("year") => year = Some(parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?),
                Some("grid") => {
                    let im = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
                    let jm = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
                    grid = Some((im, jm));
                }
                Some("step") => step = Some(parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?),
                _ => {}
            }
        }
        let missing = |key: &str| RecordError::Header(format!("no '{}' line", key));
        let (im, jm) = grid.ok_or_else(|| missing("grid"))?;
        Ok(Self {
            kind: kind.ok_or_else(|| missing("kind"))?,
            year: year.ok_or_else(|| missing("year"))?,
            im,
            jm,
            step_hours: step.ok_or_else(|| missing("step"))?,
        })
    }
}

/// Buffered record sink.
pub struct RecordWriter<W: Write> {
    inner: BufWriter<W>,
    written: usize,
}

impl RecordWriter<File> {
    /// Create (or truncate) `path` and write the header.
    pub fn create<P: AsRef<Path>>(path: P, header: &Header) -> RecordResult<Self> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), kind = %header.kind, "Writing record file");
        Self::new(file, header)
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, header: &Header) -> RecordResult<Self> {
        let mut inner = BufWriter::new(writer);
        for line in header.lines() {
            writeln!(inner, "{}", line)?;
        }
        Ok(Self { inner, written: 0 })
    }

    pub fn write(&mut self, record: &Record) -> RecordResult<()> {
        writeln!(self.inner, "{}", record)?;
        self.written += 1;
        Ok(())
    }

    /// Write a `#` comment line between records.
    pub fn comment(&mut self, text: &str) -> RecordResult<()> {
        writeln!(self.inner, "# {}", text)?;
        Ok(())
    }

    /// Flush and return the number of records written.
    pub fn finish(mut self) -> RecordResult<usize> {
        self.inner.flush()?;
        Ok(self.written)
    }
}

/// A parsed record file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFile {
    pub header: Header,
    pub records: Vec<Record>,
}

/// Read a record file from any buffered reader.
pub fn read_records<R: BufRead>(reader: R) -> RecordResult<RecordFile> {
    let mut header_lines = Vec::new();
    let mut records = Vec::new();
    for (k, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            // Only the leading block is the header.
            if records.is_empty() {
                header_lines.push(trimmed.to_string());
            }
            continue;
        }
        records.push(Record::parse(trimmed).map_err(|e| e.at_line(k + 1))?);
    }
    let header = Header::parse(header_lines.iter().map(String::as_str))?;
    Ok(RecordFile { header, records })
}

/// Read a record file from disk.
pub fn read_record_file<P: AsRef<Path>>(path: P) -> RecordResult<RecordFile> {
    let file = File::open(path.as_ref())?;
    let parsed = read_records(BufReader::new(file))?;
    debug!(
        path = %path.as_ref().display(),
        records = parsed.records.len(),
        "Read record file"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Header {
        Header {
            kind: FileKind::Centers,
            year: 1979,
            im: 144,
            jm: 73,
            step_hours: 6,
        }
    }

    #[test]
    fn test_header_lines_parse_back() {
        let lines = header().lines();
        assert_eq!(lines[0], "# kind centers");
        let parsed = Header::parse(lines.iter().map(String::as_str)).unwrap();
        assert_eq!(parsed, header());
    }

    #[test]
    fn test_header_requires_every_key() {
        let err = Header::parse(["# kind tracks", "# year 1979"]).unwrap_err();
        assert!(err.to_string().contains("grid"));
    }

    #[test]
    fn test_header_only_file() {
        let mut buf = Vec::new();
        let writer = RecordWriter::new(&mut buf, &header()).unwrap();
        assert_eq!(writer.finish().unwrap(), 0);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 4);
        let parsed = read_records(text.as_bytes()).unwrap();
        assert_eq!(parsed.header, header());
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let mut text = header().lines().join("\n");
        text.push_str("\n1979 01 01 00 oops\n");
        let err = read_records(text.as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("line 5:"), "{}", err);
    }

    #[test]
    fn test_file_kind_names() {
        assert_eq!(FileKind::Attributions.file_name(1979), "atts_1979.txt");
        assert_eq!("tracks".parse::<FileKind>().unwrap(), FileKind::Tracks);
        assert!("grids".parse::<FileKind>().is_err());
    }
}
