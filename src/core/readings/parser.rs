//! Re-reads a record log into readings. Tolerant: bad lines are reported and skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::reading::Reading;
use crate::core::error::Result;

static RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Frame(\d+):\s+X\s+([-\d.]+)\s+Y\s+([-\d.]+)\s+Z\s+([-\d.]+)\s+->\s+([\d.]+)\s+mm",
    )
    .expect("Invalid record regex")
});

/// A well-formed line whose displacement is outside the plausible range.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedLine {
    pub line_no: usize,
    pub reading: Reading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MalformedLine {
    pub line_no: usize,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub readings: Vec<Reading>,
    pub excluded: Vec<ExcludedLine>,
    pub malformed: Vec<MalformedLine>,
}

impl ParsedLog {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

pub fn parse_log(path: impl AsRef<Path>) -> Result<ParsedLog> {
    let path = path.as_ref();
    info!("📖 Reading record log: {}", path.display());
    let file = File::open(path)?;
    parse_records(BufReader::new(file))
}

pub fn parse_records<R: BufRead>(reader: R) -> Result<ParsedLog> {
    let mut parsed = ParsedLog::default();

    for (idx, raw) in reader.split(b'\n').enumerate() {
        let line_no = idx + 1;
        let mut line = match String::from_utf8(raw?) {
            Ok(line) => line,
            Err(e) => {
                let content = String::from_utf8_lossy(e.as_bytes()).into_owned();
                warn!("⚠️ Undecodable line {}: {}", line_no, content.trim());
                parsed.malformed.push(MalformedLine {
                    line_no,
                    content,
                    reason: e.utf8_error().to_string(),
                });
                continue;
            }
        };
        if line.ends_with('\r') {
            line.pop();
        }
        if line.trim().is_empty() {
            continue;
        }

        let converted = RECORD_RE
            .captures(&line)
            .map(|caps| reading_from_captures(&caps));

        let reading = match converted {
            Some(Ok(reading)) => reading,
            Some(Err(reason)) => {
                warn!("⚠️ Conversion error on line {}: {} - {}", line_no, line.trim(), reason);
                parsed.malformed.push(MalformedLine {
                    line_no,
                    content: line,
                    reason,
                });
                continue;
            }
            None => {
                warn!("⚠️ Unrecognized line {}: {}", line_no, line.trim());
                parsed.malformed.push(MalformedLine {
                    line_no,
                    content: line,
                    reason: "does not match the record format".to_string(),
                });
                continue;
            }
        };

        if reading.is_valid() {
            parsed.readings.push(reading);
        } else {
            warn!(
                "⚠️ Excluded out-of-range record: Frame{} displacement {} mm",
                reading.frame_id, reading.displacement
            );
            parsed.excluded.push(ExcludedLine { line_no, reading });
        }
    }

    info!(
        "✓ Parsed {} readings ({} excluded, {} malformed)",
        parsed.readings.len(),
        parsed.excluded.len(),
        parsed.malformed.len()
    );
    Ok(parsed)
}

fn reading_from_captures(caps: &Captures<'_>) -> std::result::Result<Reading, String> {
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let float = |i: usize| {
        field(i)
            .parse::<f64>()
            .map_err(|e| format!("'{}': {}", field(i), e))
    };

    let frame_id = field(1)
        .parse::<u64>()
        .map_err(|e| format!("'{}': {}", field(1), e))?;

    // The stored displacement is kept as written, not recomputed.
    Ok(Reading {
        frame_id,
        x: float(2)?,
        y: float(3)?,
        z: float(4)?,
        displacement: float(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::readings::record::format_record;
    use std::io::Cursor;

    fn parse_str(text: &str) -> ParsedLog {
        parse_records(Cursor::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn test_parses_two_records() {
        let parsed = parse_str(
            "Frame10: X 0.1000 Y 0.2000 Z 0.3000 -> 0.3742 mm\n\
             Frame20: X 1.0000 Y 1.0000 Z 1.0000 -> 1.7321 mm\n",
        );

        assert_eq!(parsed.readings.len(), 2);
        assert_eq!(parsed.readings[0].frame_id, 10);
        assert_eq!(parsed.readings[1].frame_id, 20);
        assert_eq!(parsed.readings[1].displacement, 1.7321);
        assert!(parsed.excluded.is_empty());
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn test_out_of_range_is_excluded() {
        let parsed = parse_str(
            "Frame5: X 3.0000 Y 4.0000 Z 0.0000 -> 5.000000 mm\n\
             Frame10: X 0.1000 Y 0.0000 Z 0.0000 -> 0.100000 mm\n",
        );

        assert_eq!(parsed.readings.len(), 1);
        assert_eq!(parsed.excluded.len(), 1);
        assert_eq!(parsed.excluded[0].line_no, 1);
        assert_eq!(parsed.excluded[0].reading.displacement, 5.0);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let parsed = parse_str(
            "garbage\n\
             \n\
             Frame1: X 1.2.3 Y 0.0000 Z 0.0000 -> 0.100000 mm\n\
             Frame2: X 0.1000 Y 0.0000 Z 0.0000 -> 0.100000 mm\n\
             Frame3: X 0.1000 Y 0.0",
        );

        assert_eq!(parsed.readings.len(), 1);
        assert_eq!(parsed.readings[0].frame_id, 2);
        assert_eq!(parsed.malformed.len(), 3);
        assert_eq!(parsed.malformed[0].line_no, 1);
        assert_eq!(parsed.malformed[1].line_no, 3);
        assert_eq!(parsed.malformed[2].line_no, 5);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut bytes = b"Frame1: X 0.1000 Y 0.0000 Z 0.0000 -> 0.100000 mm\n".to_vec();
        bytes.extend_from_slice(b"Frame2\xff\xfe garbled\n");
        bytes.extend_from_slice(b"Frame3: X 0.2000 Y 0.0000 Z 0.0000 -> 0.200000 mm\r\n");

        let parsed = parse_records(Cursor::new(bytes)).unwrap();

        assert_eq!(parsed.readings.len(), 2);
        assert_eq!(parsed.readings[1].frame_id, 3);
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(parsed.malformed[0].line_no, 2);
        assert!(parsed.malformed[0].content.starts_with("Frame2"));
    }

    #[test]
    fn test_round_trip_within_precision() {
        let original = Reading::from_axes(42, [0.123456, -0.654321, 1.5]);
        let parsed = parse_str(&format!("{}\n", format_record(&original)));
        let back = parsed.readings[0];

        assert_eq!(back.frame_id, 42);
        assert!((back.x - original.x).abs() <= 5e-5);
        assert!((back.y - original.y).abs() <= 5e-5);
        assert!((back.z - original.z).abs() <= 5e-5);
        assert!((back.displacement - original.displacement).abs() <= 5e-7);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(parse_log("/nonexistent/valid_xyz.txt").is_err());
    }
}
