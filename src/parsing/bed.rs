//! Parser for BED3+ candidate region files.
//!
//! Only the first three columns are read; extra columns are ignored. Blank
//! lines and `#`, `track` and `browser` lines are skipped.

use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::core::interval::GenomicInterval;
use crate::parsing::{file_label, open_text, ParseError};

/// Read a BED file, gzip-compressed if it ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::MalformedInterval` for the first unparseable line.
pub fn read_bed_file(path: &Path) -> Result<Vec<GenomicInterval>, ParseError> {
    let intervals = parse_bed(open_text(path)?, &file_label(path))?;
    debug!(path = %path.display(), intervals = intervals.len(), "Read BED file");
    Ok(intervals)
}

/// # Errors
///
/// Returns `ParseError::MalformedInterval` for the first unparseable line.
pub fn parse_bed_text(text: &str) -> Result<Vec<GenomicInterval>, ParseError> {
    parse_bed(text.as_bytes(), "<text>")
}

/// Parse BED records from a reader. `file` names the input in errors.
///
/// # Errors
///
/// Returns `ParseError::Io` on read failure or `ParseError::MalformedInterval`
/// for the first line with fewer than three columns or non-numeric coordinates.
pub fn parse_bed<R: BufRead>(reader: R, file: &str) -> Result<Vec<GenomicInterval>, ParseError> {
    let mut intervals = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if is_skipped(&line) {
            continue;
        }

        let malformed = |reason: &str| ParseError::MalformedInterval {
            file: file.to_string(),
            line_num: i + 1,
            line: line.clone(),
            reason: reason.to_string(),
        };

        let mut fields = line.split('\t');
        let (Some(contig), Some(start), Some(end)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed("expected at least 3 tab-separated columns"));
        };
        let start: u64 = start
            .trim()
            .parse()
            .map_err(|_| malformed("start is not a non-negative integer"))?;
        let end: u64 = end
            .trim()
            .parse()
            .map_err(|_| malformed("end is not a non-negative integer"))?;

        intervals.push(GenomicInterval::new(contig.trim(), start, end));
    }

    Ok(intervals)
}

fn is_skipped(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track")
        || trimmed.starts_with("browser")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bed() {
        let text = "track name=regions\n# comment\nchr1\t100\t200\tname\t0\t+\n\nchr2\t0\t50\n";
        let intervals = parse_bed_text(text).unwrap();
        assert_eq!(
            intervals,
            vec![
                GenomicInterval::new("chr1", 100, 200),
                GenomicInterval::new("chr2", 0, 50),
            ]
        );
    }

    #[test]
    fn test_inverted_interval_is_not_a_parse_error() {
        // Coordinates are checked by the region filter, which reports the row
        let intervals = parse_bed_text("chr1\t200\t100\n").unwrap();
        assert_eq!(intervals[0].start, 200);
    }

    #[test]
    fn test_malformed_lines() {
        match parse_bed_text("chr1\t100\t200\nchr1\t100\n") {
            Err(ParseError::MalformedInterval { line_num, line, .. }) => {
                assert_eq!(line_num, 2);
                assert_eq!(line, "chr1\t100");
            }
            other => panic!("expected malformed interval, got {other:?}"),
        }

        assert!(matches!(
            parse_bed_text("chr1\t-5\t200\n"),
            Err(ParseError::MalformedInterval { .. })
        ));
        assert!(matches!(
            parse_bed_text("chr1\tabc\t200\n"),
            Err(ParseError::MalformedInterval { .. })
        ));
    }

    #[test]
    fn test_read_gzip_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.bed.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"chr1\t0\t100\nchr1\t200\t300\n").unwrap();
        encoder.finish().unwrap();

        let intervals = read_bed_file(&path).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[1], GenomicInterval::new("chr1", 200, 300));
    }
}
