//! Parsers for the pipeline's external inputs.
//!
//! - **Contig tables**: FASTA index (`.fai`) or two-column genome files
//! - **Candidate regions**: BED3+ files, optionally gzip-compressed
//! - **Period-finder calls**: reformatted TRF TSV or raw TRF `-ngs` reports
//! - **Classifier calls**: RepeatMasker `.out` reports or BED-like TSV
//!
//! Parsers only check syntax. Coordinates are validated against the contig
//! table later, by the region filter and the annotation index.
//!
//! ## Fetched windows
//!
//! Detectors are run on sequences fetched with `samtools faidx`, so query names
//! look like `chr1:1001-2000` (1-based, inclusive). Calls inside such a window
//! are translated back to 0-based, half-open genome coordinates by
//! [`translate_window`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::core::contig::ContigError;
use crate::core::types::AnnotationSource;

pub mod bed;
pub mod contigs;
pub mod repeatmasker;
pub mod trf;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("{file}:{line_num}: malformed interval '{line}': {reason}")]
    MalformedInterval {
        file: String,
        line_num: usize,
        line: String,
        reason: String,
    },

    #[error("{file}:{line_num}: malformed {detector} record '{line}': {reason}")]
    MalformedAnnotation {
        detector: AnnotationSource,
        file: String,
        line_num: usize,
        line: String,
        reason: String,
    },

    #[error("Too many contigs: {0} exceeds maximum allowed (100000)")]
    TooManyContigs(usize),

    #[error(transparent)]
    Contigs(#[from] ContigError),
}

/// Open a text file, decompressing it if the name ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Label used for a path in error messages
pub(crate) fn file_label(path: &Path) -> String {
    path.display().to_string()
}

/// Split a `contig:start-end` query name. Returns `None` for a plain contig
/// name. The rightmost `:` is used, so contig names may contain colons.
#[must_use]
pub fn split_window(name: &str) -> Option<(&str, u64, u64)> {
    let (contig, coords) = name.rsplit_once(':')?;
    let (start, end) = coords.split_once('-')?;
    let start = start.replace(',', "").parse().ok()?;
    let end = end.replace(',', "").parse().ok()?;
    Some((contig, start, end))
}

/// Translate a 1-based, inclusive call `[call_start, call_end]` inside a window
/// starting at 1-based `window_start` to 0-based, half-open genome coordinates.
///
/// Returns `None` if the call starts before the window or the translated
/// coordinates do not fit in a `u64`.
#[must_use]
pub fn translate_window(window_start: u64, call_start: u64, call_end: u64) -> Option<(u64, u64)> {
    let start = window_start.checked_add(call_start)?.checked_sub(2)?;
    let end = window_start.checked_add(call_end)?.checked_sub(1)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_split_window() {
        assert_eq!(split_window("chr1:1001-2000"), Some(("chr1", 1001, 2000)));
        assert_eq!(split_window("HLA-A*01:01:01:01"), None);
        assert_eq!(split_window("chr1"), None);
        assert_eq!(split_window("chr1:1,001-2,000"), Some(("chr1", 1001, 2000)));
    }

    #[test]
    fn test_translate_window() {
        // Window chr1:101-200 covers 0-based [100, 200). A call on the first
        // base of the window is genome base 100.
        assert_eq!(translate_window(101, 1, 100), Some((100, 200)));
        assert_eq!(translate_window(101, 11, 20), Some((110, 120)));
        assert_eq!(translate_window(1, 1, 5), Some((0, 5)));
        assert_eq!(translate_window(0, 1, 5), None);
    }

    #[test]
    fn test_translate_window_overflow() {
        assert_eq!(translate_window(u64::MAX, 1, 5), None);
        assert_eq!(translate_window(u64::MAX - 10, 2, 20), None);
        assert_eq!(translate_window(u64::MAX - 10, 1, 5), Some((u64::MAX - 11, u64::MAX - 6)));
    }

    #[test]
    fn test_open_text_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.bed.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"chr1\t0\t100\n").unwrap();
        encoder.finish().unwrap();

        let mut content = String::new();
        open_text(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "chr1\t0\t100\n");
    }
}
