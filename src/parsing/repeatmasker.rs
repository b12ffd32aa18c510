//! Parser for classifier (RepeatMasker) calls.
//!
//! Two layouts are accepted:
//!
//! - RepeatMasker `.out` report: a header block, then whitespace-separated rows
//!   `score div del ins query begin end (left) strand repeat class/family ...`
//!   with 1-based inclusive coordinates. A query named `contig:start-end` is a
//!   fetched window and is translated back to genome coordinates.
//! - BED-like TSV, 0-based half-open: `chrom  start  end  family  divergence  [score]`
//!
//! Calls scoring below the minimum score are discarded while parsing. TSV rows
//! without a score are always kept.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::core::annotation::{AnnotationFields, AnnotationRecord, ClassFields};
use crate::core::interval::GenomicInterval;
use crate::core::types::AnnotationSource;
use crate::parsing::{file_label, open_text, split_window, translate_window, ParseError};

/// Read classifier calls. `.out` files, or files whose first line starts with
/// the RepeatMasker `SW` header, are read as reports; anything else as TSV.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::MalformedAnnotation` for the first unparseable record.
pub fn read_repeatmasker_file(
    path: &Path,
    min_score: u32,
) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut text = String::new();
    open_text(path)?.read_to_string(&mut text)?;

    let is_out = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".out") || n.ends_with(".out.gz"));
    let records = if is_out || looks_like_report(&text) {
        parse_out_text(&text, &file_label(path), min_score)?
    } else {
        parse_tsv_text(&text, &file_label(path), min_score)?
    };
    debug!(path = %path.display(), records = records.len(), "Read classifier calls");
    Ok(records)
}

fn looks_like_report(text: &str) -> bool {
    text.lines()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| l.split_whitespace().next())
        .is_some_and(|token| token == "SW")
}

fn malformed(file: &str, line_num: usize, line: &str, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedAnnotation {
        detector: AnnotationSource::Classifier,
        file: file.to_string(),
        line_num,
        line: line.to_string(),
        reason: reason.into(),
    }
}

fn is_header(line: &str) -> bool {
    let first = line.split_whitespace().next().unwrap_or_default();
    first == "SW" || first == "score" || line.starts_with("There were no repetitive sequences")
}

/// # Errors
///
/// Returns `ParseError::MalformedAnnotation` for the first unparseable row.
pub fn parse_out_text(
    text: &str,
    file: &str,
    min_score: u32,
) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut records = Vec::new();
    let mut discarded = 0usize;

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || is_header(line) {
            continue;
        }
        let line_num = i + 1;
        let error = |reason: String| malformed(file, line_num, line, reason);

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 11 {
            return Err(error(format!(
                "expected at least 11 columns, got {}",
                fields.len()
            )));
        }

        let score: u32 = fields[0]
            .parse()
            .map_err(|_| error(format!("invalid score '{}'", fields[0])))?;
        let divergence: f64 = fields[1]
            .parse()
            .map_err(|_| error(format!("invalid divergence '{}'", fields[1])))?;
        let begin: u64 = fields[5]
            .parse()
            .map_err(|_| error(format!("invalid begin '{}'", fields[5])))?;
        let end: u64 = fields[6]
            .parse()
            .map_err(|_| error(format!("invalid end '{}'", fields[6])))?;

        if score < min_score {
            discarded += 1;
            continue;
        }

        let (contig, window_start) = match split_window(fields[4]) {
            Some((contig, start, _)) => (contig, start),
            None => (fields[4], 1),
        };
        let (start, end) = translate_window(window_start, begin, end)
            .ok_or_else(|| error("call coordinates fall outside its sequence window".to_string()))?;

        records.push(AnnotationRecord::new(
            records.len(),
            GenomicInterval::new(contig, start, end),
            AnnotationFields::Classifier(ClassFields {
                family: fields[10].to_string(),
                divergence,
                score: Some(score),
            }),
        ));
    }

    debug!(kept = records.len(), discarded, min_score, "Applied classifier score threshold");
    Ok(records)
}

/// # Errors
///
/// Returns `ParseError::MalformedAnnotation` for the first unparseable row.
pub fn parse_tsv_text(
    text: &str,
    file: &str,
    min_score: u32,
) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut records = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        let error = |reason: String| malformed(file, line_num, line, reason);

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(error(format!(
                "expected at least 5 columns, got {}",
                fields.len()
            )));
        }

        let start: u64 = fields[1]
            .parse()
            .map_err(|_| error(format!("invalid start '{}'", fields[1])))?;
        let end: u64 = fields[2]
            .parse()
            .map_err(|_| error(format!("invalid end '{}'", fields[2])))?;
        let divergence: f64 = fields[4]
            .parse()
            .map_err(|_| error(format!("invalid divergence '{}'", fields[4])))?;
        let score: Option<u32> = match fields.get(5).map(|s| s.trim()).filter(|s| !s.is_empty()) {
            Some(s) => Some(
                s.parse()
                    .map_err(|_| error(format!("invalid score '{s}'")))?,
            ),
            None => None,
        };

        if score.is_some_and(|s| s < min_score) {
            continue;
        }

        records.push(AnnotationRecord::new(
            records.len(),
            GenomicInterval::new(fields[0], start, end),
            AnnotationFields::Classifier(ClassFields {
                family: fields[3].to_string(),
                divergence,
                score,
            }),
        ));
    }

    Ok(records)
}
