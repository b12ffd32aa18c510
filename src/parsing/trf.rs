//! Parser for period-finder (TRF) calls.
//!
//! Two layouts are accepted:
//!
//! - Reformatted TSV, 0-based half-open:
//!   `chrom  start  end  period  copies  score  entropy  motif`
//! - Raw `trf -ngs` report: an `@name` line per fetched sequence, followed by
//!   space-separated rows `start end period copies consensus_size pct_match
//!   pct_indel score A C G T entropy motif [flanks...]` with 1-based inclusive
//!   coordinates inside the sequence. `name` is `contig:start-end` for a fetched
//!   window or a plain contig name.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::core::annotation::{AnnotationFields, AnnotationRecord, PeriodFields};
use crate::core::interval::GenomicInterval;
use crate::core::types::AnnotationSource;
use crate::parsing::{file_label, open_text, split_window, translate_window, ParseError};

/// Read TRF calls, detecting the layout from the first non-blank line
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::MalformedAnnotation` for the first unparseable record.
pub fn read_trf_file(path: &Path) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut text = String::new();
    open_text(path)?.read_to_string(&mut text)?;
    let records = parse_trf_text(&text, &file_label(path))?;
    debug!(path = %path.display(), records = records.len(), "Read period-finder calls");
    Ok(records)
}

/// # Errors
///
/// Returns `ParseError::MalformedAnnotation` for the first unparseable record.
pub fn parse_trf_text(text: &str, file: &str) -> Result<Vec<AnnotationRecord>, ParseError> {
    let is_ngs = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with('@'));

    if is_ngs {
        parse_ngs(text, file)
    } else {
        parse_tsv(text, file)
    }
}

struct LineContext<'a> {
    file: &'a str,
    line_num: usize,
    line: &'a str,
}

impl LineContext<'_> {
    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::MalformedAnnotation {
            detector: AnnotationSource::PeriodFinder,
            file: self.file.to_string(),
            line_num: self.line_num,
            line: self.line.to_string(),
            reason: reason.into(),
        }
    }

    fn field<T: std::str::FromStr>(&self, value: Option<&str>, name: &str) -> Result<T, ParseError> {
        let value = value.ok_or_else(|| self.error(format!("missing {name}")))?;
        value
            .parse()
            .map_err(|_| self.error(format!("invalid {name} '{value}'")))
    }
}

fn parse_tsv(text: &str, file: &str) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut records = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let ctx = LineContext {
            file,
            line_num: i + 1,
            line,
        };

        let mut fields = line.split('\t');
        let contig: String = ctx.field(fields.next(), "chrom")?;
        let start = ctx.field(fields.next(), "start")?;
        let end = ctx.field(fields.next(), "end")?;
        let period = PeriodFields {
            period: ctx.field(fields.next(), "period")?,
            copies: ctx.field(fields.next(), "copies")?,
            score: ctx.field(fields.next(), "score")?,
            entropy: ctx.field(fields.next(), "entropy")?,
            motif: ctx.field(fields.next(), "motif")?,
        };

        records.push(AnnotationRecord::new(
            records.len(),
            GenomicInterval::new(contig, start, end),
            AnnotationFields::PeriodFinder(period),
        ));
    }

    Ok(records)
}

fn parse_ngs(text: &str, file: &str) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut records = Vec::new();
    let mut window: Option<(String, u64)> = None;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let ctx = LineContext {
            file,
            line_num: i + 1,
            line,
        };

        if let Some(name) = line.strip_prefix('@') {
            window = Some(match split_window(name) {
                Some((contig, start, _)) => (contig.to_string(), start),
                None => (name.to_string(), 1),
            });
            continue;
        }

        let Some((contig, window_start)) = &window else {
            return Err(ctx.error("call before any '@' sequence header"));
        };

        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() < 14 {
            return Err(ctx.error(format!("expected at least 14 columns, got {}", fields.len())));
        }
        let call_start: u64 = ctx.field(Some(fields[0]), "start")?;
        let call_end: u64 = ctx.field(Some(fields[1]), "end")?;
        let (start, end) = translate_window(*window_start, call_start, call_end)
            .ok_or_else(|| ctx.error("call coordinates fall outside its sequence window"))?;

        let period = PeriodFields {
            period: ctx.field(Some(fields[2]), "period")?,
            copies: ctx.field(Some(fields[3]), "copies")?,
            score: ctx.field(Some(fields[7]), "score")?,
            entropy: ctx.field(Some(fields[12]), "entropy")?,
            motif: fields[13].to_string(),
        };

        records.push(AnnotationRecord::new(
            records.len(),
            GenomicInterval::new(contig.clone(), start, end),
            AnnotationFields::PeriodFinder(period),
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period_fields(record: &AnnotationRecord) -> &PeriodFields {
        match &record.fields {
            AnnotationFields::PeriodFinder(fields) => fields,
            AnnotationFields::Classifier(_) => panic!("not a period-finder record"),
        }
    }

    #[test]
    fn test_parse_tsv() {
        let text = "chr1\t100\t160\t2.0\t30.0\t120\t1.0\tAC\nchr1\t500\t530\t3\t10.0\t60\t1.58\tAGG\n";
        let records = parse_trf_text(text, "trf.tsv").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].interval, GenomicInterval::new("chr1", 100, 160));
        assert_eq!(records[1].id.to_string(), "pf:1");
        let fields = period_fields(&records[1]);
        assert_eq!(fields.period, 3.0);
        assert_eq!(fields.score, 60);
        assert_eq!(fields.motif, "AGG");
    }

    #[test]
    fn test_parse_ngs_translates_coordinates() {
        let text = "@chr1:1001-2000\n\
                    11 30 2 10.0 2 100 0 40 50 50 0 0 1.00 AC ACGT ACACACACACACACACACAC GGCC\n\
                    @chr2\n\
                    1 6 3 2.0 3 100 0 12 33 33 33 0 1.58 AGC . AGCAGC .\n";
        let records = parse_trf_text(text, "trf.ngs").unwrap();

        assert_eq!(records.len(), 2);
        // chr1:1001-2000 starts at 0-based 1000; call bases 11..=30
        assert_eq!(records[0].interval, GenomicInterval::new("chr1", 1010, 1030));
        assert_eq!(records[1].interval, GenomicInterval::new("chr2", 0, 6));
        let fields = period_fields(&records[0]);
        assert_eq!(fields.score, 40);
        assert_eq!(fields.entropy, 1.0);
        assert_eq!(fields.motif, "AC");
    }

    #[test]
    fn test_malformed_records() {
        match parse_trf_text("chr1\t100\t160\t2.0\tmany\t120\t1.0\tAC\n", "trf.tsv") {
            Err(ParseError::MalformedAnnotation {
                detector, line_num, reason, ..
            }) => {
                assert_eq!(detector, AnnotationSource::PeriodFinder);
                assert_eq!(line_num, 1);
                assert!(reason.contains("copies"));
            }
            other => panic!("expected malformed annotation, got {other:?}"),
        }

        assert!(parse_trf_text("chr1\t100\t160\n", "trf.tsv").is_err());
        assert!(parse_trf_text("@chr1:1-100\n1 2 3\n", "trf.ngs").is_err());
    }

    #[test]
    fn test_ngs_window_past_coordinate_range() {
        let text = "@chr1:18446744073709551615-18446744073709551615\n\
                    11 30 2 10.0 2 100 0 40 50 50 0 0 1.00 AC ACGT ACACACACACACACACACAC GGCC\n";
        match parse_trf_text(text, "trf.ngs") {
            Err(ParseError::MalformedAnnotation {
                line_num, reason, ..
            }) => {
                assert_eq!(line_num, 2);
                assert!(reason.contains("outside its sequence window"), "{reason}");
            }
            other => panic!("expected malformed annotation, got {other:?}"),
        }
    }
}
