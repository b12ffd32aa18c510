//! Parser for contig-length tables.
//!
//! Two layouts are accepted, both giving contig declaration order by line order:
//!
//! - FASTA index (`.fai`): `name\tlength\toffset\tline_bases\tline_width`, read
//!   with noodles
//! - genome file: `name\tlength`, as used by bedtools

use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::core::contig::{Contig, ContigTable};
use crate::parsing::ParseError;
use crate::utils::validation::check_contig_limit;

/// Read a contig table. Files ending in `.fai` are read as a FASTA index,
/// anything else as a genome file.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` or
/// `ParseError::InvalidFormat` if it cannot be parsed, `ParseError::Contigs` if
/// names repeat or a length is zero, or `ParseError::TooManyContigs`.
pub fn read_contig_table(path: &Path) -> Result<ContigTable, ParseError> {
    let is_fai = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("fai"));

    let table = if is_fai {
        parse_fai_file(path)?
    } else {
        parse_genome_text(&std::fs::read_to_string(path)?)?
    };
    debug!(path = %path.display(), contigs = table.len(), "Read contig table");
    Ok(table)
}

/// Parse a FASTA index (.fai) file using noodles
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no contigs are found,
/// `ParseError::Contigs` for an invalid table, or `ParseError::TooManyContigs`
/// if the limit is exceeded.
pub fn parse_fai_file(path: &Path) -> Result<ContigTable, ParseError> {
    use noodles::fasta;

    let reader = std::fs::File::open(path).map(BufReader::new)?;

    let index = fasta::fai::io::Reader::new(reader)
        .read_index()
        .map_err(|e| ParseError::Noodles(format!("Failed to parse FAI file: {e}")))?;

    index_to_table(&index)
}

fn index_to_table(index: &noodles::fasta::fai::Index) -> Result<ContigTable, ParseError> {
    let mut contigs = Vec::new();

    for record in index.as_ref() {
        if check_contig_limit(contigs.len()).is_some() {
            return Err(ParseError::TooManyContigs(contigs.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        contigs.push(Contig::new(name, record.length()));
    }

    if contigs.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No contigs found in FAI file".to_string(),
        ));
    }

    Ok(ContigTable::new(contigs)?)
}

/// Parse a genome file or FAI text: the first two tab-separated columns are the
/// contig name and length; further columns are ignored.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 2 fields, an
/// invalid length, or no contigs are found, `ParseError::Contigs` for an
/// invalid table, or `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_genome_text(text: &str) -> Result<ContigTable, ParseError> {
    let mut contigs = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 2 fields"
            )));
        }

        if check_contig_limit(contigs.len()).is_some() {
            return Err(ParseError::TooManyContigs(contigs.len()));
        }

        let name = fields[0].to_string();
        let length: u64 = fields[1].trim().parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid length for contig '{}' on line {}: {}",
                name, line_num, fields[1]
            ))
        })?;

        contigs.push(Contig::new(name, length));
    }

    if contigs.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No contigs found in contig table".to_string(),
        ));
    }

    Ok(ContigTable::new(contigs)?)
}
