use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::consolidation::merger::{ConsolidatedAnnotation, SourceSummary};
use crate::core::interval::GenomicInterval;
use crate::core::types::RegionId;

/// Header line of the consolidated catalog
pub const CATALOG_HEADER: &str = "#contig\tstart\tend\tregion_id\tsource_summary\tcoverage_fraction\tconflict_flag\tpartial_detection";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read or write catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize source summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line {line_num}: {reason}")]
    InvalidRow { line_num: usize, reason: String },
}

/// Hex MD5 of catalog bytes, recorded in the stats report
#[must_use]
pub fn catalog_md5(bytes: &[u8]) -> String {
    let digest = md5::compute(bytes);
    format!("{digest:x}")
}

/// Write catalog rows in the given order, header first
///
/// # Errors
///
/// Returns `CatalogError::Io` on write failure or `CatalogError::Json` if a
/// source summary cannot be serialized.
pub fn write_catalog<W: Write>(
    mut writer: W,
    records: &[ConsolidatedAnnotation],
) -> Result<(), CatalogError> {
    writeln!(writer, "{CATALOG_HEADER}")?;
    for record in records {
        let summary = serde_json::to_string(&record.source_summary)?;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.interval.contig,
            record.interval.start,
            record.interval.end,
            record.region_id,
            summary,
            record.coverage_fraction,
            record.conflict_flag,
            record.partial_detection,
        )?;
    }
    Ok(())
}

/// Render the catalog to a string
///
/// # Errors
///
/// Returns `CatalogError::Json` if a source summary cannot be serialized.
pub fn catalog_to_string(records: &[ConsolidatedAnnotation]) -> Result<String, CatalogError> {
    let mut buffer = Vec::new();
    write_catalog(&mut buffer, records)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the catalog to `path` and return the MD5 of the written bytes
///
/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be written.
pub fn write_catalog_file(
    path: &Path,
    records: &[ConsolidatedAnnotation],
) -> Result<String, CatalogError> {
    let content = catalog_to_string(records)?;
    std::fs::write(path, &content)?;
    debug!(path = %path.display(), records = records.len(), "Wrote catalog");
    Ok(catalog_md5(content.as_bytes()))
}

/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be read or
/// `CatalogError::InvalidRow` for the first unparseable row.
pub fn read_catalog_file(path: &Path) -> Result<Vec<ConsolidatedAnnotation>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse catalog text. `#` lines are skipped.
///
/// # Errors
///
/// Returns `CatalogError::InvalidRow` for the first row with the wrong number
/// of columns, bad numbers or flags, a region id that does not match its
/// coordinates, or an unreadable source summary.
pub fn parse_catalog(text: &str) -> Result<Vec<ConsolidatedAnnotation>, CatalogError> {
    let mut records = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        let invalid = |reason: String| CatalogError::InvalidRow { line_num, reason };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 8 {
            return Err(invalid(format!("expected 8 columns, got {}", fields.len())));
        }

        let start: u64 = fields[1]
            .parse()
            .map_err(|_| invalid(format!("invalid start '{}'", fields[1])))?;
        let end: u64 = fields[2]
            .parse()
            .map_err(|_| invalid(format!("invalid end '{}'", fields[2])))?;
        let interval = GenomicInterval::new(fields[0], start, end);

        let region_id = RegionId::new(fields[3]);
        if region_id != RegionId::from_interval(&interval) {
            return Err(invalid(format!(
                "region id '{region_id}' does not match coordinates {interval}"
            )));
        }

        let source_summary: SourceSummary = serde_json::from_str(fields[4])
            .map_err(|e| invalid(format!("invalid source summary: {e}")))?;
        let coverage_fraction: f64 = fields[5]
            .parse()
            .map_err(|_| invalid(format!("invalid coverage '{}'", fields[5])))?;
        let conflict_flag = parse_flag(fields[6]).ok_or_else(|| {
            invalid(format!("invalid conflict flag '{}'", fields[6]))
        })?;
        let partial_detection = parse_flag(fields[7]).ok_or_else(|| {
            invalid(format!("invalid partial detection flag '{}'", fields[7]))
        })?;

        records.push(ConsolidatedAnnotation {
            region_id,
            interval,
            source_summary,
            coverage_fraction,
            conflict_flag,
            partial_detection,
        });
    }

    Ok(records)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
