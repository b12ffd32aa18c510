use std::io::Write;
use std::path::Path;

use crate::catalog::store::CatalogError;
use crate::core::interval::GenomicInterval;
use crate::core::region::Region;
use crate::core::types::{RegionId, RejectionReason};

/// Header line of the filtered region table
pub const REGION_TABLE_HEADER: &str = "#contig\tstart\tend\tregion_id\tstatus\treason";

/// Write one row per region: kept rows have reason `.`
///
/// # Errors
///
/// Returns `CatalogError::Io` on write failure.
pub fn write_region_table<'r, W: Write>(
    mut writer: W,
    regions: impl IntoIterator<Item = &'r Region>,
) -> Result<(), CatalogError> {
    writeln!(writer, "{REGION_TABLE_HEADER}")?;
    for region in regions {
        let reason = region
            .rejection_reason()
            .map_or_else(|| ".".to_string(), |r| r.to_string());
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            region.interval.contig,
            region.interval.start,
            region.interval.end,
            region.id,
            region.status,
            reason,
        )?;
    }
    Ok(())
}

/// Write kept regions as BED4 (name = region id)
///
/// # Errors
///
/// Returns `CatalogError::Io` on write failure.
pub fn write_kept_bed<'r, W: Write>(
    mut writer: W,
    regions: impl IntoIterator<Item = &'r Region>,
) -> Result<(), CatalogError> {
    for region in regions.into_iter().filter(|r| r.is_kept()) {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            region.interval.contig, region.interval.start, region.interval.end, region.id,
        )?;
    }
    Ok(())
}

/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be read or
/// `CatalogError::InvalidRow` for the first unparseable row.
pub fn read_region_table_file(path: &Path) -> Result<Vec<Region>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    parse_region_table(&content)
}

/// Parse a filtered region table. `#` lines are skipped.
///
/// # Errors
///
/// Returns `CatalogError::InvalidRow` for the first row with the wrong number
/// of columns, bad coordinates, an unknown status or reason, or a region id
/// that does not match its coordinates.
pub fn parse_region_table(text: &str) -> Result<Vec<Region>, CatalogError> {
    let mut regions = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        let invalid = |reason: String| CatalogError::InvalidRow { line_num, reason };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 6 {
            return Err(invalid(format!("expected 6 columns, got {}", fields.len())));
        }

        let start: u64 = fields[1]
            .parse()
            .map_err(|_| invalid(format!("invalid start '{}'", fields[1])))?;
        let end: u64 = fields[2]
            .parse()
            .map_err(|_| invalid(format!("invalid end '{}'", fields[2])))?;
        let interval = GenomicInterval::new(fields[0], start, end);

        let region = match (fields[4], fields[5]) {
            ("kept", ".") => Region::kept(interval),
            ("rejected", reason) => {
                let reason = RejectionReason::ALL
                    .into_iter()
                    .find(|r| r.to_string() == reason)
                    .ok_or_else(|| invalid(format!("unknown rejection reason '{reason}'")))?;
                Region::rejected(interval, reason)
            }
            (status, reason) => {
                return Err(invalid(format!(
                    "invalid status/reason '{status}'/'{reason}'"
                )));
            }
        };

        if region.id != RegionId::new(fields[3]) {
            return Err(invalid(format!(
                "region id '{}' does not match coordinates {}",
                fields[3], region.interval
            )));
        }
        regions.push(region);
    }

    Ok(regions)
}
