// src/output.rs

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::info;

use crate::{
    error::{MigrationError, Result},
    types::{CanonicalRecord, YearlyRate},
};

pub const RECORD_COLUMNS: [&str; 9] = [
    "year2",
    "year1_state_fips",
    "year1_county_fips",
    "year1_state",
    "year1_county",
    "returns",
    "exemptions",
    "agi",
    "agi_unit",
];

pub const RATE_COLUMNS: [&str; 4] = ["year", "in_state", "out_of_state", "foreign"];

/// Serialize `rows` to `path` as CSV under an explicit `header`, which must
/// follow the field order of `T`. The header is written even with no rows.
fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MigrationError::io(parent, e))?;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| MigrationError::io(path, e))?;

    info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

/// Canonical records, one row each.
pub fn write_records(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    write_csv(path, &RECORD_COLUMNS, records)
}

/// Yearly rates with two-decimal percentages.
pub fn write_rates(path: &Path, rates: &[YearlyRate]) -> Result<()> {
    write_csv(path, &RATE_COLUMNS, rates)
}

/// Read a canonical records file written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let records = reader
        .deserialize::<CanonicalRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}
