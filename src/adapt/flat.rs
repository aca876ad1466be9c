// src/adapt/flat.rs

use serde::Deserialize;
use std::{fs, path::Path};
use tracing::{info, instrument};

use super::{AdaptContext, FormatAdapter};
use crate::{
    error::{MigrationError, Result},
    extract::delimited::extract_named_rows,
    types::{AgiUnit, CanonicalRecord, SourceFile},
};

/// The columns of a flat release this crate reads; any others are ignored.
#[derive(Debug, Deserialize)]
struct FlatRow {
    y2_statefips: String,
    y2_countyfips: String,
    y1_statefips: String,
    y1_countyfips: String,
    y1_state: String,
    y1_countyname: String,
    n1: String,
    n2: String,
    agi: String,
}

/// Header-keyed CSV releases. Stored origin FIPS codes are rewritten as
/// plain integers, so `"01"` becomes `"1"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatAdapter;

fn fips(path: &Path, row: usize, field: &str, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| MigrationError::MalformedRow {
        path: path.to_path_buf(),
        row,
        reason: format!("{} {:?} is not an integer", field, value),
    })
}

impl FormatAdapter for FlatAdapter {
    #[instrument(level = "info", skip(self, source, ctx), fields(path = %source.path.display(), year = %source.year))]
    fn adapt(&self, source: &SourceFile, ctx: &AdaptContext<'_>) -> Result<Vec<CanonicalRecord>> {
        info!("parsing {}", source.year);
        let bytes = fs::read(&source.path).map_err(|e| MigrationError::io(&source.path, e))?;
        let rows: Vec<FlatRow> = extract_named_rows(&source.path, &bytes, ctx.encoding)?;

        let path = source.path.as_path();
        let mut output = Vec::new();
        for (idx, row) in rows.into_iter().enumerate() {
            let state = fips(path, idx, "y2_statefips", &row.y2_statefips)?;
            let county = fips(path, idx, "y2_countyfips", &row.y2_countyfips)?;
            if !ctx.target.matches(state, county) {
                continue;
            }

            output.push(CanonicalRecord {
                year2: source.year.clone(),
                year1_state_fips: fips(path, idx, "y1_statefips", &row.y1_statefips)?.to_string(),
                year1_county_fips: fips(path, idx, "y1_countyfips", &row.y1_countyfips)?
                    .to_string(),
                year1_state: row.y1_state,
                year1_county: ctx.normalizer.normalize(&row.y1_countyname),
                returns: row.n1,
                exemptions: row.n2,
                agi: row.agi,
                agi_unit: AgiUnit::Thousands,
            });
        }

        info!(records = output.len(), "parsed {}", source.year);
        Ok(output)
    }
}
