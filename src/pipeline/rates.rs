// src/pipeline/rates.rs

use std::{collections::HashMap, ops::RangeInclusive};
use tracing::{debug, info, instrument};

use crate::{
    config::Config,
    error::{MigrationError, Result},
    labels::{FlowCategory, LabelNormalizer},
    output::{read_records, write_rates},
    types::{CanonicalRecord, YearlyRate},
};

/// `part / whole` as a percentage rounded to two places, ties to even.
fn percent(part: f64, whole: f64) -> f64 {
    (part / whole * 100.0 * 100.0).round_ties_even() / 100.0
}

/// Sum exemptions per (year, flow category) and turn them into in-state,
/// out-of-state and foreign rates relative to non-migrants, for every year
/// in `years`.
///
/// Fails on the first year (ascending) lacking any of the four categories;
/// no partial output is returned.
pub fn compute_rates(
    records: &[CanonicalRecord],
    normalizer: &LabelNormalizer,
    years: RangeInclusive<u32>,
) -> Result<Vec<YearlyRate>> {
    let mut by_year: HashMap<&str, HashMap<FlowCategory, f64>> = HashMap::new();
    for record in records {
        let Some(category) = normalizer.classify(&record.year1_county) else {
            continue;
        };
        let exemptions: f64 =
            record
                .exemptions
                .trim()
                .parse()
                .map_err(|_| MigrationError::InvalidNumber {
                    field: "exemptions",
                    value: record.exemptions.clone(),
                })?;
        *by_year
            .entry(record.year2.as_str())
            .or_default()
            .entry(category)
            .or_insert(0.0) += exemptions;
    }

    let mut rates = Vec::new();
    for year in years {
        let year = year.to_string();
        let sums = by_year.get(year.as_str());
        let total = |category: FlowCategory| {
            sums.and_then(|s| s.get(&category))
                .copied()
                .ok_or_else(|| MigrationError::MissingCategoryForYear {
                    year: year.clone(),
                    category,
                })
        };

        let non_migrant = total(FlowCategory::NonMigrant)?;
        if non_migrant == 0.0 {
            // nothing to divide by; treat like an absent row
            return Err(MigrationError::MissingCategoryForYear {
                year: year.clone(),
                category: FlowCategory::NonMigrant,
            });
        }

        let rate = YearlyRate {
            in_state: percent(total(FlowCategory::InState)?, non_migrant),
            out_of_state: percent(total(FlowCategory::OutOfState)?, non_migrant),
            foreign: percent(total(FlowCategory::Foreign)?, non_migrant),
            year: year.clone(),
        };
        debug!(?rate, "computed");
        rates.push(rate);
    }

    Ok(rates)
}

/// Rates phase on its own: read the canonical records file, compute and
/// write the rates file.
#[instrument(level = "info", skip(config), fields(records = %config.records_path.display()))]
pub fn run_rates(config: &Config) -> Result<Vec<YearlyRate>> {
    let records = read_records(&config.records_path)?;
    info!(records = records.len(), "loaded canonical records");

    let rates = compute_rates(&records, &config.normalizer(), config.years())?;
    write_rates(&config.rates_path, &rates)?;
    Ok(rates)
}
