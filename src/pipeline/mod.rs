// src/pipeline/mod.rs
//! Discover every yearly release, adapt, merge and sort.

use glob::{glob, Pattern};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, instrument, warn};

use crate::{
    adapt::{self, AdaptContext},
    config::Config,
    error::{MigrationError, Result},
    extract::TabularDecoder,
    output::write_records,
    types::{CanonicalRecord, SourceFile, SourceKind},
};

pub mod rates;

/// `dir/*.ext`, sorted by path. A missing directory yields nothing.
fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.{}", Pattern::escape(&dir.display().to_string()), ext);
    let mut paths: Vec<PathBuf> = glob(&pattern)
        .map_err(|e| MigrationError::Config {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Every source file under the three era directories, tagged with the
/// format its directory holds.
pub fn discover_sources(config: &Config) -> Result<Vec<SourceFile>> {
    let dirs = [
        (&config.legacy_a_dir, "zip", SourceKind::LegacyArchiveA),
        (&config.legacy_b_dir, "zip", SourceKind::LegacyArchiveB),
        (&config.flat_dir, "csv", SourceKind::FlatDelimited),
    ];

    let mut sources = Vec::new();
    for (dir, ext, kind) in dirs {
        let paths = list_files(dir, ext)?;
        if paths.is_empty() {
            warn!(dir = %dir.display(), %kind, "no source files");
        }
        for path in paths {
            let year = adapt::destination_year(kind, &path)?;
            sources.push(SourceFile { year, kind, path });
        }
    }

    info!(sources = sources.len(), "discovered source files");
    Ok(sources)
}

/// Order by (destination year, origin state FIPS, origin county FIPS),
/// compared as strings: `"10"` sorts before `"9"`. Stable, so rows with
/// equal keys keep their source order.
pub fn sort_records(records: &mut [CanonicalRecord]) {
    records.sort_by(|a, b| {
        (&a.year2, &a.year1_state_fips, &a.year1_county_fips).cmp(&(
            &b.year2,
            &b.year1_state_fips,
            &b.year1_county_fips,
        ))
    });
}

/// Adapt every source in turn and return the merged, sorted records.
pub fn collect_records(
    sources: &[SourceFile],
    ctx: &AdaptContext<'_>,
) -> Result<Vec<CanonicalRecord>> {
    let mut records = Vec::new();
    for source in sources {
        records.extend(adapt::adapt(source, ctx)?);
    }
    sort_records(&mut records);
    Ok(records)
}

/// Extraction phase: discover, adapt, merge, sort and write the canonical
/// records file.
#[instrument(level = "info", skip(config, decoder))]
pub fn run_extract(config: &Config, decoder: &dyn TabularDecoder) -> Result<Vec<CanonicalRecord>> {
    let start = Instant::now();
    let normalizer = config.normalizer();
    let ctx = AdaptContext {
        target: config.target,
        normalizer: &normalizer,
        decoder,
        header_rows: config.header_rows,
        encoding: config.text_encoding()?,
    };

    let sources = discover_sources(config)?;
    let records = collect_records(&sources, &ctx)?;
    write_records(&config.records_path, &records)?;

    info!(records = records.len(), elapsed = ?start.elapsed(), "extraction done");
    Ok(records)
}
