// src/adapt/mod.rs
//! Format adapters: one per historical release layout, all producing
//! `CanonicalRecord`s for the target county only.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    error::Result,
    extract::TabularDecoder,
    labels::LabelNormalizer,
    types::{CanonicalRecord, SourceFile, SourceKind},
};

pub mod archive;
pub mod flat;
pub mod utils;

pub use archive::{ArchiveAdapter, ArchiveVariant};
pub use flat::FlatAdapter;

/// The destination jurisdiction whose inbound rows are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub state_fips: i64,
    pub county_fips: i64,
}

impl Default for Target {
    fn default() -> Self {
        // Smith County, Texas
        Self {
            state_fips: 48,
            county_fips: 423,
        }
    }
}

impl Target {
    pub fn matches(&self, state_fips: i64, county_fips: i64) -> bool {
        self.state_fips == state_fips && self.county_fips == county_fips
    }
}

/// Everything an adapter needs besides the source itself.
pub struct AdaptContext<'a> {
    pub target: Target,
    pub normalizer: &'a LabelNormalizer,
    pub decoder: &'a dyn TabularDecoder,
    pub header_rows: usize,
    pub encoding: &'static Encoding,
}

pub trait FormatAdapter {
    fn adapt(&self, source: &SourceFile, ctx: &AdaptContext<'_>) -> Result<Vec<CanonicalRecord>>;
}

/// Run `source` through the adapter its format tag selects.
pub fn adapt(source: &SourceFile, ctx: &AdaptContext<'_>) -> Result<Vec<CanonicalRecord>> {
    match source.kind {
        SourceKind::LegacyArchiveA => ArchiveAdapter::new(ArchiveVariant::LegacyA).adapt(source, ctx),
        SourceKind::LegacyArchiveB => ArchiveAdapter::new(ArchiveVariant::LegacyB).adapt(source, ctx),
        SourceKind::FlatDelimited => FlatAdapter.adapt(source, ctx),
    }
}

/// Destination year encoded in a source's file name.
pub fn destination_year(kind: SourceKind, path: &Path) -> Result<String> {
    match kind {
        SourceKind::LegacyArchiveA => {
            let (_, end) = utils::span_years(path)?;
            Ok(format!("{:04}", end))
        }
        SourceKind::LegacyArchiveB | SourceKind::FlatDelimited => utils::year_from_stem_suffix(path),
    }
}
