// src/types.rs

use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, path::PathBuf};

/// Which historical release layout a source file uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Earliest era: one zipped workbook per two-year span.
    LegacyArchiveA,
    /// Middle era: one zipped workbook per year.
    LegacyArchiveB,
    /// Latest era: one header-keyed CSV per year.
    FlatDelimited,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::LegacyArchiveA => "legacy-archive-a",
            SourceKind::LegacyArchiveB => "legacy-archive-b",
            SourceKind::FlatDelimited => "flat-delimited",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Destination year, four digits.
    pub year: String,
    pub kind: SourceKind,
    pub path: PathBuf,
}

/// Unit of the `agi` figure. Earliest releases report whole dollars,
/// later ones thousands of dollars; values are never rescaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgiUnit {
    Dollars,
    Thousands,
}

/// One origin → target-county row, independent of the release format.
/// Column order here is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub year2: String,
    pub year1_state_fips: String,
    pub year1_county_fips: String,
    pub year1_state: String,
    /// Origin county name or flow-category label, already normalized.
    pub year1_county: String,
    pub returns: String,
    pub exemptions: String,
    pub agi: String,
    pub agi_unit: AgiUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyRate {
    pub year: String,
    #[serde(serialize_with = "two_decimals")]
    pub in_state: f64,
    #[serde(serialize_with = "two_decimals")]
    pub out_of_state: f64,
    #[serde(serialize_with = "two_decimals")]
    pub foreign: f64,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}
