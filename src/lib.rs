//! County-to-county migration extraction for one target county across the
//! annual release formats, plus the yearly migration-rate reduction.

pub mod adapt;
pub mod config;
pub mod error;
pub mod extract;
pub mod labels;
pub mod output;
pub mod pipeline;
pub mod types;

pub use config::Config;
pub use error::{MigrationError, Result};
pub use types::{AgiUnit, CanonicalRecord, SourceFile, SourceKind, YearlyRate};
