use std::path::PathBuf;

use thiserror::Error;

use crate::labels::FlowCategory;

/// Everything that can stop a run. None of these are retried.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("unreadable source {}: {reason}", path.display())]
    UnreadableSource { path: PathBuf, reason: String },

    #[error("no expected member in archive {} (tried {candidates:?})", path.display())]
    MemberNotFound {
        path: PathBuf,
        candidates: Vec<String>,
    },

    #[error("year {year} is missing flow category `{category}`")]
    MissingCategoryForYear { year: String, category: FlowCategory },

    #[error("malformed row {row} in {}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("cannot derive a destination year from {}", path.display())]
    UnrecognizedFileName { path: PathBuf },

    #[error("field `{field}` is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown text encoding label {label:?}")]
    UnknownEncoding { label: String },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl MigrationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrationError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MigrationError::UnreadableSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
