// src/extract/delimited.rs

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{MigrationError, Result};

/// Decode `bytes` with an explicit single-byte `encoding`, then read it as a
/// header-keyed CSV, deserializing each data row into `T` by column name.
pub fn extract_named_rows<T: DeserializeOwned>(
    path: &Path,
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<Vec<T>> {
    // never sniff a BOM: the releases are plain single-byte text
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(MigrationError::unreadable(
            path,
            format!("bytes not valid {}", encoding.name()),
        ));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize::<T>().enumerate() {
        let row = result
            .map_err(|e| MigrationError::unreadable(path, format!("record {}: {}", idx, e)))?;
        rows.push(row);
    }
    Ok(rows)
}
