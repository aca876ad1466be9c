// src/extract/mod.rs
//! Turns a decoded tabular source into ordered rows of raw cells.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::{io::Cursor, path::Path};
use tracing::trace;

use crate::error::{MigrationError, Result};

pub mod delimited;

/// Rows above the data in every legacy workbook.
pub const DEFAULT_HEADER_ROWS: usize = 8;

pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Number(f64),
    Empty,
}

pub type RawRow = Vec<RawCell>;

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) => false,
        }
    }

    /// Integer value of the cell, if it holds one. Text is trimmed first,
    /// so `"048"` reads as 48.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(*n as i64),
            RawCell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render for storage: integer-valued numbers lose their float
    /// formatting (`48.0` → `"48"`), text keeps its characters (including
    /// zero padding) minus surrounding whitespace.
    pub fn to_plain_string(&self) -> String {
        match self {
            RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            RawCell::Number(n) => format!("{}", n),
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Empty => String::new(),
        }
    }
}

/// The "open a workbook, give me its rows" capability.
pub trait TabularDecoder {
    /// Decode `bytes` and return every row of the first sheet, top to bottom.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Vec<RawRow>, DecodeError>;
}

/// Workbook decoder backed by calamine. The container format (xls, xlsx,
/// xlsb, ods) is sniffed from the bytes, not the member name.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineDecoder;

impl TabularDecoder for CalamineDecoder {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Vec<RawRow>, DecodeError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or("workbook has no sheets")??;

        // the used range may not start at A1; pad so indices match the sheet
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<RawRow> = (0..start_row).map(|_| Vec::new()).collect();
        for row in range.rows() {
            let mut cells: RawRow = vec![RawCell::Empty; start_col as usize];
            cells.extend(row.iter().map(to_raw_cell));
            rows.push(cells);
        }
        Ok(rows)
    }
}

fn to_raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(n) => RawCell::Number(*n),
        Data::Int(n) => RawCell::Number(*n as f64),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        other => RawCell::Text(other.to_string()),
    }
}

/// Decode a workbook, drop the fixed header band and any blank rows.
pub fn extract_rows(
    decoder: &dyn TabularDecoder,
    path: &Path,
    bytes: &[u8],
    header_rows: usize,
) -> Result<Vec<RawRow>> {
    let rows = decoder
        .decode(bytes)
        .map_err(|e| MigrationError::unreadable(path, e))?;
    let total = rows.len();

    let data: Vec<RawRow> = rows
        .into_iter()
        .skip(header_rows)
        .filter(|row| !row.iter().all(RawCell::is_empty))
        .collect();

    trace!(total, kept = data.len(), "extracted workbook rows");
    Ok(data)
}
