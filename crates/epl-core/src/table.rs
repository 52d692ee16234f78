// Shared helpers for header-plus-rows tabular input.
//
// Headers and cells are whitespace-trimmed before use. Numeric cells that are
// empty, unparseable, or non-finite become `None` rather than failing the row.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("required column `{column}` not found in header")]
    MissingColumn { column: String },

    #[error("duplicate column `{column}` in header")]
    DuplicateColumn { column: String },
}

/// Outcome of parsing a single numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    /// Blank cell, or a non-finite marker such as `inf` or `nan`.
    Missing,
    /// Non-empty text that is not a number.
    Malformed,
}

impl Cell {
    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(v),
            Cell::Missing | Cell::Malformed => None,
        }
    }
}

/// Parse a numeric cell. Non-finite values count as missing.
pub fn parse_number(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        Ok(_) => Cell::Missing,
        Err(_) => Cell::Malformed,
    }
}

/// Parse an age cell. Accepts `25`, `25.0`, or the `years-days` form `25-123`.
pub fn parse_age(raw: &str) -> Cell {
    let s = raw.trim();
    match s.split_once('-') {
        Some((years, days)) if !years.is_empty() && days.trim().parse::<u32>().is_ok() => {
            parse_number(years)
        }
        _ => parse_number(s),
    }
}

/// Column name → position lookup for a normalized header row.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Build an index from raw header cells, trimming each name.
    pub fn new<I, S>(headers: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        let mut positions = HashMap::new();
        for (i, h) in headers.into_iter().enumerate() {
            let name = h.as_ref().trim().to_string();
            if positions.insert(name.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn { column: name });
            }
            names.push(name);
        }
        Ok(HeaderIndex { names, positions })
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn require(&self, column: &str) -> Result<usize, TableError> {
        self.position(column).ok_or_else(|| TableError::MissingColumn {
            column: column.to_string(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
