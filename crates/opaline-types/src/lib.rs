//! # opaline-types: Core types for `opaline`
//!
//! This crate contains the shared data model used across the `opaline`
//! system:
//! - Tabular records ([`Dataset`], [`RowId`])
//! - Attribute tagging ([`AttributeRole`])
//! - Normalization tokens ([`VALUE_NA`], [`VALUE_UNKNOWN_MISSING`])
//!
//! A [`Dataset`] is an ordered sequence of rows over a fixed header. The
//! column set is established at construction and never changes afterwards;
//! every row carries a value for every declared column. Anonymization stages
//! never mutate a dataset in place, they produce a new one.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Normalization tokens
// ============================================================================

/// Canonical token for values that are not available.
pub const VALUE_NA: &str = "n/a";

/// Canonical token that `unknown` and `missing` collapse to.
pub const VALUE_UNKNOWN_MISSING: &str = "unknown/missing";

/// Normalizes a raw input value.
///
/// Surrounding whitespace is trimmed; case-insensitive `unknown` and
/// `missing` collapse to the single [`VALUE_UNKNOWN_MISSING`] token. All
/// other values pass through trimmed.
///
/// # Examples
///
/// ```
/// use opaline_types::{normalize_token, VALUE_UNKNOWN_MISSING};
///
/// assert_eq!(normalize_token("  Recovered "), "Recovered");
/// assert_eq!(normalize_token("Unknown"), VALUE_UNKNOWN_MISSING);
/// assert_eq!(normalize_token("MISSING"), VALUE_UNKNOWN_MISSING);
/// ```
pub fn normalize_token(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("unknown") || trimmed.eq_ignore_ascii_case("missing") {
        VALUE_UNKNOWN_MISSING.to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Row identity
// ============================================================================

/// Index of a row within one dataset.
///
/// Row ids are positional and only meaningful relative to the dataset they
/// were produced from; a transformed dataset re-numbers its rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RowId(u32);

impl RowId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the row index as a usize for slice access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RowId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<RowId> for u32 {
    fn from(id: RowId) -> Self {
        id.0
    }
}

// ============================================================================
// Attribute roles
// ============================================================================

/// Privacy role of one attribute during a single anonymization pass.
///
/// Role assignment is explicit and total: every pass re-tags every column
/// from scratch, there is no partial re-tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRole {
    /// The attribute plays no role in re-identification.
    #[default]
    Insensitive,
    /// The attribute can, in combination with others, re-identify a person.
    QuasiIdentifying,
    /// Disclosure of the attribute within a small group is itself a harm.
    Sensitive,
}

impl Display for AttributeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeRole::Insensitive => write!(f, "insensitive"),
            AttributeRole::QuasiIdentifying => write!(f, "quasi-identifying"),
            AttributeRole::Sensitive => write!(f, "sensitive"),
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset header must not be empty")]
    EmptyHeader,

    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),

    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unknown column {0:?}")]
    UnknownColumn(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// An ordered collection of string-valued rows over a fixed header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Creates a dataset, validating that every row matches the header width
    /// and that column names are unique.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if header.is_empty() {
            return Err(DatasetError::EmptyHeader);
        }
        for (i, name) in header.iter().enumerate() {
            if header[..i].contains(name) {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(DatasetError::RowWidthMismatch {
                    row: i,
                    expected: header.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { header, rows })
    }

    /// Column names, in declaration order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// All rows, in dataset order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolves a column name to its index.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    /// Returns the value at (row, column). Panics on out-of-range indices;
    /// callers index with ids produced from this dataset.
    pub fn value(&self, row: RowId, column: usize) -> &str {
        &self.rows[row.index()][column]
    }

    /// Iterates over all row ids of this dataset.
    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        (0..self.rows.len()).map(|i| RowId::new(i as u32))
    }

    /// Produces a new dataset with the same header, keeping only the rows
    /// whose id satisfies the predicate. Row ids are re-numbered.
    pub fn filter_rows(&self, mut keep: impl FnMut(RowId) -> bool) -> Dataset {
        let rows = self
            .row_ids()
            .filter(|id| keep(*id))
            .map(|id| self.rows[id.index()].clone())
            .collect();
        Dataset {
            header: self.header.clone(),
            rows,
        }
    }

    /// Produces a new dataset with the same header and rows transformed by
    /// the given function.
    pub fn map_rows(&self, mut f: impl FnMut(RowId, &[String]) -> Vec<String>) -> Result<Dataset> {
        let rows = self
            .row_ids()
            .map(|id| f(id, &self.rows[id.index()]))
            .collect();
        Dataset::new(self.header.clone(), rows)
    }
}
