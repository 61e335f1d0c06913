//! Engine error types.
//!
//! The engine distinguishes configuration defects (rejected before any
//! search runs), data/hierarchy mismatches (fatal, never recoverable), and
//! genuine infeasibility of the privacy model. None of these are retried:
//! every engine operation is deterministic, so a retry would reproduce the
//! identical outcome.

use opaline_types::DatasetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed criteria parameters or an inconsistent attribute
    /// definition. Raised during validation, before any lattice node is
    /// evaluated.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A dataset value has no entry in the hierarchy declared for its
    /// attribute. This is a correctness bug in data or hierarchy tables,
    /// surfaced immediately.
    #[error("value {value:?} of attribute {attribute:?} has no entry in its hierarchy")]
    UnknownValue { attribute: String, value: String },

    /// No transformation in the lattice satisfies all criteria within the
    /// suppression limit.
    #[error(
        "no transformation satisfies [{criteria}] within a suppression limit of {limit}"
    )]
    Infeasible { criteria: String, limit: f64 },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Hierarchy(#[from] opaline_hierarchy::HierarchyError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
