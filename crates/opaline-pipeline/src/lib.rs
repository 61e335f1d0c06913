//! Anonymization pipeline for clinical case-record releases.
//!
//! Takes a loaded 16-column case table, runs the fixed pre-generalization
//! and the two screening stages, and returns the release dataset together
//! with a full audit trail in the caller's [`opaline_report::ReportSink`].
//!
//! The crate owns the release schema (column names, hierarchy assignments,
//! criterion parameters); loading and writing the delimited files is the
//! caller's concern.

pub mod fields;

mod error;
mod stages;

pub use error::{PipelineError, Result};
pub use stages::{first_stage, generalize, run, second_stage};
