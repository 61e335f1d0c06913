//! Sample-based re-identification risk statistics.
//!
//! The per-row risk is `1 / |equivalence class|` under quasi-identifier-only
//! grouping of the raw values (identity transformation, no generalization).
//! The profile aggregates the minimum, arithmetic mean, and maximum of the
//! per-row risks over the whole dataset.

use serde::{Deserialize, Serialize};

use opaline_types::Dataset;

use crate::definition::Definition;
use crate::error::Result;
use crate::lattice::LevelVector;
use crate::partition::partition;

/// Lowest / average / highest per-row re-identification risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub lowest: f64,
    pub average: f64,
    pub highest: f64,
}

impl RiskProfile {
    /// The profile of an empty dataset: nobody to re-identify.
    pub const EMPTY: RiskProfile = RiskProfile {
        lowest: 0.0,
        average: 0.0,
        highest: 0.0,
    };
}

/// Computes the risk profile of a dataset with the given attributes treated
/// as quasi-identifiers.
///
/// Deterministic and `O(rows)` after partitioning.
pub fn assess_risk(dataset: &Dataset, quasi_identifiers: &[&str]) -> Result<RiskProfile> {
    if dataset.is_empty() {
        return Ok(RiskProfile::EMPTY);
    }

    let mut definition = Definition::new();
    for name in quasi_identifiers {
        definition = definition.quasi_identifying(*name);
    }
    let identity = LevelVector::new(vec![0; quasi_identifiers.len()]);
    let classes = partition(dataset, &definition, &identity)?;

    let largest = classes.max_class_size().expect("dataset is non-empty");
    let smallest = classes.min_class_size().expect("dataset is non-empty");

    // Mean of 1/|class| over rows: every class contributes |class| rows of
    // risk 1/|class|, so the sum is simply the class count.
    let average = classes.num_classes() as f64 / classes.total_rows() as f64;

    let profile = RiskProfile {
        lowest: 1.0 / largest as f64,
        average,
        highest: 1.0 / smallest as f64,
    };

    debug_assert!(profile.lowest <= profile.average && profile.average <= profile.highest);
    Ok(profile)
}
