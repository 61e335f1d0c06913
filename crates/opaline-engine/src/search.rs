//! Loss-minimal search over the transformation lattice.
//!
//! A pass is a pure function of (dataset, definition, criteria, suppression
//! limit): `Configured -> Searching -> Feasible | Infeasible`, with no
//! intermediate suspension. The search walks the lattice bottom-up in waves
//! of equal total level sum, evaluating the nodes of one wave concurrently.
//! Two prunes keep it cheap, both justified by monotonicity:
//!
//! - a node dominating a feasible node that suppressed nothing is never
//!   evaluated: its degree is at least as high and suppression cannot drop
//!   below zero, so its loss cannot be lower. Feasible nodes that did
//!   suppress rows prune nothing, since a coarser node may trade that
//!   suppression away for a lower total loss;
//! - a node whose generalization degree already exceeds the best loss found
//!   is never evaluated (suppression only adds loss on top of the degree).
//!
//! Equal-loss candidates are kept and the lexicographically smallest level
//! vector wins, so the outcome never depends on evaluation order.

use std::collections::BTreeSet;

use opaline_hierarchy::HierarchyError;
use opaline_types::{Dataset, RowId};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::criteria::Criterion;
use crate::definition::Definition;
use crate::error::{EngineError, Result};
use crate::lattice::{Lattice, LevelVector};
use crate::loss::{generalization_degree, information_loss};
use crate::partition::partition;

/// Search options for one pass.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum tolerated fraction of suppressed rows, in `[0, 1]`.
    /// 0 forbids suppression entirely, 1 leaves it unconstrained.
    pub suppression_limit: f64,
}

/// Outcome of a feasible pass: the chosen level vector plus the rows that
/// must be suppressed under it.
#[derive(Debug, Clone)]
pub struct Anonymization {
    levels: LevelVector,
    quasi_identifiers: Vec<String>,
    suppressed: BTreeSet<RowId>,
    loss: f64,
}

impl Anonymization {
    /// The chosen generalization level per quasi-identifier, in definition
    /// tagging order.
    pub fn levels(&self) -> &LevelVector {
        &self.levels
    }

    /// The quasi-identifiers the level vector refers to.
    pub fn quasi_identifiers(&self) -> &[String] {
        &self.quasi_identifiers
    }

    /// Rows suppressed by the transformation.
    pub fn suppressed(&self) -> &BTreeSet<RowId> {
        &self.suppressed
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    /// Information loss of the transformation.
    pub fn loss(&self) -> f64 {
        self.loss
    }

    /// Materializes the transformation: quasi-identifier values generalized
    /// to the chosen levels, suppressed rows dropped. The input dataset is
    /// left untouched.
    pub fn apply(&self, dataset: &Dataset, definition: &Definition) -> Result<Dataset> {
        debug_assert_eq!(
            self.quasi_identifiers,
            definition.quasi_identifier_names(),
            "apply must use the definition the search ran with"
        );

        let specs: Vec<_> = definition
            .quasi_identifiers()
            .zip(self.levels.levels())
            .map(|((name, spec), &level)| {
                Ok((name, dataset.column_index(name)?, spec.hierarchy.as_ref(), level))
            })
            .collect::<Result<_>>()?;

        let mut rows = Vec::with_capacity(dataset.num_rows() - self.suppressed.len());
        for id in dataset.row_ids() {
            if self.suppressed.contains(&id) {
                continue;
            }
            let mut row = dataset.rows()[id.index()].clone();
            for &(name, column, hierarchy, level) in &specs {
                if let Some(hierarchy) = hierarchy {
                    row[column] = hierarchy
                        .generalize(&row[column], level)
                        .map_err(|err| match err {
                            HierarchyError::UnknownValue { value } => EngineError::UnknownValue {
                                attribute: name.to_string(),
                                value,
                            },
                            other => EngineError::Hierarchy(other),
                        })?
                        .to_string();
                }
            }
            rows.push(row);
        }

        Ok(Dataset::new(dataset.header().to_vec(), rows)?)
    }
}

struct Candidate {
    levels: LevelVector,
    suppressed: BTreeSet<RowId>,
    loss: f64,
}

/// Runs one anonymization pass: finds the feasible transformation with
/// minimal information loss, tie-broken by the lexicographically smallest
/// level vector.
pub fn anonymize(
    dataset: &Dataset,
    definition: &Definition,
    criteria: &[Criterion],
    config: SearchConfig,
) -> Result<Anonymization> {
    if criteria.is_empty() {
        return Err(EngineError::Configuration(
            "at least one privacy criterion is required".to_string(),
        ));
    }
    if !config.suppression_limit.is_finite() || !(0.0..=1.0).contains(&config.suppression_limit) {
        return Err(EngineError::Configuration(format!(
            "suppression limit must be in [0, 1], got {}",
            config.suppression_limit
        )));
    }
    for criterion in criteria {
        criterion.validate()?;
        criterion.validate_roles(definition)?;
    }
    definition.validate(dataset)?;

    let heights = definition.quasi_identifier_heights();
    let lattice = Lattice::new(definition.quasi_identifier_bounds());
    debug!(
        nodes = lattice.size(),
        rows = dataset.num_rows(),
        "searching transformation lattice"
    );

    let mut best: Option<Candidate> = None;
    // Nodes that were feasible without suppressing anything; only those may
    // prune their successors.
    let mut exhausted_nodes: Vec<LevelVector> = Vec::new();

    for sum in lattice.min_sum()..=lattice.max_sum() {
        let wave: Vec<LevelVector> = lattice
            .nodes_with_sum(sum)
            .into_iter()
            .filter(|node| !exhausted_nodes.iter().any(|found| node.dominates(found)))
            .filter(|node| match &best {
                // Keep equal-degree nodes: an equal-loss candidate may still
                // win the lexicographic tie-break.
                Some(candidate) => {
                    generalization_degree(node, &heights) <= candidate.loss + 1e-12
                }
                None => true,
            })
            .collect();

        if wave.is_empty() {
            continue;
        }

        // Independent nodes; evaluation order must not matter. Results come
        // back in enumeration order, and selection below is order-free
        // anyway: strictly smaller loss wins, ties go to the smaller vector.
        let outcomes: Vec<Option<Candidate>> = wave
            .par_iter()
            .map(|node| evaluate_node(dataset, definition, criteria, node, config, &heights))
            .collect::<Result<_>>()?;

        for candidate in outcomes.into_iter().flatten() {
            debug!(
                levels = %candidate.levels,
                suppressed = candidate.suppressed.len(),
                loss = candidate.loss,
                "feasible transformation"
            );
            if candidate.suppressed.is_empty() {
                exhausted_nodes.push(candidate.levels.clone());
            }
            best = match best.take() {
                None => Some(candidate),
                Some(current) => {
                    if candidate.loss < current.loss - 1e-12
                        || ((candidate.loss - current.loss).abs() <= 1e-12
                            && candidate.levels < current.levels)
                    {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
    }

    match best {
        Some(candidate) => {
            info!(
                levels = %candidate.levels,
                suppressed = candidate.suppressed.len(),
                loss = candidate.loss,
                "selected transformation"
            );
            Ok(Anonymization {
                levels: candidate.levels,
                quasi_identifiers: definition.quasi_identifier_names(),
                suppressed: candidate.suppressed,
                loss: candidate.loss,
            })
        }
        None => Err(EngineError::Infeasible {
            criteria: criteria
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            limit: config.suppression_limit,
        }),
    }
}

fn evaluate_node(
    dataset: &Dataset,
    definition: &Definition,
    criteria: &[Criterion],
    node: &LevelVector,
    config: SearchConfig,
    heights: &[usize],
) -> Result<Option<Candidate>> {
    let classes = partition(dataset, definition, node)?;

    // Union semantics: a row flagged by any class-level criterion is
    // suppressed.
    let mut suppressed: BTreeSet<RowId> = BTreeSet::new();
    for criterion in criteria.iter().filter(|c| !c.is_dataset_level()) {
        suppressed.extend(criterion.suppression_candidates(dataset, &classes)?);
    }

    let total = classes.total_rows();
    if total > 0 {
        let fraction = suppressed.len() as f64 / total as f64;
        if fraction > config.suppression_limit {
            return Ok(None);
        }
    }

    // Dataset-level criteria see the surviving rows. Class-level criteria
    // always suppress whole classes, so surviving classes are untouched.
    let surviving_rows = total - suppressed.len();
    let surviving_singletons = classes
        .classes()
        .values()
        .filter(|rows| rows.len() == 1 && !suppressed.contains(&rows[0]))
        .count();
    for criterion in criteria.iter().filter(|c| c.is_dataset_level()) {
        if !criterion.is_satisfied(surviving_singletons, surviving_rows) {
            return Ok(None);
        }
    }

    let loss = information_loss(node, heights, suppressed.len(), total);
    Ok(Some(Candidate {
        levels: node.clone(),
        suppressed,
        loss,
    }))
}
