//! Privacy criteria: the pluggable feasibility oracle of the search.
//!
//! A criterion is a predicate over a candidate transformed dataset. All
//! criteria are monotone with respect to generalization: coarser levels
//! never turn a satisfied criterion unsatisfied, which is the property the
//! lattice search's pruning relies on.
//!
//! Class-level criteria (k-anonymity, t-closeness) name the rows that must
//! be suppressed for the candidate to pass; rows flagged by *any* active
//! criterion are suppressed (union semantics). The dataset-level sample
//! uniqueness criterion rejects a candidate outright, it never suppresses.

use std::collections::HashMap;
use std::fmt::{self, Display};

use opaline_hierarchy::Hierarchy;
use opaline_types::{AttributeRole, Dataset, RowId};

use crate::definition::Definition;
use crate::error::{EngineError, Result};
use crate::partition::Partition;

/// One privacy criterion instance.
#[derive(Debug, Clone)]
pub enum Criterion {
    /// Every equivalence class must contain at least `k` rows.
    KAnonymity { k: usize },

    /// The hierarchical earth-mover's distance between each class's
    /// sensitive-value distribution and the global distribution must not
    /// exceed `t`.
    HierarchicalTCloseness {
        attribute: String,
        t: f64,
        hierarchy: Hierarchy,
    },

    /// The fraction of rows that are unique within the partition must not
    /// exceed `threshold`.
    SampleUniqueness { threshold: f64 },
}

impl Criterion {
    /// Rejects malformed parameters before any search runs.
    pub fn validate(&self) -> Result<()> {
        match self {
            Criterion::KAnonymity { k } => {
                if *k < 1 {
                    return Err(EngineError::Configuration(
                        "k-anonymity requires k >= 1".to_string(),
                    ));
                }
            }
            Criterion::HierarchicalTCloseness { t, .. } => {
                if !t.is_finite() || *t < 0.0 {
                    return Err(EngineError::Configuration(format!(
                        "t-closeness requires a finite t >= 0, got {t}"
                    )));
                }
            }
            Criterion::SampleUniqueness { threshold } => {
                if !threshold.is_finite() || !(0.0..=1.0).contains(threshold) {
                    return Err(EngineError::Configuration(format!(
                        "sample uniqueness requires a threshold in [0, 1], got {threshold}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that the attribute this criterion reads carries its declared
    /// role in the pass definition.
    pub fn validate_roles(&self, definition: &Definition) -> Result<()> {
        if let Criterion::HierarchicalTCloseness { attribute, .. } = self {
            if definition.role(attribute) != AttributeRole::Sensitive {
                return Err(EngineError::Configuration(format!(
                    "t-closeness on {attribute:?} requires the attribute to be tagged sensitive, \
                     found {}",
                    definition.role(attribute)
                )));
            }
        }
        Ok(())
    }

    /// True for criteria that reject the whole candidate instead of naming
    /// rows to suppress.
    pub fn is_dataset_level(&self) -> bool {
        matches!(self, Criterion::SampleUniqueness { .. })
    }

    /// Rows that fail this criterion and must be suppressed for the
    /// candidate to pass. Empty for dataset-level criteria.
    pub fn suppression_candidates(
        &self,
        dataset: &Dataset,
        partition: &Partition,
    ) -> Result<Vec<RowId>> {
        match self {
            Criterion::KAnonymity { k } => {
                let mut rows = Vec::new();
                for class in partition.classes().values() {
                    if class.len() < *k {
                        rows.extend_from_slice(class);
                    }
                }
                Ok(rows)
            }
            Criterion::HierarchicalTCloseness {
                attribute,
                t,
                hierarchy,
            } => {
                let column = dataset.column_index(attribute)?;
                let global = distribution(dataset, dataset.row_ids(), column, attribute, hierarchy)?;

                let mut rows = Vec::new();
                for class in partition.classes().values() {
                    let local = distribution(
                        dataset,
                        class.iter().copied(),
                        column,
                        attribute,
                        hierarchy,
                    )?;
                    if hierarchical_emd(&local, &global, hierarchy)? > *t {
                        rows.extend_from_slice(class);
                    }
                }
                Ok(rows)
            }
            Criterion::SampleUniqueness { .. } => Ok(Vec::new()),
        }
    }

    /// Evaluates a dataset-level criterion against the surviving rows of a
    /// candidate. Class-level criteria are satisfied by construction once
    /// their candidates are suppressed.
    pub fn is_satisfied(&self, surviving_singletons: usize, surviving_rows: usize) -> bool {
        match self {
            Criterion::SampleUniqueness { threshold } => {
                if surviving_rows == 0 {
                    return true;
                }
                let fraction = surviving_singletons as f64 / surviving_rows as f64;
                fraction <= *threshold
            }
            _ => true,
        }
    }
}

impl Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::KAnonymity { k } => write!(f, "{k}-anonymity"),
            Criterion::HierarchicalTCloseness { t, .. } => {
                write!(f, "{t}-closeness with hierarchical ground-distance")
            }
            Criterion::SampleUniqueness { threshold } => {
                write!(f, "{threshold}-sample-uniqueness")
            }
        }
    }
}

// ============================================================================
// Hierarchical earth-mover's distance
// ============================================================================

/// Relative frequency of each hierarchy-declared value among the given rows.
fn distribution<'h>(
    dataset: &Dataset,
    rows: impl Iterator<Item = RowId>,
    column: usize,
    attribute: &str,
    hierarchy: &'h Hierarchy,
) -> Result<HashMap<&'h str, f64>> {
    let mut counts: HashMap<&str, usize> = hierarchy.leaves().map(|leaf| (leaf, 0)).collect();
    let mut total = 0usize;
    for id in rows {
        let value = dataset.value(id, column);
        match counts.get_mut(value) {
            Some(count) => *count += 1,
            None => {
                return Err(EngineError::UnknownValue {
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                });
            }
        }
        total += 1;
    }
    Ok(counts
        .into_iter()
        .map(|(leaf, count)| {
            let mass = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            };
            (leaf, mass)
        })
        .collect())
}

/// Earth-mover's distance between two distributions over the leaves of a
/// generalization ladder, with hierarchical ground distance.
///
/// Follows the ladder variant of the t-closeness construction: the surplus
/// `extra = p - q` is propagated from the leaves towards the root, and each
/// internal node at level `l` contributes `l / H * min(pos, neg)` of the
/// mass its children exchange across its boundary. Distances are in
/// `[0, 1]`; a height-0 ladder always yields 0.
pub fn hierarchical_emd(
    p: &HashMap<&str, f64>,
    q: &HashMap<&str, f64>,
    hierarchy: &Hierarchy,
) -> Result<f64> {
    let height = hierarchy.height();
    if height == 0 {
        return Ok(0.0);
    }

    // Nodes of the current level, each represented by one of its leaves.
    let mut nodes: Vec<(&str, f64)> = hierarchy
        .leaves()
        .map(|leaf| {
            let extra = p.get(leaf).copied().unwrap_or(0.0) - q.get(leaf).copied().unwrap_or(0.0);
            (leaf, extra)
        })
        .collect();

    let mut cost = 0.0;
    for level in 1..=height {
        // Group the nodes of level - 1 under their ancestor at this level.
        // Representative order is leaf declaration order, so grouping is
        // deterministic.
        let mut grouped: Vec<(&str, f64, f64, f64)> = Vec::new();
        for (representative, extra) in &nodes {
            let ancestor = hierarchy.generalize(representative, level)?;
            let entry = match grouped.iter_mut().find(|(label, ..)| *label == ancestor) {
                Some(entry) => entry,
                None => {
                    grouped.push((ancestor, 0.0, 0.0, 0.0));
                    grouped.last_mut().expect("just pushed")
                }
            };
            entry.1 += extra;
            if *extra > 0.0 {
                entry.2 += extra;
            } else {
                entry.3 -= extra;
            }
        }

        let weight = level as f64 / height as f64;
        let mut next = Vec::with_capacity(grouped.len());
        for (label, extra, pos, neg) in grouped {
            cost += weight * pos.min(neg);
            // Any representative leaf of the merged node works; keep the
            // first leaf that mapped into it.
            let representative = nodes
                .iter()
                .find(|(leaf, _)| {
                    hierarchy
                        .generalize(leaf, level)
                        .is_ok_and(|ancestor| ancestor == label)
                })
                .map(|(leaf, _)| *leaf)
                .expect("group has at least one member");
            next.push((representative, extra));
        }
        nodes = next;
    }

    debug_assert!(
        (-1e-9..=1.0 + 1e-9).contains(&cost),
        "hierarchical EMD must stay within [0, 1], got {cost}"
    );
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use opaline_hierarchy::builtin;

    use super::*;
    use crate::definition::Definition;
    use crate::lattice::LevelVector;
    use crate::partition::partition;

    fn flag_dataset(values: &[&str]) -> Dataset {
        Dataset::new(
            vec!["id".into(), "flag".into()],
            values
                .iter()
                .enumerate()
                .map(|(i, value)| vec![i.to_string(), (*value).to_string()])
                .collect(),
        )
        .unwrap()
    }

    fn dist(pairs: &[(&'static str, f64)]) -> HashMap<&'static str, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn k_anonymity_rejects_k_zero() {
        assert!(Criterion::KAnonymity { k: 0 }.validate().is_err());
        assert!(Criterion::KAnonymity { k: 1 }.validate().is_ok());
    }

    #[test]
    fn t_closeness_rejects_negative_t() {
        let criterion = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: -0.1,
            hierarchy: builtin::intervention(),
        };
        assert!(criterion.validate().is_err());
    }

    #[test]
    fn sample_uniqueness_rejects_threshold_above_one() {
        assert!(
            Criterion::SampleUniqueness { threshold: 1.5 }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn t_closeness_requires_sensitive_tagging() {
        let criterion = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: 0.5,
            hierarchy: builtin::intervention(),
        };
        let untagged = Definition::new().quasi_identifying("id");
        assert!(criterion.validate_roles(&untagged).is_err());

        let tagged = Definition::new().quasi_identifying("id").sensitive("flag");
        assert!(criterion.validate_roles(&tagged).is_ok());
    }

    #[test]
    fn k_anonymity_flags_all_rows_of_small_classes() {
        let dataset = flag_dataset(&["yes", "yes", "no"]);
        let definition = Definition::new().quasi_identifying("flag");
        let part = partition(&dataset, &definition, &LevelVector::new(vec![0])).unwrap();

        let candidates = Criterion::KAnonymity { k: 2 }
            .suppression_candidates(&dataset, &part)
            .unwrap();
        assert_eq!(candidates, vec![RowId::new(2)]);
    }

    #[test]
    fn sample_uniqueness_is_a_dataset_level_check() {
        let criterion = Criterion::SampleUniqueness { threshold: 0.5 };
        assert!(criterion.is_dataset_level());
        assert!(criterion.is_satisfied(1, 2));
        assert!(!criterion.is_satisfied(2, 3));
        // An empty candidate is trivially satisfied.
        assert!(criterion.is_satisfied(0, 0));
    }

    #[test]
    fn emd_of_identical_distributions_is_zero() {
        let p = dist(&[("yes", 0.5), ("no", 0.5)]);
        let emd = hierarchical_emd(&p, &p, &builtin::intervention()).unwrap();
        assert!(emd.abs() < 1e-12);
    }

    #[test]
    fn emd_within_one_bucket_is_weighted_by_half() {
        // yes and no are siblings under "yes or no" in a height-2 ladder:
        // moving 0.9 of mass between them costs 0.9 * 1/2 = 0.45.
        let class = dist(&[("yes", 1.0)]);
        let global = dist(&[("yes", 0.1), ("no", 0.9)]);
        let emd = hierarchical_emd(&class, &global, &builtin::intervention()).unwrap();
        assert!((emd - 0.45).abs() < 1e-12);
    }

    #[test]
    fn emd_across_buckets_costs_full_weight() {
        // yes and unknown/missing only meet at the root: moving 0.9 of mass
        // costs 0.9 * 2/2 = 0.9.
        let class = dist(&[("yes", 1.0)]);
        let global = dist(&[("yes", 0.1), ("unknown/missing", 0.9)]);
        let emd = hierarchical_emd(&class, &global, &builtin::intervention()).unwrap();
        assert!((emd - 0.9).abs() < 1e-12);
    }

    #[test]
    fn skewed_class_is_flagged_within_bucket_at_tighter_threshold() {
        // Global: 90% no / 10% yes; one class is 100% yes. The distance is
        // 0.45, flagged at t = 0.4 but not at t = 0.5.
        let dataset = Dataset::new(
            vec!["group".into(), "flag".into()],
            (0..10)
                .map(|i| {
                    let group = if i == 0 { "a" } else { "b" };
                    let flag = if i == 0 { "yes" } else { "no" };
                    vec![group.to_string(), flag.to_string()]
                })
                .collect(),
        )
        .unwrap();
        let definition = Definition::new().quasi_identifying("group").sensitive("flag");
        let part = partition(&dataset, &definition, &LevelVector::new(vec![0])).unwrap();

        let tight = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: 0.4,
            hierarchy: builtin::intervention(),
        };
        let candidates = tight.suppression_candidates(&dataset, &part).unwrap();
        assert_eq!(candidates, vec![RowId::new(0)]);

        let loose = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: 0.5,
            hierarchy: builtin::intervention(),
        };
        assert!(loose.suppression_candidates(&dataset, &part).unwrap().is_empty());
    }

    #[test]
    fn cross_branch_skew_is_flagged_at_half() {
        // Global mass sits in the unknown branch; a 100%-yes class is a
        // full cross-branch move (distance 0.9 > 0.5).
        let dataset = Dataset::new(
            vec!["group".into(), "flag".into()],
            (0..10)
                .map(|i| {
                    let group = if i == 0 { "a" } else { "b" };
                    let flag = if i == 0 { "yes" } else { "unknown/missing" };
                    vec![group.to_string(), flag.to_string()]
                })
                .collect(),
        )
        .unwrap();
        let definition = Definition::new().quasi_identifying("group").sensitive("flag");
        let part = partition(&dataset, &definition, &LevelVector::new(vec![0])).unwrap();

        let criterion = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: 0.5,
            hierarchy: builtin::intervention(),
        };
        let candidates = criterion.suppression_candidates(&dataset, &part).unwrap();
        assert_eq!(candidates, vec![RowId::new(0)]);
    }

    #[test]
    fn unknown_sensitive_value_is_fatal() {
        let dataset = flag_dataset(&["yes", "maybe"]);
        let definition = Definition::new().quasi_identifying("id").sensitive("flag");
        let part = partition(&dataset, &definition, &LevelVector::new(vec![0])).unwrap();

        let criterion = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: 0.5,
            hierarchy: builtin::intervention(),
        };
        let err = criterion.suppression_candidates(&dataset, &part).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownValue { attribute, value }
                if attribute == "flag" && value == "maybe"
        ));
    }

    #[test]
    fn criterion_labels() {
        assert_eq!(Criterion::KAnonymity { k: 10 }.to_string(), "10-anonymity");
        assert_eq!(
            Criterion::SampleUniqueness { threshold: 1.0 }.to_string(),
            "1-sample-uniqueness"
        );
        let closeness = Criterion::HierarchicalTCloseness {
            attribute: "flag".into(),
            t: 0.5,
            hierarchy: builtin::intervention(),
        };
        assert_eq!(closeness.to_string(), "0.5-closeness with hierarchical ground-distance");
    }
}
