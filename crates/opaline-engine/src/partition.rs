//! Equivalence-class evaluation.
//!
//! Partitioning groups rows by their generalized quasi-identifier tuple
//! under one candidate level vector. Classes are rebuilt fresh for every
//! candidate; they are never mutated in place. Partitioning is a pure
//! aggregation, so rows are sharded across rayon workers and the per-shard
//! group-by maps merged afterwards; the `BTreeMap` key order makes the
//! result independent of shard scheduling.

use std::collections::BTreeMap;

use opaline_hierarchy::{Hierarchy, HierarchyError};
use opaline_types::{Dataset, RowId};
use rayon::prelude::*;

use crate::definition::Definition;
use crate::error::{EngineError, Result};
use crate::lattice::LevelVector;

/// Rows per shard handed to one rayon worker.
const PARTITION_SHARD_ROWS: usize = 4096;

/// The equivalence classes of a dataset under one transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    classes: BTreeMap<Vec<String>, Vec<RowId>>,
    total_rows: usize,
}

impl Partition {
    /// Classes keyed by generalized quasi-identifier tuple. Row ids within
    /// a class are in dataset order.
    pub fn classes(&self) -> &BTreeMap<Vec<String>, Vec<RowId>> {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Number of rows in the partitioned dataset.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Size of the smallest class; `None` on an empty dataset.
    pub fn min_class_size(&self) -> Option<usize> {
        self.classes.values().map(Vec::len).min()
    }

    /// Size of the largest class; `None` on an empty dataset.
    pub fn max_class_size(&self) -> Option<usize> {
        self.classes.values().map(Vec::len).max()
    }

    /// Number of rows that are alone in their class (sample uniques).
    pub fn singleton_rows(&self) -> usize {
        self.classes.values().filter(|rows| rows.len() == 1).count()
    }
}

struct QuasiIdentifierColumn<'a> {
    name: &'a str,
    column: usize,
    hierarchy: Option<&'a Hierarchy>,
    level: usize,
}

/// Partitions a dataset into equivalence classes under the given level
/// vector. `levels` is laid out in the definition's quasi-identifier order.
pub fn partition(
    dataset: &Dataset,
    definition: &Definition,
    levels: &LevelVector,
) -> Result<Partition> {
    let columns = resolve_columns(dataset, definition, levels)?;

    let row_count = dataset.num_rows();
    let classes = (0..row_count)
        .into_par_iter()
        .chunks(PARTITION_SHARD_ROWS)
        .map(|shard| {
            let mut local: BTreeMap<Vec<String>, Vec<RowId>> = BTreeMap::new();
            for index in shard {
                let id = RowId::new(index as u32);
                let key = class_key(dataset, id, &columns)?;
                local.entry(key).or_default().push(id);
            }
            Ok::<_, EngineError>(local)
        })
        .try_reduce(BTreeMap::new, |mut left, right| {
            for (key, mut rows) in right {
                left.entry(key).or_default().append(&mut rows);
            }
            Ok(left)
        })?;

    // Shards are produced in row order and merged append-wise, so class
    // member lists stay in dataset order.
    debug_assert!(
        classes.values().all(|rows| rows.windows(2).all(|w| w[0] < w[1])),
        "class members must be in dataset order"
    );

    Ok(Partition {
        classes,
        total_rows: row_count,
    })
}

/// Computes the generalized quasi-identifier tuple of one row.
fn class_key(
    dataset: &Dataset,
    id: RowId,
    columns: &[QuasiIdentifierColumn<'_>],
) -> Result<Vec<String>> {
    let mut key = Vec::with_capacity(columns.len());
    for qi in columns {
        let raw = dataset.value(id, qi.column);
        let generalized = match qi.hierarchy {
            Some(hierarchy) => {
                hierarchy
                    .generalize(raw, qi.level)
                    .map_err(|err| match err {
                        HierarchyError::UnknownValue { value } => EngineError::UnknownValue {
                            attribute: qi.name.to_string(),
                            value,
                        },
                        other => EngineError::Hierarchy(other),
                    })?
            }
            None => raw,
        };
        key.push(generalized.to_string());
    }
    Ok(key)
}

fn resolve_columns<'a>(
    dataset: &Dataset,
    definition: &'a Definition,
    levels: &LevelVector,
) -> Result<Vec<QuasiIdentifierColumn<'a>>> {
    let quasi_identifiers: Vec<_> = definition.quasi_identifiers().collect();
    if quasi_identifiers.len() != levels.len() {
        return Err(EngineError::Configuration(format!(
            "level vector has {} entries for {} quasi-identifiers",
            levels.len(),
            quasi_identifiers.len()
        )));
    }

    quasi_identifiers
        .into_iter()
        .zip(levels.levels())
        .map(|((name, spec), &level)| {
            Ok(QuasiIdentifierColumn {
                name,
                column: dataset.column_index(name)?,
                hierarchy: spec.hierarchy.as_ref(),
                level,
            })
        })
        .collect()
}
