//! # opaline-hierarchy: Generalization ladders
//!
//! A [`Hierarchy`] is a finite, deterministic generalization ladder for one
//! attribute's domain: level 0 holds the raw (leaf) values, each following
//! level maps every value of the previous level to exactly one coarser
//! value, and the top level of a multi-level ladder collapses everything
//! into a single wildcard.
//!
//! Hierarchies are built once at startup from literal tables (see
//! [`builtin`]) and shared read-only for the process lifetime.
//!
//! # Example
//!
//! ```
//! use opaline_hierarchy::Hierarchy;
//!
//! let ladder = Hierarchy::from_rows(vec![
//!     vec!["yes", "yes or no", "*"],
//!     vec!["no", "yes or no", "*"],
//! ])
//! .unwrap();
//!
//! assert_eq!(ladder.height(), 2);
//! assert_eq!(ladder.generalize("yes", 0).unwrap(), "yes");
//! assert_eq!(ladder.generalize("yes", 1).unwrap(), "yes or no");
//! assert_eq!(ladder.generalize("no", 2).unwrap(), "*");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod builtin;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("hierarchy must declare at least one leaf value")]
    Empty,

    #[error("hierarchy row for leaf {leaf:?} has {actual} levels, expected {expected}")]
    RaggedRow {
        leaf: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate leaf value {0:?}")]
    DuplicateLeaf(String),

    #[error(
        "level {level} is not a refinement: {value:?} generalizes to both \
         {first:?} and {second:?}"
    )]
    NotARefinement {
        level: usize,
        value: String,
        first: String,
        second: String,
    },

    #[error("value {value:?} is not a declared leaf")]
    UnknownValue { value: String },

    #[error("level {level} exceeds hierarchy height {height}")]
    LevelOutOfRange { level: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, HierarchyError>;

/// A generalization ladder: one row per leaf value, one column per level.
///
/// The table is rectangular; row `r` spells out the successive
/// generalizations of leaf `r` from level 0 (identity) up to
/// [`Hierarchy::height`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    rows: Vec<Vec<String>>,
}

impl Hierarchy {
    /// Builds and validates a hierarchy from its literal table.
    ///
    /// Validation enforces: non-empty, rectangular rows, unique leaves, and
    /// the refinement property (the mapping from level `i` to level `i + 1`
    /// is a function; two rows agreeing at level `i` never diverge above it).
    pub fn from_rows<R, V>(rows: R) -> Result<Self>
    where
        R: IntoIterator<Item = Vec<V>>,
        V: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        let hierarchy = Self { rows };
        hierarchy.validate()?;
        Ok(hierarchy)
    }

    /// Maximum generalization level. A single-column table has height 0 and
    /// admits no generalization.
    pub fn height(&self) -> usize {
        self.rows[0].len() - 1
    }

    /// Leaf values, in declaration order.
    pub fn leaves(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row[0].as_str())
    }

    /// Returns true if `value` is a declared leaf.
    pub fn contains_leaf(&self, value: &str) -> bool {
        self.rows.iter().any(|row| row[0] == value)
    }

    /// Generalizes a leaf value to the given level.
    ///
    /// Total for all declared leaves and levels up to [`Hierarchy::height`];
    /// fails with [`HierarchyError::UnknownValue`] otherwise.
    pub fn generalize(&self, value: &str, level: usize) -> Result<&str> {
        if level > self.height() {
            return Err(HierarchyError::LevelOutOfRange {
                level,
                height: self.height(),
            });
        }
        self.rows
            .iter()
            .find(|row| row[0] == value)
            .map(|row| row[level].as_str())
            .ok_or_else(|| HierarchyError::UnknownValue {
                value: value.to_string(),
            })
    }

    fn validate(&self) -> Result<()> {
        if self.rows.is_empty() || self.rows[0].is_empty() {
            return Err(HierarchyError::Empty);
        }

        let width = self.rows[0].len();
        for row in &self.rows {
            if row.len() != width {
                return Err(HierarchyError::RaggedRow {
                    leaf: row.first().cloned().unwrap_or_default(),
                    expected: width,
                    actual: row.len(),
                });
            }
        }

        for (i, row) in self.rows.iter().enumerate() {
            if self.rows[..i].iter().any(|other| other[0] == row[0]) {
                return Err(HierarchyError::DuplicateLeaf(row[0].clone()));
            }
        }

        // Refinement: at every level the upward mapping must be a function.
        for level in 0..width - 1 {
            let mut upward: HashMap<&str, &str> = HashMap::new();
            for row in &self.rows {
                let from = row[level].as_str();
                let to = row[level + 1].as_str();
                match upward.get(from) {
                    Some(&existing) if existing != to => {
                        return Err(HierarchyError::NotARefinement {
                            level,
                            value: from.to_string(),
                            first: existing.to_string(),
                            second: to.to_string(),
                        });
                    }
                    _ => {
                        upward.insert(from, to);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            Hierarchy::from_rows(Vec::<Vec<&str>>::new()),
            Err(HierarchyError::Empty)
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Hierarchy::from_rows(vec![vec!["a", "x"], vec!["b"]]).unwrap_err();
        assert!(matches!(err, HierarchyError::RaggedRow { .. }));
    }

    #[test]
    fn rejects_duplicate_leaves() {
        let err = Hierarchy::from_rows(vec![vec!["a", "x"], vec!["a", "y"]]).unwrap_err();
        assert!(matches!(err, HierarchyError::DuplicateLeaf(leaf) if leaf == "a"));
    }

    #[test]
    fn rejects_merge_back() {
        // "x" would generalize to two different values at level 1.
        let err = Hierarchy::from_rows(vec![
            vec!["a", "x", "p"],
            vec!["b", "x", "q"],
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            HierarchyError::NotARefinement { level: 1, .. }
        ));
    }

    #[test]
    fn generalize_rejects_unknown_leaf() {
        let ladder = Hierarchy::from_rows(vec![vec!["a", "*"]]).unwrap();
        assert!(matches!(
            ladder.generalize("zzz", 0),
            Err(HierarchyError::UnknownValue { .. })
        ));
    }

    #[test]
    fn generalize_rejects_out_of_range_level() {
        let ladder = Hierarchy::from_rows(vec![vec!["a", "*"]]).unwrap();
        assert!(matches!(
            ladder.generalize("a", 2),
            Err(HierarchyError::LevelOutOfRange { level: 2, height: 1 })
        ));
    }

    #[test]
    fn height_zero_ladder_is_identity_only() {
        let ladder = Hierarchy::from_rows(vec![vec!["Female"], vec!["Male"]]).unwrap();
        assert_eq!(ladder.height(), 0);
        assert_eq!(ladder.generalize("Male", 0).unwrap(), "Male");
    }

    proptest! {
        /// Totality: every declared leaf is defined at every level, and
        /// repeated calls return the same value.
        #[test]
        fn builtin_ladders_are_total_and_deterministic(
            which in 0usize..8,
            leaf_index in 0usize..12,
            level in 0usize..3,
        ) {
            let ladder = match which {
                0 => builtin::age(),
                1 => builtin::gender(),
                2 => builtin::month(),
                3 => builtin::year(),
                4 => builtin::status(),
                5 => builtin::intervention(),
                6 => builtin::infection(),
                _ => builtin::symptoms(),
            };
            let leaves: Vec<String> = ladder.leaves().map(str::to_string).collect();
            let leaf = &leaves[leaf_index % leaves.len()];
            let level = level % (ladder.height() + 1);

            let first = ladder.generalize(leaf, level).unwrap().to_string();
            let second = ladder.generalize(leaf, level).unwrap().to_string();
            prop_assert_eq!(first, second);
        }
    }
}
