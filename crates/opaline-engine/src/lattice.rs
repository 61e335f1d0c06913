//! The transformation lattice: the cartesian product of per-attribute
//! generalization levels.
//!
//! A node of the lattice is a [`LevelVector`]: one level per
//! quasi-identifying attribute, in definition tagging order. Nodes are
//! partially ordered by componentwise comparison; the search walks the
//! lattice in waves of equal total level sum, bottom-up.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// One candidate transformation: a generalization level per
/// quasi-identifying attribute.
///
/// The derived `Ord` is lexicographic, which is exactly the deterministic
/// tie-break order required of the search.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LevelVector(Vec<usize>);

impl LevelVector {
    pub fn new(levels: Vec<usize>) -> Self {
        Self(levels)
    }

    pub fn levels(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total generalization height of this node.
    pub fn sum(&self) -> usize {
        self.0.iter().sum()
    }

    /// Componentwise `self >= other`. Feasibility and loss are monotone
    /// along this order, which is what makes predictive pruning sound.
    pub fn dominates(&self, other: &LevelVector) -> bool {
        debug_assert_eq!(self.0.len(), other.0.len());
        self.0.iter().zip(&other.0).all(|(a, b)| a >= b)
    }
}

impl Display for LevelVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, level) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{level}")?;
        }
        write!(f, "]")
    }
}

/// The bounded level space of one search: `(min, max)` per attribute.
#[derive(Debug, Clone)]
pub struct Lattice {
    bounds: Vec<(usize, usize)>,
}

impl Lattice {
    pub fn new(bounds: Vec<(usize, usize)>) -> Self {
        Self { bounds }
    }

    /// Smallest total level sum of any node.
    pub fn min_sum(&self) -> usize {
        self.bounds.iter().map(|(min, _)| min).sum()
    }

    /// Largest total level sum of any node.
    pub fn max_sum(&self) -> usize {
        self.bounds.iter().map(|(_, max)| max).sum()
    }

    /// Total number of nodes in the lattice.
    pub fn size(&self) -> usize {
        self.bounds
            .iter()
            .map(|(min, max)| max - min + 1)
            .product()
    }

    /// All nodes with the given total level sum, in ascending lexicographic
    /// order. The enumeration is deterministic; concurrent evaluation of a
    /// wave must not change which node the search selects.
    pub fn nodes_with_sum(&self, sum: usize) -> Vec<LevelVector> {
        let mut nodes = Vec::new();
        let mut current = Vec::with_capacity(self.bounds.len());
        self.collect_nodes(0, sum, &mut current, &mut nodes);
        nodes
    }

    fn collect_nodes(
        &self,
        index: usize,
        remaining: usize,
        current: &mut Vec<usize>,
        nodes: &mut Vec<LevelVector>,
    ) {
        if index == self.bounds.len() {
            if remaining == 0 {
                nodes.push(LevelVector::new(current.clone()));
            }
            return;
        }
        let (min, max) = self.bounds[index];
        // Levels still claimable by the attributes after this one.
        let rest_max: usize = self.bounds[index + 1..].iter().map(|(_, max)| max).sum();
        let rest_min: usize = self.bounds[index + 1..].iter().map(|(min, _)| min).sum();
        for level in min..=max {
            if level > remaining {
                break;
            }
            let left = remaining - level;
            if left < rest_min || left > rest_max {
                continue;
            }
            current.push(level);
            self.collect_nodes(index + 1, left, current, nodes);
            current.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_vector_order_is_lexicographic() {
        let a = LevelVector::new(vec![0, 1]);
        let b = LevelVector::new(vec![1, 0]);
        assert!(a < b);
    }

    #[test]
    fn domination_is_componentwise() {
        let low = LevelVector::new(vec![0, 1]);
        let high = LevelVector::new(vec![1, 1]);
        let incomparable = LevelVector::new(vec![1, 0]);
        assert!(high.dominates(&low));
        assert!(!low.dominates(&high));
        assert!(!incomparable.dominates(&low));
        assert!(!low.dominates(&incomparable));
    }

    #[test]
    fn wave_enumeration_covers_the_lattice() {
        let lattice = Lattice::new(vec![(0, 1), (0, 2)]);
        let total: usize = (lattice.min_sum()..=lattice.max_sum())
            .map(|sum| lattice.nodes_with_sum(sum).len())
            .sum();
        assert_eq!(total, lattice.size());
        assert_eq!(lattice.size(), 6);
    }

    #[test]
    fn wave_nodes_are_sorted() {
        let lattice = Lattice::new(vec![(0, 2), (0, 2)]);
        let wave = lattice.nodes_with_sum(2);
        assert_eq!(
            wave,
            vec![
                LevelVector::new(vec![0, 2]),
                LevelVector::new(vec![1, 1]),
                LevelVector::new(vec![2, 0]),
            ]
        );
    }

    #[test]
    fn clamped_bounds_produce_a_single_node() {
        let lattice = Lattice::new(vec![(1, 1), (0, 0)]);
        assert_eq!(lattice.size(), 1);
        assert_eq!(lattice.min_sum(), 1);
        assert_eq!(lattice.max_sum(), 1);
        assert_eq!(
            lattice.nodes_with_sum(1),
            vec![LevelVector::new(vec![1, 0])]
        );
    }
}
