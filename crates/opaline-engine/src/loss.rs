//! Information-loss metric.
//!
//! The metric ranks feasible transformations. It blends the normalized
//! generalization degree of the level vector with the suppressed fraction:
//! a suppressed row carries total loss, a surviving row carries the mean of
//! `level / height` over the quasi-identifier ladders. The result is a
//! scalar in `[0, 1]`, monotone non-decreasing both in every generalization
//! level and in the number of suppressed rows.

use crate::lattice::LevelVector;

/// Normalized generalization degree of a level vector: mean of
/// `level / height` over all quasi-identifiers. Height-0 attributes admit
/// no generalization and contribute 0.
pub fn generalization_degree(levels: &LevelVector, heights: &[usize]) -> f64 {
    debug_assert_eq!(levels.len(), heights.len());
    if heights.is_empty() {
        return 0.0;
    }
    let total: f64 = levels
        .levels()
        .iter()
        .zip(heights)
        .map(|(&level, &height)| {
            if height == 0 {
                0.0
            } else {
                level as f64 / height as f64
            }
        })
        .sum();
    total / heights.len() as f64
}

/// Information loss of a candidate transformation.
pub fn information_loss(
    levels: &LevelVector,
    heights: &[usize],
    suppressed_rows: usize,
    total_rows: usize,
) -> f64 {
    let degree = generalization_degree(levels, heights);
    if total_rows == 0 {
        return degree;
    }
    let suppressed = suppressed_rows as f64 / total_rows as f64;
    degree * (1.0 - suppressed) + suppressed
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::lattice::LevelVector;

    #[test_case(vec![0, 0], vec![1, 2], 0.0; "identity has zero loss")]
    #[test_case(vec![1, 2], vec![1, 2], 1.0; "full generalization has total loss")]
    #[test_case(vec![1, 0], vec![1, 2], 0.5; "half of the attributes fully generalized")]
    #[test_case(vec![0, 1], vec![1, 2], 0.25; "partial level on a taller ladder")]
    fn degree_cases(levels: Vec<usize>, heights: Vec<usize>, expected: f64) {
        let degree = generalization_degree(&LevelVector::new(levels), &heights);
        assert!((degree - expected).abs() < 1e-12);
    }

    #[test]
    fn height_zero_attributes_contribute_nothing() {
        let degree = generalization_degree(&LevelVector::new(vec![0, 0]), &[0, 0]);
        assert!(degree.abs() < 1e-12);
    }

    #[test]
    fn suppression_adds_loss() {
        let levels = LevelVector::new(vec![0]);
        let none = information_loss(&levels, &[1], 0, 10);
        let some = information_loss(&levels, &[1], 3, 10);
        let all = information_loss(&levels, &[1], 10, 10);
        assert!(none < some && some < all);
        assert!((all - 1.0).abs() < 1e-12);
    }

    #[test]
    fn loss_is_monotone_in_levels() {
        let heights = [1, 2];
        let low = information_loss(&LevelVector::new(vec![0, 1]), &heights, 2, 10);
        let high = information_loss(&LevelVector::new(vec![1, 2]), &heights, 2, 10);
        assert!(low <= high);
    }

    #[test]
    fn empty_dataset_costs_only_generalization() {
        let loss = information_loss(&LevelVector::new(vec![1]), &[2], 0, 0);
        assert!((loss - 0.5).abs() < 1e-12);
    }
}
