//! Built-in generalization tables for the clinical release schema.
//!
//! These tables are domain data, not algorithm: the bucket values are
//! reproduced exactly (including the `"15 - 25 year"` spelling of the age
//! table) so that released datasets stay comparable across tool versions.

use crate::Hierarchy;

/// Age bands. One generalization level that pairs neighboring bands.
pub fn age() -> Hierarchy {
    Hierarchy::from_rows(vec![
        vec!["< 1 years", "<= 25 years"],
        vec!["1 - 3 years", "<= 25 years"],
        vec!["4 - 8 years", "<= 25 years"],
        vec!["9 - 14 years", "<= 25 years"],
        vec!["15 - 25 year", "<= 25 years"],
        vec!["26 - 35 years", "26 - 45 years"],
        vec!["36 - 45 years", "26 - 45 years"],
        vec!["46 - 55 years", "46 - 65 years"],
        vec!["56 - 65 years", "46 - 65 years"],
        vec!["66 - 75 years", "66 - 85 years"],
        vec!["76 - 85 years", "66 - 85 years"],
        vec!["> 85 years", "> 85 years"],
    ])
    .expect("builtin age table is valid")
}

/// Gender. Height 0: no generalization is ever applied.
pub fn gender() -> Hierarchy {
    Hierarchy::from_rows(vec![vec!["Female"], vec!["Male"]])
        .expect("builtin gender table is valid")
}

/// Diagnosis month. The first quarter collapses into one bucket, later
/// months stay as-is.
pub fn month() -> Hierarchy {
    Hierarchy::from_rows(vec![
        vec!["1", "<= 3"],
        vec!["2", "<= 3"],
        vec!["3", "<= 3"],
        vec!["4", "4"],
        vec!["5", "5"],
        vec!["6", "6"],
        vec!["7", "7"],
        vec!["8", "8"],
        vec!["9", "9"],
        vec!["10", "10"],
        vec!["11", "11"],
        vec!["12", "12"],
    ])
    .expect("builtin month table is valid")
}

/// Diagnosis year. Height 0: no generalization is ever applied.
pub fn year() -> Hierarchy {
    Hierarchy::from_rows(vec![vec!["2020"], vec!["2021"]])
        .expect("builtin year table is valid")
}

/// Last known patient status ladder.
pub fn status() -> Hierarchy {
    Hierarchy::from_rows(vec![
        vec!["Dead from COVID-19", "dead", "*"],
        vec!["Dead from other causes", "dead", "*"],
        vec![
            "Not recovered (means recovery phase not achieved)",
            "not dead",
            "*",
        ],
        vec!["Recovered", "not dead", "*"],
        vec!["n/a", "unknown/missing or n/a", "*"],
        vec!["unknown/missing", "unknown/missing or n/a", "*"],
    ])
    .expect("builtin status table is valid")
}

/// Clinical intervention flags (vasopressors, ventilation).
pub fn intervention() -> Hierarchy {
    Hierarchy::from_rows(vec![
        vec!["yes", "yes or no", "*"],
        vec!["no", "yes or no", "*"],
        vec!["n/a", "unknown/missing or n/a", "*"],
        vec!["unknown/missing", "unknown/missing or n/a", "*"],
    ])
    .expect("builtin intervention table is valid")
}

/// Superinfection ladder.
pub fn infection() -> Hierarchy {
    Hierarchy::from_rows(vec![
        vec!["bacterial", "bacterial and/or fungal", "*"],
        vec!["fungal", "bacterial and/or fungal", "*"],
        vec!["bacterial&fungal", "bacterial and/or fungal", "*"],
        vec!["none", "none or unknown/missing or n/a", "*"],
        vec!["n/a", "none or unknown/missing or n/a", "*"],
        vec!["unknown/missing", "none or unknown/missing or n/a", "*"],
    ])
    .expect("builtin infection table is valid")
}

/// Recovery-phase symptom flags. Same shape as [`intervention`].
pub fn symptoms() -> Hierarchy {
    Hierarchy::from_rows(vec![
        vec!["yes", "yes or no", "*"],
        vec!["no", "yes or no", "*"],
        vec!["n/a", "unknown/missing or n/a", "*"],
        vec!["unknown/missing", "unknown/missing or n/a", "*"],
    ])
    .expect("builtin symptoms table is valid")
}
