//! # opaline-engine: Pure anonymization core
//!
//! The engine is the deterministic heart of `opaline`. It receives a
//! dataset, a per-pass attribute definition, and a list of privacy
//! criteria, and produces the feasible transformation with minimal
//! information loss, or fails if none exists.
//!
//! ## Key Principles
//!
//! - **No IO**: the engine never touches disk or network
//! - **No clocks, no randomness**: same input always produces same output,
//!   including across concurrent evaluation of lattice nodes
//! - **Pure passes**: `anonymize(dataset, definition, criteria, config)` is
//!   a pure function; datasets are never mutated, only rebuilt
//!
//! ## Architecture
//!
//! - [`definition`]: per-pass attribute roles, hierarchies, and level clamps
//! - [`criteria`]: the pluggable feasibility oracle (k-anonymity,
//!   hierarchical-distance t-closeness, sample uniqueness)
//! - [`partition`]: equivalence-class evaluation under a level vector
//! - [`lattice`]: the generalization-level state space
//! - [`search`]: loss-minimal search with monotonic pruning
//! - [`risk`]: sample-based re-identification risk statistics

pub mod criteria;
pub mod definition;
pub mod error;
pub mod lattice;
pub mod loss;
pub mod partition;
pub mod risk;
pub mod search;


pub use criteria::Criterion;
pub use definition::Definition;
pub use error::{EngineError, Result};
pub use lattice::LevelVector;
pub use partition::{Partition, partition};
pub use risk::{RiskProfile, assess_risk};
pub use search::{Anonymization, SearchConfig, anonymize};
