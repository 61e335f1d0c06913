//! Per-pass attribute definitions.
//!
//! Every anonymization pass builds a fresh [`Definition`] from scratch:
//! re-tagging is explicit and total, a pass never inherits or patches the
//! roles of a previous pass. Columns that are not tagged default to
//! insensitive.

use opaline_hierarchy::Hierarchy;
use opaline_types::{AttributeRole, Dataset};

use crate::error::{EngineError, Result};

/// Role, hierarchy, and generalization bounds for one attribute.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub role: AttributeRole,
    pub hierarchy: Option<Hierarchy>,
    pub min_level: usize,
    pub max_level: usize,
}

/// Total attribute tagging for one pass.
///
/// Quasi-identifiers are kept in tagging order; that order fixes the layout
/// of level vectors and therefore the lexicographic tie-break of the search.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    specs: Vec<(String, AttributeSpec)>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags an attribute as quasi-identifying with no generalization ladder
    /// (level 0 is the only level; feasibility comes from suppression).
    pub fn quasi_identifying(mut self, name: impl Into<String>) -> Self {
        self.insert(
            name.into(),
            AttributeSpec {
                role: AttributeRole::QuasiIdentifying,
                hierarchy: None,
                min_level: 0,
                max_level: 0,
            },
        );
        self
    }

    /// Tags an attribute as quasi-identifying with the full level range of
    /// the given ladder.
    pub fn quasi_identifying_with(mut self, name: impl Into<String>, hierarchy: Hierarchy) -> Self {
        let max_level = hierarchy.height();
        self.insert(
            name.into(),
            AttributeSpec {
                role: AttributeRole::QuasiIdentifying,
                hierarchy: Some(hierarchy),
                min_level: 0,
                max_level,
            },
        );
        self
    }

    /// Tags an attribute as quasi-identifying with a fixed generalization
    /// level (minimum = maximum), as used by the pre-generalization stage.
    pub fn clamped(mut self, name: impl Into<String>, hierarchy: Hierarchy, level: usize) -> Self {
        self.insert(
            name.into(),
            AttributeSpec {
                role: AttributeRole::QuasiIdentifying,
                hierarchy: Some(hierarchy),
                min_level: level,
                max_level: level,
            },
        );
        self
    }

    /// Tags an attribute as sensitive.
    pub fn sensitive(mut self, name: impl Into<String>) -> Self {
        self.insert(
            name.into(),
            AttributeSpec {
                role: AttributeRole::Sensitive,
                hierarchy: None,
                min_level: 0,
                max_level: 0,
            },
        );
        self
    }

    fn insert(&mut self, name: String, spec: AttributeSpec) {
        if let Some(existing) = self.specs.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = spec;
        } else {
            self.specs.push((name, spec));
        }
    }

    /// Role of an attribute; untagged attributes are insensitive.
    pub fn role(&self, name: &str) -> AttributeRole {
        self.specs
            .iter()
            .find(|(n, _)| n == name)
            .map_or(AttributeRole::Insensitive, |(_, spec)| spec.role)
    }

    /// Quasi-identifying attributes with their specs, in tagging order.
    pub fn quasi_identifiers(&self) -> impl Iterator<Item = (&str, &AttributeSpec)> {
        self.specs
            .iter()
            .filter(|(_, spec)| spec.role == AttributeRole::QuasiIdentifying)
            .map(|(name, spec)| (name.as_str(), spec))
    }

    /// Names of the quasi-identifying attributes, in tagging order.
    pub fn quasi_identifier_names(&self) -> Vec<String> {
        self.quasi_identifiers()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Heights of the quasi-identifier ladders, in tagging order. An
    /// attribute without a ladder has height 0.
    pub fn quasi_identifier_heights(&self) -> Vec<usize> {
        self.quasi_identifiers()
            .map(|(_, spec)| {
                spec.hierarchy
                    .as_ref()
                    .map_or(0, opaline_hierarchy::Hierarchy::height)
            })
            .collect()
    }

    /// Level bounds (min, max) per quasi-identifier, in tagging order.
    pub fn quasi_identifier_bounds(&self) -> Vec<(usize, usize)> {
        self.quasi_identifiers()
            .map(|(_, spec)| (spec.min_level, spec.max_level))
            .collect()
    }

    /// Validates the definition against a dataset: every tagged attribute
    /// must be a declared column, level clamps must fit their ladder, and
    /// at least one quasi-identifier must be present.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        for (name, spec) in &self.specs {
            dataset.column_index(name)?;
            let height = spec
                .hierarchy
                .as_ref()
                .map_or(0, opaline_hierarchy::Hierarchy::height);
            if spec.min_level > spec.max_level || spec.max_level > height {
                return Err(EngineError::Configuration(format!(
                    "levels {}..={} of attribute {name:?} exceed ladder height {height}",
                    spec.min_level, spec.max_level
                )));
            }
        }
        if self.quasi_identifiers().next().is_none() {
            return Err(EngineError::Configuration(
                "definition declares no quasi-identifying attribute".to_string(),
            ));
        }
        Ok(())
    }
}
