//! Audit reporting for anonymization runs.
//!
//! Every pipeline checkpoint is captured as a [`ReportEntry`]: the phase
//! label, whether the snapshot was taken before or after the pass, a
//! per-attribute frequency distribution, the criterion effects, and the
//! re-identification risk triple. Entries accumulate in a [`ReportSink`]
//! owned by the caller, so two runs never share audit state.
//!
//! The rendered text format is a contract for downstream human review;
//! changing it requires coordinating with report consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

use opaline_engine::RiskProfile;
use opaline_types::Dataset;

// ============================================================================
// Frequency Distributions
// ============================================================================

/// Relative value frequencies of one dataset column, sorted by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    values: Vec<String>,
    frequencies: Vec<f64>,
}

impl FrequencyDistribution {
    /// Tallies the column at `column` over all rows.
    pub fn of(dataset: &Dataset, column: usize) -> Self {
        let mut counts: std::collections::BTreeMap<&str, usize> =
            std::collections::BTreeMap::new();
        for row in dataset.rows() {
            *counts.entry(row[column].as_str()).or_default() += 1;
        }
        let total = dataset.num_rows() as f64;
        let mut values = Vec::with_capacity(counts.len());
        let mut frequencies = Vec::with_capacity(counts.len());
        for (value, count) in counts {
            values.push(value.to_string());
            frequencies.push(count as f64 / total);
        }
        Self {
            values,
            frequencies,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }
}

// ============================================================================
// Report Entries
// ============================================================================

/// Whether a checkpoint captured the dataset entering or leaving a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// One (criterion label, rows removed) pair measured during a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub label: String,
    pub removed: usize,
}

impl Effect {
    pub fn new(label: impl Into<String>, removed: usize) -> Self {
        Self {
            label: label.into(),
            removed,
        }
    }
}

/// One immutable audit checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    phase: String,
    direction: Direction,
    distributions: Vec<(String, FrequencyDistribution)>,
    effects: Vec<Effect>,
    records: usize,
    risk: RiskProfile,
}

impl ReportEntry {
    /// Captures a dataset entering a stage.
    pub fn input(phase: impl Into<String>, dataset: &Dataset, risk: RiskProfile) -> Self {
        Self::capture(phase.into(), Direction::Input, dataset, risk, Vec::new())
    }

    /// Captures a dataset leaving a stage, with the stage's measured effects.
    pub fn output(
        phase: impl Into<String>,
        dataset: &Dataset,
        risk: RiskProfile,
        effects: Vec<Effect>,
    ) -> Self {
        Self::capture(phase.into(), Direction::Output, dataset, risk, effects)
    }

    fn capture(
        phase: String,
        direction: Direction,
        dataset: &Dataset,
        risk: RiskProfile,
        effects: Vec<Effect>,
    ) -> Self {
        let distributions = dataset
            .header()
            .iter()
            .enumerate()
            .map(|(column, name)| (name.clone(), FrequencyDistribution::of(dataset, column)))
            .collect();
        Self {
            phase,
            direction,
            distributions,
            effects,
            records: dataset.num_rows(),
            risk,
        }
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn risk(&self) -> RiskProfile {
        self.risk
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report")?;
        writeln!(f, "------")?;
        writeln!(f, "- Phase: {} ({})", self.phase, self.direction)?;
        for (name, distribution) in &self.distributions {
            write!(f, "- Distribution: {name} [")?;
            let last = distribution.values.len().saturating_sub(1);
            for (i, (value, frequency)) in distribution
                .values
                .iter()
                .zip(&distribution.frequencies)
                .enumerate()
            {
                write!(f, "{value}, {}", Decimal(*frequency))?;
                if i < last {
                    write!(f, ", ")?;
                } else {
                    writeln!(f, "]")?;
                }
            }
        }
        for effect in &self.effects {
            writeln!(
                f,
                "- Effect: {}, records removed: {}",
                effect.label, effect.removed
            )?;
        }
        writeln!(f, "- Total records to be released: {}", self.records)?;
        writeln!(
            f,
            "- Highest re-identification risk: {}",
            Decimal(self.risk.highest)
        )?;
        writeln!(
            f,
            "- Lowest re-identification risk: {}",
            Decimal(self.risk.lowest)
        )?;
        writeln!(
            f,
            "- Average re-identification risk: {}",
            Decimal(self.risk.average)
        )
    }
}

/// Prints an f64 with at least one fractional digit, so whole numbers
/// render as "1.0" rather than "1".
struct Decimal(f64);

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() && self.0 == self.0.trunc() {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ============================================================================
// Report Sink
// ============================================================================

/// Accumulates report entries for one pipeline invocation.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSink {
    entries: Vec<ReportEntry>,
}

impl ReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every entry as plain text, in recording order, with a blank
    /// line after each entry.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&entry.to_string());
            text.push('\n');
        }
        text
    }
}

// ============================================================================
// Tests
// ============================================================================
