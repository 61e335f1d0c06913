//! The three anonymization stages, in protocol order.
//!
//! 1. **Generalize** clamps the four demographic quasi-identifiers to fixed
//!    generalization levels, without suppressing anything.
//! 2. **First stage** screens each released attribute in isolation against
//!    k-anonymity(10), then enforces k-anonymity(10) across all sixteen
//!    attributes at once.
//! 3. **Second stage** enforces a k-anonymity(11) baseline plus hierarchical
//!    t-closeness(0.5) for each clinical attribute, grouped by the
//!    demographic quasi-identifiers.
//!
//! Stages 1 and 2 follow a two-phase protocol: each criterion's suppression
//! effect is first measured in isolation (report only), then all criteria of
//! the stage are applied simultaneously with union suppression semantics.
//! Every stage records an input and an output audit entry.

use tracing::{debug, info};

use opaline_engine::{Anonymization, Criterion, Definition, SearchConfig, anonymize, assess_risk};
use opaline_hierarchy::{Hierarchy, builtin};
use opaline_report::{Effect, ReportEntry, ReportSink};
use opaline_types::Dataset;

use crate::error::{PipelineError, Result};
use crate::fields;

const PHASE_GENERALIZE: &str = "Generalize";
const PHASE_FIRST_STAGE: &str = "First stage";
const PHASE_SECOND_STAGE: &str = "Second stage";

const NO_SUPPRESSION: SearchConfig = SearchConfig {
    suppression_limit: 0.0,
};
const UNBOUNDED_SUPPRESSION: SearchConfig = SearchConfig {
    suppression_limit: 1.0,
};

// ============================================================================
// Orchestration
// ============================================================================

/// Runs the full pipeline on a loaded dataset, recording audit checkpoints
/// into `sink`. Returns the release dataset.
pub fn run(dataset: &Dataset, sink: &mut ReportSink) -> Result<Dataset> {
    let generalized = generalize(dataset, sink)?;
    let screened = first_stage(&generalized, sink)?;
    let released = second_stage(&screened, sink)?;
    info!(
        input_records = dataset.num_rows(),
        released_records = released.num_rows(),
        "pipeline complete"
    );
    Ok(released)
}

fn demographic_risk(dataset: &Dataset, stage: &'static str) -> Result<opaline_engine::RiskProfile> {
    assess_risk(dataset, &fields::DEMOGRAPHICS)
        .map_err(|source| PipelineError::Stage { stage, source })
}

// ============================================================================
// Stage 1: Generalize
// ============================================================================

/// Applies the fixed pre-generalization of the demographic quasi-identifiers:
/// age and diagnosis month move up one hierarchy level, sex and year stay
/// at their leaves. The pass must not suppress any record.
pub fn generalize(dataset: &Dataset, sink: &mut ReportSink) -> Result<Dataset> {
    sink.record(ReportEntry::input(
        PHASE_GENERALIZE,
        dataset,
        demographic_risk(dataset, PHASE_GENERALIZE)?,
    ));

    let definition = Definition::new()
        .clamped(fields::FIELD_AGE, builtin::age(), 1)
        .clamped(fields::FIELD_GENDER, builtin::gender(), 0)
        .clamped(fields::FIELD_DIAGNOSIS_MONTH, builtin::month(), 1)
        .clamped(fields::FIELD_DIAGNOSIS_YEAR, builtin::year(), 0);
    let criteria = [Criterion::SampleUniqueness { threshold: 1.0 }];
    let outcome = run_pass(dataset, &definition, &criteria, NO_SUPPRESSION, PHASE_GENERALIZE)?;
    if outcome.suppressed_count() != 0 {
        return Err(PipelineError::GeneralizeSuppressed {
            removed: outcome.suppressed_count(),
        });
    }
    let output = apply_pass(&outcome, dataset, &definition, PHASE_GENERALIZE)?;

    sink.record(ReportEntry::output(
        PHASE_GENERALIZE,
        &output,
        demographic_risk(&output, PHASE_GENERALIZE)?,
        Vec::new(),
    ));
    Ok(output)
}

// ============================================================================
// Stage 2: First stage
// ============================================================================

/// Screens every released attribute against k-anonymity(10), then applies
/// the combined sixteen-attribute k-anonymity(10) pass.
pub fn first_stage(dataset: &Dataset, sink: &mut ReportSink) -> Result<Dataset> {
    sink.record(ReportEntry::input(
        PHASE_FIRST_STAGE,
        dataset,
        demographic_risk(dataset, PHASE_FIRST_STAGE)?,
    ));

    let criterion = Criterion::KAnonymity { k: 10 };
    let mut effects = Vec::with_capacity(fields::FIRST_STAGE_FIELDS.len());
    for field in fields::FIRST_STAGE_FIELDS {
        let definition = Definition::new().quasi_identifying(field);
        let outcome = run_pass(
            dataset,
            &definition,
            std::slice::from_ref(&criterion),
            UNBOUNDED_SUPPRESSION,
            PHASE_FIRST_STAGE,
        )?;
        debug!(field, removed = outcome.suppressed_count(), "isolated screening pass");
        effects.push(Effect::new(
            format!("{field}, {criterion}"),
            outcome.suppressed_count(),
        ));
    }

    let definition = fields::FIRST_STAGE_FIELDS
        .iter()
        .fold(Definition::new(), |definition, field| {
            definition.quasi_identifying(*field)
        });
    let outcome = run_pass(
        dataset,
        &definition,
        std::slice::from_ref(&criterion),
        UNBOUNDED_SUPPRESSION,
        PHASE_FIRST_STAGE,
    )?;
    let output = apply_pass(&outcome, dataset, &definition, PHASE_FIRST_STAGE)?;

    sink.record(ReportEntry::output(
        PHASE_FIRST_STAGE,
        &output,
        demographic_risk(&output, PHASE_FIRST_STAGE)?,
        effects,
    ));
    Ok(output)
}

// ============================================================================
// Stage 3: Second stage
// ============================================================================

/// One criterion of the second stage, together with the attribute named in
/// its effect label and the sensitive attribute it watches, if any.
struct PrivacyModel {
    label_attribute: &'static str,
    sensitive: Option<&'static str>,
    criterion: Criterion,
}

impl PrivacyModel {
    fn baseline() -> Self {
        Self {
            label_attribute: fields::FIELD_AGE,
            sensitive: None,
            criterion: Criterion::KAnonymity { k: 11 },
        }
    }

    fn closeness(attribute: &'static str, hierarchy: Hierarchy) -> Self {
        Self {
            label_attribute: attribute,
            sensitive: Some(attribute),
            criterion: Criterion::HierarchicalTCloseness {
                attribute: attribute.to_string(),
                t: 0.5,
                hierarchy,
            },
        }
    }

    fn label(&self) -> String {
        format!("{}, {}", self.label_attribute, self.criterion)
    }
}

fn second_stage_models() -> Vec<PrivacyModel> {
    vec![
        PrivacyModel::baseline(),
        PrivacyModel::closeness(fields::FIELD_LAST_KNOWN_STATUS, builtin::status()),
        PrivacyModel::closeness(
            fields::FIELD_PHASE_COMPLICATED_VASSOPRESSORS,
            builtin::intervention(),
        ),
        PrivacyModel::closeness(
            fields::FIELD_PHASE_CRITICIAL_VASSOPRESSORS,
            builtin::intervention(),
        ),
        PrivacyModel::closeness(
            fields::FIELD_PHASE_CRITICIAL_VENTILATION,
            builtin::intervention(),
        ),
        PrivacyModel::closeness(
            fields::FIELD_PHASE_UNCOMPLICATED_SUPERINFECTION,
            builtin::infection(),
        ),
        PrivacyModel::closeness(
            fields::FIELD_PHASE_COMPLICATED_SUPERINFECTION,
            builtin::infection(),
        ),
        PrivacyModel::closeness(
            fields::FIELD_PHASE_CRITICIAL_SUPERINFECTION,
            builtin::infection(),
        ),
        PrivacyModel::closeness(fields::FIELD_PHASE_RECOVERY_SYMPTOMS, builtin::symptoms()),
    ]
}

fn demographic_definition() -> Definition {
    fields::DEMOGRAPHICS
        .iter()
        .fold(Definition::new(), |definition, field| {
            definition.quasi_identifying(*field)
        })
}

/// Measures each privacy model's isolated suppression effect, then applies
/// all nine simultaneously to produce the release dataset.
pub fn second_stage(dataset: &Dataset, sink: &mut ReportSink) -> Result<Dataset> {
    sink.record(ReportEntry::input(
        PHASE_SECOND_STAGE,
        dataset,
        demographic_risk(dataset, PHASE_SECOND_STAGE)?,
    ));

    let models = second_stage_models();

    let mut effects = Vec::with_capacity(models.len());
    for model in &models {
        let mut definition = demographic_definition();
        if let Some(attribute) = model.sensitive {
            definition = definition.sensitive(attribute);
        }
        let outcome = run_pass(
            dataset,
            &definition,
            std::slice::from_ref(&model.criterion),
            UNBOUNDED_SUPPRESSION,
            PHASE_SECOND_STAGE,
        )?;
        debug!(
            model = %model.label(),
            removed = outcome.suppressed_count(),
            "isolated privacy model pass"
        );
        effects.push(Effect::new(model.label(), outcome.suppressed_count()));
    }

    let mut definition = demographic_definition();
    for model in &models {
        if let Some(attribute) = model.sensitive {
            definition = definition.sensitive(attribute);
        }
    }
    let criteria: Vec<Criterion> = models.into_iter().map(|model| model.criterion).collect();
    let outcome = run_pass(
        dataset,
        &definition,
        &criteria,
        UNBOUNDED_SUPPRESSION,
        PHASE_SECOND_STAGE,
    )?;
    let output = apply_pass(&outcome, dataset, &definition, PHASE_SECOND_STAGE)?;

    sink.record(ReportEntry::output(
        PHASE_SECOND_STAGE,
        &output,
        demographic_risk(&output, PHASE_SECOND_STAGE)?,
        effects,
    ));
    Ok(output)
}

// ============================================================================
// Engine plumbing
// ============================================================================

fn run_pass(
    dataset: &Dataset,
    definition: &Definition,
    criteria: &[Criterion],
    config: SearchConfig,
    stage: &'static str,
) -> Result<Anonymization> {
    anonymize(dataset, definition, criteria, config)
        .map_err(|source| PipelineError::Stage { stage, source })
}

fn apply_pass(
    outcome: &Anonymization,
    dataset: &Dataset,
    definition: &Definition,
    stage: &'static str,
) -> Result<Dataset> {
    outcome
        .apply(dataset, definition)
        .map_err(|source| PipelineError::Stage { stage, source })
}
