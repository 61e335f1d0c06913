//! Column names of the released case-record schema.
//!
//! Names follow the upstream registry export verbatim, dots included, so
//! the released table lines up with the registry's documentation.

pub const FIELD_AGE: &str = "Age.at.diagnosis";
pub const FIELD_GENDER: &str = "Sex";
pub const FIELD_DIAGNOSIS_MONTH: &str = "Month.first.diagnosis";
pub const FIELD_DIAGNOSIS_YEAR: &str = "Year.first.diagnosis";
pub const FIELD_PHASE_UNCOMPLICATED: &str = "Uncomplicated.phase";
pub const FIELD_PHASE_COMPLICATED: &str = "Complicated.phase";
pub const FIELD_PHASE_CRITICAL: &str = "Critical.phase";
pub const FIELD_PHASE_RECOVERY: &str = "Recovery.phase";
pub const FIELD_LAST_KNOWN_STATUS: &str = "Last.known.patient.status";
pub const FIELD_PHASE_COMPLICATED_VASSOPRESSORS: &str = "Vasopressors.in.complicated.phase";
pub const FIELD_PHASE_CRITICIAL_VASSOPRESSORS: &str = "Vasopressors.in.critical.phase";
pub const FIELD_PHASE_CRITICIAL_VENTILATION: &str = "Invasive.ventilation.in.critical.phase";
pub const FIELD_PHASE_UNCOMPLICATED_SUPERINFECTION: &str = "Superinfection.in.uncomplicated.phase";
pub const FIELD_PHASE_COMPLICATED_SUPERINFECTION: &str = "Superinfection.in.complicated.phase";
pub const FIELD_PHASE_CRITICIAL_SUPERINFECTION: &str = "Superinfection.in.critical.phase";
pub const FIELD_PHASE_RECOVERY_SYMPTOMS: &str = "Symptoms.in.recovery.phase";

/// Combined month/year column found in raw registry exports, split into
/// [`FIELD_DIAGNOSIS_MONTH`] and [`FIELD_DIAGNOSIS_YEAR`] on load.
pub const LEGACY_FIELD_DIAGNOSIS_MONTH_YEAR: &str = "Month.year.first.diagnosis";

/// Demographic quasi-identifiers used for risk estimation and as the
/// grouping attributes of the second stage.
pub const DEMOGRAPHICS: [&str; 4] = [
    FIELD_AGE,
    FIELD_GENDER,
    FIELD_DIAGNOSIS_MONTH,
    FIELD_DIAGNOSIS_YEAR,
];

/// Attributes screened by the first stage, in protocol order.
pub const FIRST_STAGE_FIELDS: [&str; 16] = [
    FIELD_AGE,
    FIELD_GENDER,
    FIELD_DIAGNOSIS_MONTH,
    FIELD_DIAGNOSIS_YEAR,
    FIELD_PHASE_UNCOMPLICATED,
    FIELD_PHASE_COMPLICATED,
    FIELD_PHASE_CRITICAL,
    FIELD_PHASE_RECOVERY,
    FIELD_PHASE_COMPLICATED_VASSOPRESSORS,
    FIELD_PHASE_CRITICIAL_VASSOPRESSORS,
    FIELD_PHASE_CRITICIAL_VENTILATION,
    FIELD_PHASE_UNCOMPLICATED_SUPERINFECTION,
    FIELD_PHASE_COMPLICATED_SUPERINFECTION,
    FIELD_PHASE_CRITICIAL_SUPERINFECTION,
    FIELD_PHASE_RECOVERY_SYMPTOMS,
    FIELD_LAST_KNOWN_STATUS,
];
