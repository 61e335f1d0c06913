//! Reading raw registry exports and writing release files.
//!
//! Both sides use semicolon-delimited text with a header line. The raw
//! export carries 15 columns with a combined `Month.year.first.diagnosis`
//! field; loading splits it into separate month and year columns and
//! normalizes value spellings, producing the 16-column release schema.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use opaline_pipeline::fields;
use opaline_types::{Dataset, VALUE_NA, normalize_token};

const DELIMITER: char = ';';
const RAW_COLUMNS: usize = 15;

/// Raw export column positions.
const RAW_AGE: usize = 0;
const RAW_GENDER: usize = 1;
const RAW_MONTH_YEAR: usize = 2;
const RAW_PHASE_UNCOMPLICATED: usize = 3;
const RAW_PHASE_COMPLICATED: usize = 4;
const RAW_PHASE_CRITICAL: usize = 5;
const RAW_PHASE_RECOVERY: usize = 6;
const RAW_LAST_KNOWN_STATUS: usize = 7;
const RAW_VASSOPRESSORS_COMPLICATED: usize = 8;
const RAW_VASSOPRESSORS_CRITICAL: usize = 9;
const RAW_VENTILATION_CRITICAL: usize = 10;
const RAW_SUPERINFECTION_UNCOMPLICATED: usize = 11;
const RAW_SUPERINFECTION_COMPLICATED: usize = 12;
const RAW_SUPERINFECTION_CRITICAL: usize = 13;
const RAW_SYMPTOMS_RECOVERY: usize = 14;

/// Column names of the release schema, in file order.
fn release_header() -> Vec<String> {
    [
        fields::FIELD_AGE,
        fields::FIELD_GENDER,
        fields::FIELD_DIAGNOSIS_MONTH,
        fields::FIELD_DIAGNOSIS_YEAR,
        fields::FIELD_PHASE_UNCOMPLICATED,
        fields::FIELD_PHASE_COMPLICATED,
        fields::FIELD_PHASE_CRITICAL,
        fields::FIELD_PHASE_RECOVERY,
        fields::FIELD_PHASE_COMPLICATED_VASSOPRESSORS,
        fields::FIELD_PHASE_CRITICIAL_VASSOPRESSORS,
        fields::FIELD_PHASE_CRITICIAL_VENTILATION,
        fields::FIELD_PHASE_UNCOMPLICATED_SUPERINFECTION,
        fields::FIELD_PHASE_COMPLICATED_SUPERINFECTION,
        fields::FIELD_PHASE_CRITICIAL_SUPERINFECTION,
        fields::FIELD_PHASE_RECOVERY_SYMPTOMS,
        fields::FIELD_LAST_KNOWN_STATUS,
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Loads a raw 15-column registry export into the 16-column release schema.
pub fn load(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let mut lines = text.lines();
    if lines.next().is_none() {
        bail!("input file {} is empty", path.display());
    }

    let mut rows = Vec::new();
    for (number, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let raw: Vec<&str> = line.split(DELIMITER).collect();
        if raw.len() != RAW_COLUMNS {
            bail!(
                "line {} has {} fields, expected {}",
                number + 2,
                raw.len(),
                RAW_COLUMNS
            );
        }
        let (month, year) = split_month_year(raw[RAW_MONTH_YEAR].trim());
        rows.push(vec![
            normalize_token(raw[RAW_AGE]),
            normalize_token(raw[RAW_GENDER]),
            normalize_token(&month),
            normalize_token(&year),
            normalize_token(raw[RAW_PHASE_UNCOMPLICATED]),
            normalize_token(raw[RAW_PHASE_COMPLICATED]),
            normalize_token(raw[RAW_PHASE_CRITICAL]),
            normalize_token(raw[RAW_PHASE_RECOVERY]),
            normalize_token(raw[RAW_VASSOPRESSORS_COMPLICATED]),
            normalize_token(raw[RAW_VASSOPRESSORS_CRITICAL]),
            normalize_token(raw[RAW_VENTILATION_CRITICAL]),
            normalize_token(raw[RAW_SUPERINFECTION_UNCOMPLICATED]),
            normalize_token(raw[RAW_SUPERINFECTION_COMPLICATED]),
            normalize_token(raw[RAW_SUPERINFECTION_CRITICAL]),
            normalize_token(raw[RAW_SYMPTOMS_RECOVERY]),
            normalize_token(raw[RAW_LAST_KNOWN_STATUS]),
        ]);
    }

    Dataset::new(release_header(), rows)
        .with_context(|| format!("input file {} is not a valid export", path.display()))
}

/// Splits the combined `<month>_<year>` field. Values without an underscore
/// carry no usable date and map to n/a on both sides.
fn split_month_year(value: &str) -> (String, String) {
    match value.split_once('_') {
        Some((month, year)) if value != VALUE_NA => (month.to_string(), year.to_string()),
        _ => (VALUE_NA.to_string(), VALUE_NA.to_string()),
    }
}

/// Writes a release dataset as semicolon-delimited text.
pub fn write(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut text = String::new();
    text.push_str(&dataset.header().join(&DELIMITER.to_string()));
    text.push('\n');
    for row in dataset.rows() {
        text.push_str(&row.join(&DELIMITER.to_string()));
        text.push('\n');
    }
    fs::write(path, text)
        .with_context(|| format!("failed to write output file {}", path.display()))
}

// ============================================================================
// Tests
// ============================================================================
