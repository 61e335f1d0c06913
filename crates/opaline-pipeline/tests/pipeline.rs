//! End-to-end tests over the three-stage pipeline.

use opaline_pipeline::{fields, generalize, run};
use opaline_report::{Direction, ReportSink};
use opaline_types::Dataset;

fn header() -> Vec<String> {
    vec![
        fields::FIELD_AGE.into(),
        fields::FIELD_GENDER.into(),
        fields::FIELD_DIAGNOSIS_MONTH.into(),
        fields::FIELD_DIAGNOSIS_YEAR.into(),
        fields::FIELD_PHASE_UNCOMPLICATED.into(),
        fields::FIELD_PHASE_COMPLICATED.into(),
        fields::FIELD_PHASE_CRITICAL.into(),
        fields::FIELD_PHASE_RECOVERY.into(),
        fields::FIELD_PHASE_COMPLICATED_VASSOPRESSORS.into(),
        fields::FIELD_PHASE_CRITICIAL_VASSOPRESSORS.into(),
        fields::FIELD_PHASE_CRITICIAL_VENTILATION.into(),
        fields::FIELD_PHASE_UNCOMPLICATED_SUPERINFECTION.into(),
        fields::FIELD_PHASE_COMPLICATED_SUPERINFECTION.into(),
        fields::FIELD_PHASE_CRITICIAL_SUPERINFECTION.into(),
        fields::FIELD_PHASE_RECOVERY_SYMPTOMS.into(),
        fields::FIELD_LAST_KNOWN_STATUS.into(),
    ]
}

fn base_row() -> Vec<String> {
    [
        "26 - 35 years",
        "Male",
        "3",
        "2020",
        "yes",
        "no",
        "no",
        "yes",
        "no",
        "no",
        "no",
        "none",
        "none",
        "none",
        "no",
        "Recovered",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn uniform_dataset(copies: usize) -> Dataset {
    Dataset::new(header(), vec![base_row(); copies]).unwrap()
}

#[test]
fn uniform_cohort_passes_untouched() {
    let mut sink = ReportSink::new();
    let released = run(&uniform_dataset(12), &mut sink).unwrap();
    assert_eq!(released.num_rows(), 12);

    // Pre-generalization rewrote the demographics, nothing else.
    let row = &released.rows()[0];
    assert_eq!(row[0], "26 - 45 years");
    assert_eq!(row[1], "Male");
    assert_eq!(row[2], "<= 3");
    assert_eq!(row[3], "2020");
    assert_eq!(row[15], "Recovered");

    // Every stage records an input and an output checkpoint, in order.
    let phases: Vec<_> = sink
        .entries()
        .iter()
        .map(|entry| (entry.phase().to_string(), entry.direction()))
        .collect();
    assert_eq!(
        phases,
        [
            ("Generalize".to_string(), Direction::Input),
            ("Generalize".to_string(), Direction::Output),
            ("First stage".to_string(), Direction::Input),
            ("First stage".to_string(), Direction::Output),
            ("Second stage".to_string(), Direction::Input),
            ("Second stage".to_string(), Direction::Output),
        ]
    );
}

#[test]
fn outlier_record_is_removed_by_the_first_stage() {
    let mut rows = vec![base_row(); 12];
    let mut outlier = base_row();
    outlier[2] = "7".into();
    rows.push(outlier);
    let dataset = Dataset::new(header(), rows).unwrap();

    let mut sink = ReportSink::new();
    let released = run(&dataset, &mut sink).unwrap();
    assert_eq!(released.num_rows(), 12);
    assert!(released.rows().iter().all(|row| row[2] == "<= 3"));

    // The first stage's effect list names all sixteen screened attributes in
    // protocol order and attributes the removal to the diagnosis month.
    let first_stage_output = &sink.entries()[3];
    let effects = first_stage_output.effects();
    assert_eq!(effects.len(), 16);
    let labels: Vec<_> = effects.iter().map(|effect| effect.label.as_str()).collect();
    assert_eq!(labels[0], "Age.at.diagnosis, 10-anonymity");
    assert_eq!(labels[2], "Month.first.diagnosis, 10-anonymity");
    assert_eq!(labels[15], "Last.known.patient.status, 10-anonymity");
    assert_eq!(effects[2].removed, 1);
    assert_eq!(effects[0].removed, 0);
}

#[test]
fn second_stage_reports_all_nine_models() {
    let mut sink = ReportSink::new();
    run(&uniform_dataset(15), &mut sink).unwrap();

    let second_stage_output = &sink.entries()[5];
    let labels: Vec<_> = second_stage_output
        .effects()
        .iter()
        .map(|effect| effect.label.as_str())
        .collect();
    assert_eq!(labels.len(), 9);
    assert_eq!(labels[0], "Age.at.diagnosis, 11-anonymity");
    assert_eq!(
        labels[1],
        "Last.known.patient.status, 0.5-closeness with hierarchical ground-distance"
    );
    assert_eq!(
        labels[8],
        "Symptoms.in.recovery.phase, 0.5-closeness with hierarchical ground-distance"
    );
    assert!(second_stage_output
        .effects()
        .iter()
        .all(|effect| effect.removed == 0));
}

#[test]
fn pipeline_is_deterministic() {
    let mut rows = vec![base_row(); 12];
    let mut other = base_row();
    other[0] = "36 - 45 years".into();
    rows.extend(vec![other; 11]);
    let dataset = Dataset::new(header(), rows).unwrap();

    let mut first_sink = ReportSink::new();
    let first = run(&dataset, &mut first_sink).unwrap();
    let mut second_sink = ReportSink::new();
    let second = run(&dataset, &mut second_sink).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_sink.render(), second_sink.render());
}

#[test]
fn generalize_rewrites_demographics_and_keeps_every_record() {
    let mut rows = Vec::new();
    for (age, month, year) in [
        ("< 1 years", "1", "2020"),
        ("26 - 35 years", "3", "2020"),
        ("56 - 65 years", "4", "2021"),
        ("> 85 years", "12", "2021"),
    ] {
        let mut row = base_row();
        row[0] = age.into();
        row[2] = month.into();
        row[3] = year.into();
        rows.push(row);
    }
    let dataset = Dataset::new(header(), rows).unwrap();

    let mut sink = ReportSink::new();
    let output = generalize(&dataset, &mut sink).unwrap();
    assert_eq!(output.num_rows(), 4);

    let ages: Vec<_> = output.rows().iter().map(|row| row[0].as_str()).collect();
    assert_eq!(
        ages,
        ["<= 25 years", "26 - 45 years", "46 - 65 years", "> 85 years"]
    );
    let months: Vec<_> = output.rows().iter().map(|row| row[2].as_str()).collect();
    assert_eq!(months, ["<= 3", "<= 3", "4", "12"]);
    let years: Vec<_> = output.rows().iter().map(|row| row[3].as_str()).collect();
    assert_eq!(years, ["2020", "2020", "2021", "2021"]);
}
