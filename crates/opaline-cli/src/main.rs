//! Anonymization tool for clinical case-record releases.
//!
//! ```bash
//! # Anonymize an export and write the release plus its audit report
//! opaline cases.csv release.csv
//!
//! # Keep a machine-readable copy of the audit trail
//! opaline cases.csv release.csv --json-report audit.json
//! ```
//!
//! The release file is written as `<output>.csv` (the suffix is added when
//! missing) and the plain-text audit report as `<output>.csv.report`.

mod io;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

/// Anonymizes a raw case-record export for public release.
#[derive(Parser)]
#[command(name = "opaline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the raw semicolon-delimited export.
    input: PathBuf,

    /// Path for the released file; `.csv` is appended when missing.
    output: PathBuf,

    /// Also write the audit trail as JSON to this path.
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    execute(&cli)
}

fn execute(cli: &Cli) -> Result<()> {
    if cli.input.as_os_str().is_empty() || cli.output.as_os_str().is_empty() {
        bail!("you need to specify files for input and output");
    }
    if !cli.input.exists() {
        bail!("the specified input file doesn't exist");
    }

    let output = if cli.output.to_string_lossy().ends_with(".csv") {
        cli.output.clone()
    } else {
        PathBuf::from(format!("{}.csv", cli.output.display()))
    };
    // Create the output file up front so an unwritable path fails before
    // the pipeline runs.
    fs::File::create(&output)
        .with_context(|| format!("the output file {} isn't writable", output.display()))?;

    // A failed run must not leave a half-written release behind.
    anonymize(cli, &output).inspect_err(|_| {
        let _ = fs::remove_file(&output);
    })
}

fn anonymize(cli: &Cli, output: &Path) -> Result<()> {
    let dataset = io::load(&cli.input)?;
    info!(records = dataset.num_rows(), input = %cli.input.display(), "loaded export");

    let mut sink = opaline_report::ReportSink::new();
    let released = opaline_pipeline::run(&dataset, &mut sink)?;

    io::write(&released, output)?;

    let report_path = PathBuf::from(format!("{}.report", output.display()));
    fs::write(&report_path, sink.render())
        .with_context(|| format!("failed to write report file {}", report_path.display()))?;

    if let Some(json_path) = &cli.json_report {
        let json = serde_json::to_string_pretty(sink.entries())
            .context("failed to serialize the audit trail")?;
        fs::write(json_path, json)
            .with_context(|| format!("failed to write JSON report {}", json_path.display()))?;
    }

    info!(
        records = released.num_rows(),
        output = %output.display(),
        report = %report_path.display(),
        "release written"
    );
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    use tempfile::tempdir;

    const VALID_ROW: &str =
        "26 - 35 years;Male;3_2020;yes;no;no;yes;Recovered;no;no;no;none;none;none;no";

    fn cli(input: &Path, output: &Path) -> Cli {
        Cli {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            json_report: None,
            verbose: false,
        }
    }

    fn write_export(path: &Path, rows: &[&str]) {
        let mut file = fs::File::create(path).unwrap();
        writeln!(file, "header").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    #[test]
    fn successful_run_writes_release_and_report() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("export.csv");
        write_export(&input, &[VALID_ROW; 12]);
        let output = dir.path().join("release");

        execute(&cli(&input, &output)).unwrap();

        let release = dir.path().join("release.csv");
        assert!(release.exists());
        assert!(dir.path().join("release.csv.report").exists());
        let text = fs::read_to_string(&release).unwrap();
        assert_eq!(text.lines().count(), 13);
    }

    #[test]
    fn failed_run_leaves_no_output_behind() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("export.csv");
        // Too few fields: loading fails after the output file was probed.
        write_export(&input, &["26 - 35 years;Male;3_2020"]);
        let output = dir.path().join("release.csv");

        execute(&cli(&input, &output)).unwrap_err();

        assert!(!output.exists());
        assert!(!dir.path().join("release.csv.report").exists());
    }

    #[test]
    fn missing_input_fails_before_touching_the_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("release.csv");
        let err = execute(&cli(&dir.path().join("absent.csv"), &output)).unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
        assert!(!output.exists());
    }
}
