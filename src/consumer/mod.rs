//! Stream consumer module
//!
//! Reads the line-delimited stream file record by record, normalizes each
//! record, evaluates it against the detection engine, and writes the final
//! alert document. Bad individual lines never stop the run; a missing input
//! or an unwritable alert document does.

use crate::engine::Engine;
use crate::models::{CanonicalEvent, RawRecord, RunSummary};
use crate::normalizer;
use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Target name for consumer operational logs
const TARGET_CONSUMER: &str = "consumer";

/// Fields a record must carry to be structurally valid.
const REQUIRED_FIELDS: [&str; 1] = ["EventID"];

/// Process `input` line by line and write the alert document to `output`.
///
/// `progress_interval` controls the informational notice cadence (every Nth
/// processed record; 0 disables the notice).
pub fn consume(
    input: &Path,
    output: &Path,
    engine: &Engine,
    progress_interval: u64,
) -> Result<RunSummary> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    info!(target: TARGET_CONSUMER, path = %input.display(), "Processing stream");

    let file = File::open(input)
        .with_context(|| format!("Failed to open stream file {}", input.display()))?;
    let reader = BufReader::new(file);

    let mut alerts: Vec<CanonicalEvent> = Vec::new();
    let mut processed: u64 = 0;
    let mut errors: u64 = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;

        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(
                    target: TARGET_CONSUMER,
                    line = line_num,
                    error = %err,
                    "Failed to read line"
                );
                errors += 1;
                continue;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: RawRecord = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    target: TARGET_CONSUMER,
                    line = line_num,
                    error = %err,
                    "Malformed record"
                );
                errors += 1;
                continue;
            }
        };

        if !has_required_fields(&raw) {
            warn!(
                target: TARGET_CONSUMER,
                line = line_num,
                "Record missing required fields"
            );
            errors += 1;
            continue;
        }

        let event = normalizer::normalize(&raw);
        processed += 1;

        if progress_interval > 0 && processed % progress_interval == 0 {
            info!(target: TARGET_CONSUMER, processed, "Progress");
        }

        if engine.is_suspicious(&event) {
            info!(
                target: TARGET_CONSUMER,
                event_id = event.event_id,
                process = %event.process_label(),
                "Suspicious event detected"
            );
            alerts.push(event);
        }
    }

    // The alert document is the run's sole product; written whole at the
    // end, so a cancelled run leaves no partial file.
    write_alerts(output, &alerts)?;

    let summary = RunSummary {
        processed,
        alerts: alerts.len() as u64,
        errors,
        output_path: output.to_path_buf(),
        finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    info!(
        target: TARGET_CONSUMER,
        processed = summary.processed,
        alerts = summary.alerts,
        errors = summary.errors,
        output = %output.display(),
        "Processing complete"
    );

    Ok(summary)
}

/// Structural validation: a record must at minimum carry the identifier.
fn has_required_fields(record: &RawRecord) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|field| record.contains_key(*field))
}

/// Serialize the alert collection (detection order preserved) as a
/// pretty-printed JSON array. Failure here is fatal to the run.
fn write_alerts(output: &Path, alerts: &[CanonicalEvent]) -> Result<()> {
    let json = serde_json::to_string_pretty(alerts).context("Failed to serialize alerts")?;
    fs::write(output, json)
        .with_context(|| format!("Failed to write alert document {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_required_fields_present() {
        assert!(has_required_fields(&raw(json!({"EventID": 1}))));
        assert!(has_required_fields(&raw(
            json!({"EventID": null, "Image": "x"})
        )));
    }

    #[test]
    fn test_required_fields_missing() {
        assert!(!has_required_fields(&raw(json!({"Image": "cmd.exe"}))));
        assert!(!has_required_fields(&RawRecord::new()));
    }

    #[test]
    fn test_write_alerts_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        write_alerts(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_alerts_unwritable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("alerts.json");
        assert!(write_alerts(&path, &[]).is_err());
    }
}
