//! Stream producer module
//!
//! Replays a CSV dataset as a line-delimited JSON stream file, one record
//! per row in source order, with a configurable delay between emissions to
//! model a live feed's arrival rate. The stream file is the only channel to
//! the consumer; nothing here assumes the consumer runs concurrently.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Target name for producer operational logs
const TARGET_PRODUCER: &str = "producer";

/// Cell contents treated as "missing value", emitted as JSON null.
const MISSING_MARKERS: [&str; 7] = ["", "NaN", "nan", "NA", "N/A", "null", "NULL"];

/// Replay `dataset` into `output`, pausing `delay` between rows.
///
/// Fatal (Err): dataset missing, unparseable as CSV, or empty of columns.
/// A dataset with zero data rows is not fatal; the stream file is created
/// and left empty.
pub async fn stream(dataset: &Path, output: &Path, delay: Duration) -> Result<()> {
    if !dataset.exists() {
        bail!("Input file not found: {}", dataset.display());
    }

    info!(target: TARGET_PRODUCER, path = %dataset.display(), "Loading dataset");

    let mut reader = csv::Reader::from_path(dataset)
        .with_context(|| format!("Failed to open dataset {}", dataset.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header")?
        .clone();
    if headers.is_empty() {
        bail!("Dataset has no columns: {}", dataset.display());
    }

    let mut rows = Vec::new();
    for record in reader.into_records() {
        rows.push(record.context("Failed to parse dataset row")?);
    }

    if rows.is_empty() {
        warn!(target: TARGET_PRODUCER, "Input dataset has no rows");
    } else {
        info!(target: TARGET_PRODUCER, rows = rows.len(), "Loaded dataset");
    }

    let file = File::create(output)
        .with_context(|| format!("Failed to create stream file {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let total = rows.len();

    for (idx, row) in rows.iter().enumerate() {
        let record = row_to_record(&headers, row);
        let event_id = record
            .get("EventID")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        match serde_json::to_string(&Value::Object(record)) {
            Ok(line) => {
                writeln!(writer, "{}", line)
                    .with_context(|| format!("Failed to write stream file {}", output.display()))?;
                // Each line must be durable before the pacing sleep; the
                // consumer may already be tailing the file.
                writer.flush().context("Failed to flush stream file")?;

                info!(
                    target: TARGET_PRODUCER,
                    sent = idx + 1,
                    total,
                    event_id = %event_id,
                    "Record emitted"
                );
            }
            Err(err) => {
                warn!(
                    target: TARGET_PRODUCER,
                    row = idx,
                    error = %err,
                    "Failed to serialize row; skipping"
                );
                continue;
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(target: TARGET_PRODUCER, path = %output.display(), "Streaming complete");
    Ok(())
}

/// Build a raw record from one CSV row, keyed by the header columns.
fn row_to_record(headers: &csv::StringRecord, row: &csv::StringRecord) -> Map<String, Value> {
    headers
        .iter()
        .zip(row.iter())
        .map(|(name, cell)| (name.to_string(), parse_cell(cell)))
        .collect()
}

/// Infer a JSON value from one CSV cell.
///
/// Missing-value markers become null so the consumer sees explicit absence
/// rather than an empty string that looks like data. Integer-looking cells
/// become numbers so the identifier survives the round trip typed.
fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}
