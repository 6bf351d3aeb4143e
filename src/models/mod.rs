//! Data models module
//!
//! Defines core data structures like CanonicalEvent and RunSummary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Raw record as read off the stream file: arbitrary field set, arbitrary
/// value types. Exists only between production and normalization.
pub type RawRecord = Map<String, Value>;

/// Sentinel for an absent or unparseable event identifier.
///
/// Guaranteed absent from any suspicious-ID set, so a malformed identifier
/// can never be misread as a real detection signal.
pub const EVENT_ID_SENTINEL: i64 = -1;

/// Fallback process label when neither ProcessName nor Image is populated.
pub const UNKNOWN_PROCESS: &str = "Unknown";

/// Normalized, fixed-shape log record used by all detection logic.
///
/// Every field is present and type-stable after normalization; downstream
/// code never branches on absence. Serialized field names use the exact
/// wire casing of the stream file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Integer code classifying the kind of system event
    #[serde(rename = "EventID")]
    pub event_id: i64,

    #[serde(rename = "UtcTime")]
    pub utc_time: String,

    #[serde(rename = "Image")]
    pub image: String,

    #[serde(rename = "ProcessName")]
    pub process_name: String,

    #[serde(rename = "CommandLine")]
    pub command_line: String,
}

impl CanonicalEvent {
    /// Best-available process label for operator-facing notices:
    /// ProcessName if non-empty, else Image, else "Unknown".
    pub fn process_label(&self) -> &str {
        if !self.process_name.is_empty() {
            &self.process_name
        } else if !self.image.is_empty() {
            &self.image
        } else {
            UNKNOWN_PROCESS
        }
    }
}

/// Final statistics for one consumer run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Records that passed structural validation and were normalized
    pub processed: u64,
    /// Records the engine judged suspicious
    pub alerts: u64,
    /// Lines skipped due to parse or validation failures
    pub errors: u64,
    /// Location of the alert document
    pub output_path: PathBuf,
    /// Completion timestamp (RFC 3339, UTC)
    pub finished_at: String,
}
