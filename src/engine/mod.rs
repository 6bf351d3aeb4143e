//! Detection engine module
//!
//! Evaluates canonical events against the rule set. Two layers, cheapest
//! first: exact membership of the event ID in the suspicious set, then
//! case-insensitive pattern categories over the combined text fields.
//! Evaluation is total and never raises; availability of the pipeline wins
//! over completeness of detection.

use crate::models::CanonicalEvent;
use crate::rules::RuleSet;
use std::sync::Arc;
use tracing::debug;

/// Target name for engine operational logs
const TARGET_ENGINE: &str = "engine";

/// Detection engine holding an immutable, pre-compiled rule set.
pub struct Engine {
    rules: Arc<RuleSet>,
}

impl Engine {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Judge a single event. Short-circuits on the first layer that fires.
    pub fn is_suspicious(&self, event: &CanonicalEvent) -> bool {
        if self.rules.contains_event_id(event.event_id) {
            debug!(
                target: TARGET_ENGINE,
                event_id = event.event_id,
                "Suspicious event ID matched"
            );
            return true;
        }

        // Indicators can surface in any of the three text fields depending
        // on how the source telemetry populated them, so they are searched
        // as one combined string.
        let haystack = format!(
            "{} {} {}",
            event.command_line, event.image, event.process_name
        )
        .to_lowercase();

        for category in self.rules.categories() {
            if category.matches(&haystack) {
                debug!(
                    target: TARGET_ENGINE,
                    event_id = event.event_id,
                    category = category.name(),
                    "Pattern category matched"
                );
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(Arc::new(RuleSet::builtin()))
    }

    fn event(event_id: i64, image: &str, process_name: &str, command_line: &str) -> CanonicalEvent {
        CanonicalEvent {
            event_id,
            utc_time: String::new(),
            image: image.to_string(),
            process_name: process_name.to_string(),
            command_line: command_line.to_string(),
        }
    }

    #[test]
    fn test_suspicious_ids_match_regardless_of_other_fields() {
        let engine = engine();
        for id in [1, 3, 11, 4624, 4688, 4663] {
            assert!(engine.is_suspicious(&event(id, "", "", "")));
        }
    }

    #[test]
    fn test_benign_event_does_not_match() {
        let engine = engine();
        let benign = event(
            999,
            "C:\\Tools\\normal.exe",
            "normal.exe",
            "normal.exe --verbose",
        );
        assert!(!engine.is_suspicious(&benign));
    }

    #[test]
    fn test_sentinel_id_is_not_suspicious() {
        let engine = engine();
        assert!(!engine.is_suspicious(&event(-1, "", "", "")));
    }

    #[test]
    fn test_pattern_in_command_line() {
        let engine = engine();
        let e = event(999, "", "", "tunnel.exe --remote-host example.com");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_pattern_in_image() {
        let engine = engine();
        let e = event(999, "C:\\Tools\\dump.exe", "", "");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_pattern_in_process_name() {
        let engine = engine();
        let e = event(999, "", "extract.exe", "");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let engine = engine();
        let e = event(999, "", "", "RUNAS /user:Administrator cmd.exe");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_encoded_powershell_detected() {
        let engine = engine();
        let e = event(
            999,
            "C:\\Windows\\System32\\WindowsPowerShell\\v1.0\\powershell.exe",
            "powershell.exe",
            "powershell.exe -enc SQBFAFgA",
        );
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_lateral_movement_admin_share_detected() {
        let engine = engine();
        let e = event(999, "", "", "copy payload.dll \\\\host01\\C$");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_net_user_add_detected() {
        let engine = engine();
        let e = event(999, "", "", "net user backdoor hunter2 /add");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_whoami_priv_detected() {
        let engine = engine();
        let e = event(999, "", "", "whoami /priv");
        assert!(engine.is_suspicious(&e));
    }

    #[test]
    fn test_empty_rule_set_matches_nothing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "suspicious_event_ids: []").unwrap();
        let rules = RuleSet::from_path(file.path()).unwrap();
        let engine = Engine::new(Arc::new(rules));
        assert!(!engine.is_suspicious(&event(1, "tunnel.exe", "", "runas")));
    }
}
