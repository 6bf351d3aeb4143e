//! Rule set module
//!
//! Immutable detection configuration: a set of suspicious event IDs and
//! named regex pattern categories. Constructed once at startup and passed
//! by reference into the engine; never mutated afterwards.
//!
//! The suspicious IDs and patterns are domain heuristics kept as data, not
//! code: a YAML rule file can replace the built-in set without touching the
//! engine. Regexes are compiled once at load time, case-insensitive.

use anyhow::{Context, Result};
use regex::{Regex, RegexSet, RegexSetBuilder};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Target name for rule loading logs
const TARGET_RULES: &str = "rules";

/// High-signal event codes flagged regardless of any other field.
const DEFAULT_SUSPICIOUS_EVENT_IDS: [i64; 6] = [1, 3, 11, 4624, 4688, 4663];

/// Built-in pattern categories. Category grouping exists for
/// maintainability and logging; any single match in any category is
/// sufficient for a verdict.
fn default_pattern_categories() -> Vec<(String, Vec<String>)> {
    let categories: [(&str, &[&str]); 5] = [
        (
            "powershell_encoded",
            &[r"-enc\s+[A-Za-z0-9+/]", r"-encodedcommand\s+[A-Za-z0-9+/]"],
        ),
        (
            "suspicious_processes",
            &[r"tunnel\.exe", r"dump\.exe", r"extract\.exe", r"suspicious"],
        ),
        (
            "lateral_movement",
            &[r"\\\\[^\\]+\\[A-Za-z]\$", r"net\s+user\s+\w+\s+\w+\s+/add"],
        ),
        (
            "suspicious_networks",
            &[r":\d{4}.*-[CR]\s", r"--remote-host", r"--forward"],
        ),
        (
            "privilege_escalation",
            &[r"runas", r"--admin", r"whoami\s+/priv"],
        ),
    ];

    categories
        .into_iter()
        .map(|(name, patterns)| {
            (
                name.to_string(),
                patterns.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

/// On-disk rule file shape (YAML)
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    suspicious_event_ids: Vec<i64>,
    #[serde(default)]
    patterns: BTreeMap<String, Vec<String>>,
}

/// One named group of compiled patterns
#[derive(Debug, Clone)]
pub struct PatternCategory {
    name: String,
    patterns: Vec<String>,
    set: RegexSet,
}

impl PatternCategory {
    /// Compile a category, skipping invalid patterns with a warning.
    /// Returns None when no pattern in the category compiles.
    fn compile(name: &str, patterns: &[String]) -> Option<Self> {
        let mut valid = Vec::new();

        for pattern in patterns {
            match Regex::new(pattern) {
                Ok(_) => valid.push(pattern.clone()),
                Err(err) => {
                    warn!(
                        target: TARGET_RULES,
                        category = name,
                        pattern = %pattern,
                        error = %err,
                        "Skipping invalid pattern"
                    );
                }
            }
        }

        if valid.is_empty() {
            warn!(
                target: TARGET_RULES,
                category = name,
                "Category has no valid patterns; skipping"
            );
            return None;
        }

        let set = match RegexSetBuilder::new(&valid).case_insensitive(true).build() {
            Ok(set) => set,
            Err(err) => {
                warn!(
                    target: TARGET_RULES,
                    category = name,
                    error = %err,
                    "Failed to build pattern set; skipping category"
                );
                return None;
            }
        };

        Some(Self {
            name: name.to_string(),
            patterns: valid,
            set,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// True when any pattern in this category matches the haystack.
    pub fn matches(&self, haystack: &str) -> bool {
        self.set.is_match(haystack)
    }
}

/// Immutable rule configuration: suspicious event IDs plus pattern
/// categories, compiled and ready for evaluation.
#[derive(Debug, Clone)]
pub struct RuleSet {
    suspicious_event_ids: HashSet<i64>,
    categories: Vec<PatternCategory>,
}

impl RuleSet {
    /// Built-in rule set matching the shipped default heuristics.
    pub fn builtin() -> Self {
        Self::from_parts(
            DEFAULT_SUSPICIOUS_EVENT_IDS.into_iter().collect(),
            default_pattern_categories(),
        )
    }

    /// Load a rule set from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file {}", path.display()))?;
        let file: RuleFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse rule file {}", path.display()))?;

        Ok(Self::from_parts(
            file.suspicious_event_ids.into_iter().collect(),
            file.patterns.into_iter().collect(),
        ))
    }

    fn from_parts(ids: HashSet<i64>, categories: Vec<(String, Vec<String>)>) -> Self {
        let categories = categories
            .iter()
            .filter_map(|(name, patterns)| PatternCategory::compile(name, patterns))
            .collect();

        Self {
            suspicious_event_ids: ids,
            categories,
        }
    }

    pub fn contains_event_id(&self, event_id: i64) -> bool {
        self.suspicious_event_ids.contains(&event_id)
    }

    pub fn categories(&self) -> &[PatternCategory] {
        &self.categories
    }

    pub fn id_count(&self) -> usize {
        self.suspicious_event_ids.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.categories.iter().map(|c| c.pattern_count()).sum()
    }
}
