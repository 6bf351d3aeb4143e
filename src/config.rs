//! Configuration module
//!
//! Provides structured configuration for the logwarden pipeline.
//! Configuration can be loaded from:
//! 1. Default values (hardcoded)
//! 2. config.toml file (optional)
//! 3. Environment variables with LOGWARDEN__ prefix
//!
//! Example environment variable override:
//! LOGWARDEN__LOGGING__LEVEL=debug
//! LOGWARDEN__CONSUMER__ALERTS_PATH=out/alerts.json

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub logging: LogConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
}

/// Operational logging configuration
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub directory: PathBuf,
    pub filename: String,
    pub console_output: bool,
    pub file_output: bool,
}

/// Detection rule configuration
#[derive(Debug, Default, Deserialize)]
pub struct RulesConfig {
    /// Optional YAML rule file; the built-in rule set is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Producer (dataset replay) configuration
#[derive(Debug, Deserialize)]
pub struct ProducerConfig {
    /// Default stream file written between the two stages
    pub stream_path: PathBuf,
    /// Default pause between record emissions, in seconds
    pub delay_secs: f64,
}

/// Consumer (stream analysis) configuration
#[derive(Debug, Deserialize)]
pub struct ConsumerConfig {
    /// Default alert document location
    pub alerts_path: PathBuf,
    /// Emit a progress notice every Nth processed record (0 disables)
    pub progress_interval: u64,
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            // --- Defaults ---
            // Logging
            .set_default("logging.level", "info")?
            .set_default("logging.directory", "logs")?
            .set_default("logging.filename", "logwarden.log")?
            .set_default("logging.console_output", true)?
            .set_default("logging.file_output", false)?
            // Producer
            .set_default("producer.stream_path", "stream_buffer.jsonl")?
            .set_default("producer.delay_secs", 1.0)?
            // Consumer
            .set_default("consumer.alerts_path", "alerts.json")?
            .set_default("consumer.progress_interval", 100)?
            // --- Sources ---
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("LOGWARDEN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LogConfig {
                level: "info".to_string(),
                directory: PathBuf::from("logs"),
                filename: "logwarden.log".to_string(),
                console_output: true,
                file_output: false,
            },
            rules: RulesConfig { path: None },
            producer: ProducerConfig {
                stream_path: PathBuf::from("stream_buffer.jsonl"),
                delay_secs: 1.0,
            },
            consumer: ConsumerConfig {
                alerts_path: PathBuf::from("alerts.json"),
                progress_interval: 100,
            },
        }
    }
}
