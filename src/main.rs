//! Logwarden: host log replay and detection pipeline
//!
//! Replays a historical host-event dataset as a paced line-delimited JSON
//! stream and flags records matching known indicators of suspicious
//! activity.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logwarden::config::AppConfig;
use logwarden::engine::Engine;
use logwarden::rules::RuleSet;
use logwarden::{consumer, producer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "logwarden")]
#[command(about = "Host log replay and detection pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Override logging level (e.g., error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a CSV dataset into the line-delimited stream file
    Produce {
        /// Dataset to replay
        dataset: PathBuf,
        /// Stream file to write (defaults to the configured path)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Seconds to pause between record emissions
        #[arg(long)]
        delay: Option<f64>,
    },
    /// Analyze a stream file and write the alert document
    Consume {
        /// Stream file to read (defaults to the configured path)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Alert document to write (defaults to the configured path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Produce and consume in one invocation
    Run {
        /// Dataset to replay
        dataset: PathBuf,
        /// Seconds to pause between record emissions
        #[arg(long)]
        delay: Option<f64>,
        /// Alert document to write (defaults to the configured path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::new().context("Failed to load configuration")?;
    let _guard = init_logging(&cfg, cli.log_level.as_deref());

    let runtime = Builder::new_multi_thread().enable_all().build()?;

    match cli.command {
        Commands::Produce {
            dataset,
            output,
            delay,
        } => {
            let output = output.unwrap_or_else(|| cfg.producer.stream_path.clone());
            let delay = delay_duration(delay.unwrap_or(cfg.producer.delay_secs));
            runtime.block_on(producer::stream(&dataset, &output, delay))
        }
        Commands::Consume { input, output } => {
            let input = input.unwrap_or_else(|| cfg.producer.stream_path.clone());
            let output = output.unwrap_or_else(|| cfg.consumer.alerts_path.clone());
            let engine = build_engine(&cfg)?;
            consumer::consume(&input, &output, &engine, cfg.consumer.progress_interval)?;
            Ok(())
        }
        Commands::Run {
            dataset,
            delay,
            output,
        } => {
            let stream_path = cfg.producer.stream_path.clone();
            let delay = delay_duration(delay.unwrap_or(cfg.producer.delay_secs));
            let output = output.unwrap_or_else(|| cfg.consumer.alerts_path.clone());
            let engine = build_engine(&cfg)?;
            runtime.block_on(producer::stream(&dataset, &stream_path, delay))?;
            consumer::consume(&stream_path, &output, &engine, cfg.consumer.progress_interval)?;
            Ok(())
        }
    }
}

/// Build the detection engine from the configured rule source.
fn build_engine(cfg: &AppConfig) -> Result<Engine> {
    let rules = match &cfg.rules.path {
        Some(path) => RuleSet::from_path(path)
            .with_context(|| format!("Failed to load rule set from {}", path.display()))?,
        None => RuleSet::builtin(),
    };

    info!(
        target: "rules",
        ids = rules.id_count(),
        categories = rules.category_count(),
        patterns = rules.pattern_count(),
        "Rule set loaded"
    );

    Ok(Engine::new(Arc::new(rules)))
}

/// Non-positive delays disable pacing entirely.
fn delay_duration(secs: f64) -> Duration {
    if secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Initialize the logging pipeline.
/// The returned guard MUST be kept alive for the duration of the program.
fn init_logging(
    cfg: &AppConfig,
    override_level: Option<&str>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = override_level.unwrap_or(&cfg.logging.level);

    let (file_layer, guard) = if cfg.logging.file_output {
        if let Err(err) = std::fs::create_dir_all(&cfg.logging.directory) {
            eprintln!(
                "Failed to create log directory {:?}: {}",
                cfg.logging.directory, err
            );
        }
        let file = rolling::daily(&cfg.logging.directory, &cfg.logging.filename);
        let (writer, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer()
            .with_writer(writer)
            .compact()
            .with_ansi(false)
            .with_target(true)
            .with_filter(EnvFilter::new(level));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = if cfg.logging.console_output {
        Some(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_filter(EnvFilter::new(level)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
