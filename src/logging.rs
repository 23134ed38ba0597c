//! Structured logging setup.
//!
//! Configured from environment variables:
//!
//! | variable | default | meaning |
//! |----------|---------|---------|
//! | `SVCGEN_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `SVCGEN_LOG_FORMAT` | `compact` | json/pretty/compact |
//! | `SVCGEN_LOG_TARGET_FILTER` | unset | extra comma-separated filter directives |
//! | `SVCGEN_LOG_INCLUDE_LOCATION` | `false` | include file:line |
//! | `SVCGEN_LOG_ASYNC` | `false` | write through a non-blocking worker |
//!
//! `RUST_LOG` overrides the level when set. Logs go to stderr so command
//! output on stdout stays clean.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Module filter (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
    /// Buffer log writes on a background worker
    pub async_logging: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("SVCGEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("SVCGEN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
            ),
            target_filter: env::var("SVCGEN_LOG_TARGET_FILTER").ok(),
            include_location: env::var("SVCGEN_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            async_logging: env::var("SVCGEN_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

/// Keeps the non-blocking writer flushing until dropped.
#[must_use = "dropping the guard stops flushing buffered logs"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let level = parse_level(&config.log_level);
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }
    env_filter
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LogGuard> {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let (writer, worker) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LogGuard { _worker: worker })
}
