//! Structured Logging
//!
//! JSON output for production, pretty output for development. The level
//! and format are read from `VORTEX_LOG_LEVEL` / `VORTEX_LOG_FORMAT`, with
//! `RUST_LOG` taking over the filter when the level is not set.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::error::{EngineError, EngineResult};

/// Crates whose events pass the default filter
const VORTEX_TARGETS: &[&str] = &[
    "vortex_core",
    "vortex_store",
    "vortex_engine",
    "vortex_api",
    "vortex_cli",
    "tower_http",
];

/// Log level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(EngineError::config(format!("unknown log level: {other}"))),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty-printed for development
    #[default]
    Pretty,
    /// JSON for production
    Json,
    /// Compact single-line
    Compact,
}

impl FromStr for LogFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(EngineError::config(format!("unknown log format: {other}"))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level
    pub level: LogLevel,
    /// Log format
    pub format: LogFormat,
    /// Include source file/line
    pub include_source: bool,
    /// Include thread ID
    pub include_thread_id: bool,
    /// Include span events
    pub include_span_events: bool,
    /// Environment filter string (e.g., "vortex_engine=debug,tower_http=warn")
    pub filter: Option<String>,
    /// Service name for log context
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_source: true,
            include_thread_id: false,
            include_span_events: false,
            filter: None,
            service_name: "vortex".to_string(),
        }
    }
}

impl LogConfig {
    /// Create a production-ready configuration
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            include_source: false,
            include_thread_id: true,
            include_span_events: true,
            ..Self::default()
        }
    }

    /// Create a development configuration
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            ..Self::default()
        }
    }

    /// Create from environment variables
    ///
    /// Unparseable values fall back to the defaults with a warning on stderr,
    /// since no subscriber exists yet to report them.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        match lookup("VORTEX_LOG_LEVEL").map(|v| v.parse::<LogLevel>()) {
            Some(Ok(level)) => config.level = level,
            Some(Err(e)) => eprintln!("{e}, using {}", config.level),
            None => config.filter = lookup("RUST_LOG").filter(|f| !f.trim().is_empty()),
        }

        match lookup("VORTEX_LOG_FORMAT").map(|v| v.parse::<LogFormat>()) {
            Some(Ok(format)) => config.format = format,
            Some(Err(e)) => eprintln!("{e}, using pretty"),
            None => {}
        }

        if config.format == LogFormat::Json {
            config.include_source = false;
            config.include_thread_id = true;
        }
        config
    }

    /// Set level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set service name
    pub fn with_service_name(mut self, name: &str) -> Self {
        self.service_name = name.to_string();
        self
    }

    /// Filter directives used when no explicit filter is configured
    pub fn default_directives(&self) -> String {
        let mut directives = vec![format!("{}={}", self.service_name.replace('-', "_"), self.level)];
        directives.extend(VORTEX_TARGETS.iter().map(|t| format!("{t}={}", self.level)));
        directives.join(",")
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: &LogConfig) -> EngineResult<()> {
    let filter = match &config.filter {
        Some(f) => EnvFilter::try_new(f),
        None => EnvFilter::try_new(config.default_directives()),
    }
    .map_err(|e| EngineError::Logging(e.to_string()))?;

    let span_events = if config.include_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = match config.format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(span_events)
                        .with_thread_ids(config.include_thread_id)
                        .with_file(config.include_source)
                        .with_line_number(config.include_source),
                );
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_span_events(span_events)
                        .with_thread_ids(config.include_thread_id)
                        .with_file(config.include_source)
                        .with_line_number(config.include_source),
                );
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_span_events(span_events)
                        .with_thread_ids(config.include_thread_id)
                        .with_file(config.include_source)
                        .with_line_number(config.include_source),
                );
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    installed.map_err(|e| EngineError::Logging(e.to_string()))
}
