//! Logging setup for the Restmap CLI
//!
//! This module provides:
//! - Subscriber installation in compact, full or JSON format
//! - A request ID for the CLI session
//! - Sensitive data redaction for anything echoed to the terminal
//! - Timing spans for command phases

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    pub format: LogFormat,
    /// Emit logs at all; `false` keeps only errors
    pub console: bool,
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Per-module levels, e.g. `restmap_core: debug`
    pub module_filter: BTreeMap<String, String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
            module_filter: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Take format and module filters from the config file; a louder level
    /// from `-v` wins over the file's level
    pub fn merge_file(&mut self, file: &LoggingConfig, verbosity: u8) {
        if verbosity == 0 {
            self.level = file.level.clone();
        }
        self.format = file.format;
        self.thread_ids |= file.thread_ids;
        self.source_location |= file.source_location;
        self.module_filter.extend(file.module_filter.clone());
    }

    /// Apply `RUST_LOG` and `RESTMAP_LOG_FORMAT`
    pub fn merge_with_env(&mut self) {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("RESTMAP_LOG_FORMAT") {
            match parse_log_format(&format) {
                Some(format) => self.format = format,
                None => eprintln!("Warning: invalid RESTMAP_LOG_FORMAT '{}', using {:?}", format, self.format),
            }
        }
    }
}

fn parse_log_format(raw: &str) -> Option<LogFormat> {
    match raw.to_lowercase().as_str() {
        "compact" => Some(LogFormat::Compact),
        "full" => Some(LogFormat::Full),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays parseable
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config)?;
    let ansi = std::io::stderr().is_terminal();

    // Each format has its own subscriber type
    let installed = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(ansi)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .compact()
                .finish(),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .json()
                .finish(),
        ),
        LogFormat::Full => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(ansi)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .finish(),
        ),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = REQUEST_ID.get_or_init(generate_request_id);
    tracing::debug!(request_id = %request_id, config = ?config, "Logging system initialized");

    Ok(())
}

fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let level = if config.console { config.level.as_str() } else { "error" };
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", level, e)))?;

    for (module, level) in &config.module_filter {
        let directive = format!("{}={}", module, level)
            .parse()
            .map_err(|e| Error::config(format!("Invalid filter directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Sensitive data redaction for terminal output
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    static SECRET_ASSIGNMENT: OnceLock<Option<Regex>> = OnceLock::new();
    static BEARER: OnceLock<Option<Regex>> = OnceLock::new();

    fn secret_assignment() -> Option<&'static Regex> {
        SECRET_ASSIGNMENT
            .get_or_init(|| {
                Regex::new(r#"(?i)(api[_-]?key|token|secret|password)([=:]\s*)['"]?[^\s'",&]{3,}['"]?"#).ok()
            })
            .as_ref()
    }

    fn bearer() -> Option<&'static Regex> {
        BEARER
            .get_or_init(|| Regex::new(r"(?i)\b(bearer|basic|oauth)\s+[A-Za-z0-9._~+/=,\x22-]{8,}").ok())
            .as_ref()
    }

    /// Redact credentials embedded in free text
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();
        if let Some(regex) = secret_assignment() {
            result = regex.replace_all(&result, "$1$2***").into_owned();
        }
        if let Some(regex) = bearer() {
            result = regex.replace_all(&result, "$1 ***").into_owned();
        }
        result
    }

    /// Redact sensitive keys and credential-looking strings in a JSON tree
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) && (val.is_string() || val.is_number()) {
                        *val = serde_json::Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => arr.iter_mut().for_each(redact_json_value),
            serde_json::Value::String(s) => *s = redact_sensitive(s),
            _ => {}
        }
    }

    fn is_sensitive_key(key: &str) -> bool {
        let key_lower = key.to_lowercase();
        restmap_core::http::is_sensitive_header(key)
            || key_lower.contains("password")
            || key_lower.contains("credential")
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// Records the elapsed time on its span and logs it when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}
