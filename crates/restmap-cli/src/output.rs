//! Output formatting for the CLI
//!
//! Results go to stdout in the selected [`OutputFormat`]; status lines are
//! only printed in human mode.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use restmap_core::HttpExchange;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};
use tracing::trace;

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}

/// Output writer that handles formatting and color
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_chatty(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Human
    }

    /// Write an informational message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if !self.is_chatty() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if !self.is_chatty() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if !self.is_chatty() {
            return Ok(());
        }
        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut logged = serde_json::to_value(value)?;
            redaction::redact_json_value(&mut logged);
            trace!(data = %logged, "Writing output");
        }

        let formatted = self.format.format(value)?;
        match self.format {
            // serde_yaml already ends with a newline
            OutputFormat::Yaml => self.write(&formatted),
            _ => self.writeln(&formatted),
        }
    }

    /// Write a drafted or signed request; sensitive header values are masked
    pub fn exchange(&mut self, exchange: &HttpExchange) -> Result<()> {
        let headers = exchange.redacted_headers();
        let body = exchange_body(exchange);

        if self.format != OutputFormat::Human {
            let mut view = Map::new();
            view.insert("method".to_string(), Value::String(exchange.method.to_string()));
            view.insert("url".to_string(), Value::String(exchange.url.to_string()));
            view.insert(
                "headers".to_string(),
                Value::Object(
                    headers
                        .into_iter()
                        .map(|(name, value)| (name, Value::String(value)))
                        .collect(),
                ),
            );
            view.insert("body".to_string(), body.unwrap_or(Value::Null));
            return self.data(&view);
        }

        let request_line = format!("{} {}", exchange.method, exchange.url);
        if self.use_color {
            self.writeln(&request_line.bold().to_string())?;
        } else {
            self.writeln(&request_line)?;
        }
        for (name, value) in &headers {
            let line = format!("{}: {}", name, value);
            if self.use_color {
                self.writeln(&line.dimmed().to_string())?;
            } else {
                self.writeln(&line)?;
            }
        }
        if let Some(body) = body {
            self.writeln("")?;
            self.data(&body)?;
        }
        Ok(())
    }
}

/// Body as JSON when it parses, else as text; `None` when empty
fn exchange_body(exchange: &HttpExchange) -> Option<Value> {
    if exchange.body.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(&exchange.body)
            .unwrap_or_else(|_| Value::String(exchange.body_text())),
    )
}
