//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use restmap_core::Action;
use serde_json::Value;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Restmap CLI - declarative REST operations from the command line
///
/// Builds, signs and sends a single operation described by a path template
/// and an action, with fields given as key paths.
#[derive(Parser, Debug)]
#[command(
    name = "restmap",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "RESTMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Target the live environment instead of the sandbox
    #[arg(long, global = true)]
    pub live: bool,

    /// Log every exchange, not only failed ones
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute an operation and print the response
    Call(OperationArgs),

    /// Print the signed request for an operation without sending it
    Preview(OperationArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}

/// Arguments shared by `call` and `preview`
#[derive(Args, Debug, Clone)]
pub struct OperationArgs {
    /// Resource path template, e.g. /accounts/{id}
    #[arg(value_name = "PATH_TEMPLATE")]
    pub path_template: String,

    /// Action to perform (create, read, update, delete, list, query)
    #[arg(short, long, value_parser = parse_action)]
    pub action: Action,

    /// Field as KEY=VALUE; KEY is a key path, VALUE is JSON or a plain string
    #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    /// JSON or YAML file whose contents are merged into the fields first
    #[arg(long, value_name = "FILE")]
    pub body_file: Option<PathBuf>,

    /// Field name sent as a request header
    #[arg(long = "header-field", value_name = "NAME")]
    pub header_fields: Vec<String>,

    /// Field name kept in the query string for create and update
    #[arg(long = "query-field", value_name = "NAME")]
    pub query_fields: Vec<String>,

    /// Host override for this operation
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// API version reported in the User-Agent
    #[arg(long, default_value = "1.0.0")]
    pub api_version: String,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration with secrets redacted
    Show,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors and formatting
    Human,
    /// JSON format (compact)
    Json,
    /// JSON format (pretty-printed)
    JsonPretty,
    /// YAML format
    Yaml,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

fn parse_action(raw: &str) -> Result<Action, String> {
    raw.parse().map_err(|e: restmap_core::Error| e.to_string())
}

/// Split `KEY=VALUE`; the value is JSON when it parses, else a string
fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
