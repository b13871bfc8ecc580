//! Error types and handling for the CLI

use restmap_core::ErrorKind;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from restmap-core, including classified API failures
    #[error(transparent)]
    Core(#[from] restmap_core::Error),

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{message}")]
    Other { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    ///
    /// Core errors get one code per error kind so scripts can tell a
    /// missing object from a rejected request.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(e) => match e.kind() {
                ErrorKind::InvalidRequest => 20,
                ErrorKind::AuthenticationFailed => 21,
                ErrorKind::ObjectNotFound => 22,
                ErrorKind::OperationNotAllowed => 23,
                ErrorKind::SystemError => 24,
                ErrorKind::ConfigurationError => 5,
            },
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
///
/// Core errors print their full description, one field error per line.
pub fn format_error(error: &Error, use_color: bool) -> String {
    let message = match error {
        Error::Core(core_error) => match core_error.status() {
            Some(status) => format!("{} (HTTP {}): {}", core_error.kind(), status, core_error.describe()),
            None => core_error.describe(),
        },
        other => other.to_string(),
    };

    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    }
}
