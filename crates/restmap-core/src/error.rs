//! Error types for the Restmap core library
//!
//! Every failure surfaces as one [`Error`]. Failures that come from an HTTP
//! exchange carry an [`ErrorDetails`] with the status and decoded body; the
//! invalid-request variant additionally carries the structured field errors
//! reported by the API.

use crate::property_map::{PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Restmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing signer, malformed base URL and similar setup problems
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 400, 302 and any other 4xx without a dedicated kind
    #[error("Invalid request: {details}")]
    InvalidRequest {
        details: ErrorDetails,
        field_errors: Vec<FieldError>,
    },

    /// 401
    #[error("Authentication failed: {details}")]
    Authentication { details: ErrorDetails },

    /// 404
    #[error("Object not found: {details}")]
    ObjectNotFound { details: ErrorDetails },

    /// 405
    #[error("Operation not allowed: {details}")]
    NotAllowed { details: ErrorDetails },

    /// 5xx, or a transport failure that produced no response
    #[error("System error: {details}")]
    System {
        details: ErrorDetails,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed key path passed to the property map
    #[error("Invalid key path '{path}': {reason}")]
    InvalidKeyPath { path: String, reason: String },

    /// A `{placeholder}` in a resource path had no usable field
    #[error("Missing path parameter '{name}' for resource path '{resource_path}'")]
    MissingPathParameter { name: String, resource_path: String },

    /// Validation errors for inputs
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        expected: Option<String>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP request building errors
    #[error("HTTP request error: {message}")]
    HttpRequest {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy, independent of the carried data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ConfigurationError,
    InvalidRequest,
    AuthenticationFailed,
    ObjectNotFound,
    OperationNotAllowed,
    SystemError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigurationError => write!(f, "configuration-error"),
            ErrorKind::InvalidRequest => write!(f, "invalid-request"),
            ErrorKind::AuthenticationFailed => write!(f, "authentication-failed"),
            ErrorKind::ObjectNotFound => write!(f, "object-not-found"),
            ErrorKind::OperationNotAllowed => write!(f, "operation-not-allowed"),
            ErrorKind::SystemError => write!(f, "system-error"),
        }
    }
}

/// Data carried by every error raised from an HTTP exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,
    /// Human-readable message, taken from the body when the API sent one
    pub message: String,
    /// API reason code (`ReasonCode`)
    pub reason_code: Option<String>,
    /// Component the API blamed (`Source`)
    pub source: Option<String>,
    /// Decoded response body
    pub body: Option<PropertyMap>,
}

impl ErrorDetails {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            reason_code: None,
            source: None,
            body: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: Option<PropertyMap>) -> Self {
        self.body = body;
        self
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        if let Some(code) = &self.reason_code {
            write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

/// A validation failure on one named field of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    /// Read `field`, `code` and `message` from one `FieldErrors` entry
    pub fn from_value(value: &PropertyValue) -> Self {
        let text = |key: &str| {
            value
                .as_map()
                .and_then(|map| map.get(key))
                .and_then(PropertyValue::to_text)
                .unwrap_or_default()
        };

        Self {
            field: text("field"),
            code: text("code"),
            message: text("message"),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field error: {}\"{}\" ({})", self.field, self.message, self.code)
    }
}

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_key_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidKeyPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    ///
    /// Errors raised before any exchange took place (bad key paths, missing
    /// path parameters, unbuildable requests) count as invalid requests;
    /// local JSON failures count as system errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration { .. } => ErrorKind::ConfigurationError,
            Error::InvalidRequest { .. }
            | Error::InvalidKeyPath { .. }
            | Error::MissingPathParameter { .. }
            | Error::Validation { .. }
            | Error::HttpRequest { .. } => ErrorKind::InvalidRequest,
            Error::Authentication { .. } => ErrorKind::AuthenticationFailed,
            Error::ObjectNotFound { .. } => ErrorKind::ObjectNotFound,
            Error::NotAllowed { .. } => ErrorKind::OperationNotAllowed,
            Error::System { .. } | Error::Json { .. } => ErrorKind::SystemError,
        }
    }

    /// Details of the HTTP exchange, when the error came from one
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Error::InvalidRequest { details, .. }
            | Error::Authentication { details }
            | Error::ObjectNotFound { details }
            | Error::NotAllowed { details }
            | Error::System { details, .. } => Some(details),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.details().and_then(|d| d.status)
    }

    pub fn body(&self) -> Option<&PropertyMap> {
        self.details().and_then(|d| d.body.as_ref())
    }

    /// Field errors of an invalid request; empty for every other error
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Error::InvalidRequest { field_errors, .. } => field_errors,
            _ => &[],
        }
    }

    pub fn has_field_errors(&self) -> bool {
        !self.field_errors().is_empty()
    }

    /// Whether the caller can fix the request and try again
    pub fn is_caller_correctable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidRequest | ErrorKind::ObjectNotFound | ErrorKind::OperationNotAllowed
        )
    }

    /// Message followed by one line per field error
    pub fn describe(&self) -> String {
        let mut description = match self.details() {
            Some(details) => details.message.clone(),
            None => self.to_string(),
        };
        for field_error in self.field_errors() {
            description.push('\n');
            description.push_str(&field_error.to_string());
        }
        description
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
