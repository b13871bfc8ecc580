//! HTTP error classification
//!
//! Maps a non-success status and its decoded body onto the [`ErrorKind`]
//! taxonomy and builds the matching [`Error`] variant. The API reports
//! problems as `Errors.Error`, either one object or a list whose first
//! element is the primary error:
//!
//! ```json
//! {"Errors": {"Error": {"Description": "...", "ReasonCode": "...",
//!   "FieldErrors": [{"field": "...", "code": "...", "message": "..."}]}}}
//! ```

use crate::error::{Error, ErrorDetails, ErrorKind, FieldError};
use crate::property_map::{PropertyMap, PropertyValue};

pub const HTTP_REDIRECTED: u16 = 302;
pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_UNAUTHORIZED: u16 = 401;
pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_NOT_ALLOWED: u16 = 405;
pub const HTTP_SERVER_ERROR: u16 = 500;

/// Classify a non-success status
pub fn classify(status: u16, _body: Option<&PropertyMap>) -> ErrorKind {
    match status {
        HTTP_UNAUTHORIZED => ErrorKind::AuthenticationFailed,
        HTTP_NOT_FOUND => ErrorKind::ObjectNotFound,
        HTTP_NOT_ALLOWED => ErrorKind::OperationNotAllowed,
        s if s >= HTTP_SERVER_ERROR => ErrorKind::SystemError,
        _ => ErrorKind::InvalidRequest,
    }
}

/// Message used when the body does not carry one
fn fallback_message(status: u16) -> &'static str {
    match status {
        HTTP_REDIRECTED => "Unexpected response code returned from the API, redirect is happening.",
        HTTP_UNAUTHORIZED => "You are not authorized to make this request. Invalid request signing.",
        HTTP_NOT_FOUND => "Object not found",
        HTTP_NOT_ALLOWED => "Operation not allowed",
        s if s >= HTTP_SERVER_ERROR => "Internal Server Error",
        _ => "Bad request",
    }
}

/// Build the classified error for a non-success response
pub fn into_error(status: u16, body: Option<PropertyMap>) -> Error {
    let kind = classify(status, body.as_ref());
    let primary = body.as_ref().and_then(primary_error);

    let message = primary
        .and_then(|error| first_text(error, &["Description", "message"]))
        .unwrap_or_else(|| fallback_message(status).to_string());
    let reason_code = primary.and_then(|error| first_text(error, &["ReasonCode", "code"]));
    let source = primary.and_then(|error| first_text(error, &["Source", "source"]));
    let field_errors = match kind {
        ErrorKind::InvalidRequest => primary.map(parse_field_errors).unwrap_or_default(),
        _ => Vec::new(),
    };

    let details = ErrorDetails {
        status: Some(status),
        message,
        reason_code,
        source,
        body,
    };

    match kind {
        ErrorKind::InvalidRequest => Error::InvalidRequest {
            details,
            field_errors,
        },
        ErrorKind::AuthenticationFailed => Error::Authentication { details },
        ErrorKind::ObjectNotFound => Error::ObjectNotFound { details },
        ErrorKind::OperationNotAllowed => Error::NotAllowed { details },
        ErrorKind::SystemError | ErrorKind::ConfigurationError => Error::System {
            details,
            source: None,
        },
    }
}

/// A failure that produced no HTTP response
pub fn transport_error(error: reqwest::Error) -> Error {
    Error::System {
        details: ErrorDetails::new(format!("An unexpected error has been raised: {}", error)),
        source: Some(Box::new(error)),
    }
}

/// `Errors.Error`, or its first element when the API sent a list
pub fn primary_error(body: &PropertyMap) -> Option<&PropertyValue> {
    match body.get("Errors.Error")? {
        PropertyValue::List(items) => items.first(),
        error => Some(error),
    }
}

/// Field errors listed under `FieldErrors` of one error object
pub fn parse_field_errors(error: &PropertyValue) -> Vec<FieldError> {
    let Some(entries) = error.as_map().and_then(|map| map.get("FieldErrors")) else {
        return Vec::new();
    };

    match entries {
        PropertyValue::List(items) => items.iter().map(FieldError::from_value).collect(),
        // A single field error is sometimes sent unwrapped
        single @ PropertyValue::Map(_) => vec![FieldError::from_value(single)],
        _ => Vec::new(),
    }
}

fn first_text(error: &PropertyValue, keys: &[&str]) -> Option<String> {
    let map = error.as_map()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .filter_map(PropertyValue::to_text)
        .find(|text| !text.is_empty())
}
