//! Operation descriptors
//!
//! An [`OperationConfig`] names a resource path template, the [`Action`] to
//! perform on it, and which request fields travel as headers or query
//! parameters. [`OperationMetadata`] carries what is shared by a whole
//! resource family: the API version and an optional host override.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// CRUD-like verb selecting the HTTP method and how fields are partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
    Query,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::List,
        Action::Query,
    ];

    pub fn method(self) -> Method {
        match self {
            Action::Create => Method::POST,
            Action::Update => Method::PUT,
            Action::Delete => Method::DELETE,
            Action::Read | Action::List | Action::Query => Method::GET,
        }
    }

    /// Whether the remaining fields are sent as a JSON body.
    ///
    /// Body-carrying actions only put declared query fields in the URL;
    /// the others put every remaining scalar field there.
    pub fn sends_body(self) -> bool {
        match self {
            Action::Create | Action::Update => true,
            Action::Read | Action::Delete | Action::List | Action::Query => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
            Action::Query => "query",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::Validation {
                field: "action".to_string(),
                message: format!("unknown action '{}'", s),
                expected: Some("create, read, update, delete, list or query".to_string()),
            })
    }
}

/// Immutable description of one resource/action pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Path template with `{name}` placeholders
    pub resource_path: String,
    pub action: Action,
    /// Fields sent as headers of the same name
    #[serde(default)]
    pub header_params: BTreeSet<String>,
    /// Fields sent in the query string for body-carrying actions
    #[serde(default)]
    pub query_params: BTreeSet<String>,
}

impl OperationConfig {
    pub fn new(resource_path: impl Into<String>, action: Action) -> Self {
        Self {
            resource_path: resource_path.into(),
            action,
            header_params: BTreeSet::new(),
            query_params: BTreeSet::new(),
        }
    }

    pub fn with_header_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_params.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_query_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_params.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Per-resource-family metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub api_version: String,
    /// Replaces the environment base URL when set
    #[serde(default)]
    pub host: Option<String>,
}

impl OperationMetadata {
    pub fn new(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            host: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}
