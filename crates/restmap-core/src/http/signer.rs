//! Request signing
//!
//! Signing is the last step of building a request: the signer receives the
//! resolved URL and the fully drafted exchange and returns the exchange to
//! send. Two simple signers ship with the crate:
//! - Fixed headers with `${ENV:NAME}` expansion ([`HeaderSigner`])
//! - Bearer tokens ([`BearerSigner`])
//!
//! Anything more involved (OAuth body hashes, HMAC schemes) plugs in by
//! implementing [`RequestSigner`].

use crate::error::{Error, Result};
use crate::http::HttpExchange;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Attaches authentication proof to an outgoing exchange
pub trait RequestSigner: Send + Sync {
    /// Return the signed exchange. Called exactly once per request, after
    /// every other header and the body have been set.
    fn sign(&self, url: &Url, exchange: HttpExchange) -> Result<HttpExchange>;

    /// Check that the credentials the signer needs are available
    fn validate_credentials(&self) -> Result<()> {
        Ok(())
    }
}

/// Adds a fixed set of headers, expanding `${ENV:NAME}` in their values
#[derive(Debug, Clone, Default)]
pub struct HeaderSigner {
    headers: BTreeMap<String, String>,
}

impl HeaderSigner {
    pub fn new(headers: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            headers: headers.into_iter().collect(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.headers.keys().map(String::as_str)
    }
}

impl RequestSigner for HeaderSigner {
    fn sign(&self, _url: &Url, mut exchange: HttpExchange) -> Result<HttpExchange> {
        for (name, value) in &self.headers {
            let expanded = expand_env_vars(value)?;
            exchange.set_header(name, &expanded)?;
        }
        Ok(exchange)
    }

    fn validate_credentials(&self) -> Result<()> {
        for value in self.headers.values() {
            expand_env_vars(value)?;
        }
        Ok(())
    }
}

/// Adds `Authorization: Bearer <token>`
#[derive(Clone)]
pub struct BearerSigner {
    token: String,
}

impl BearerSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerSigner").field("token", &"[REDACTED]").finish()
    }
}

impl RequestSigner for BearerSigner {
    fn sign(&self, _url: &Url, mut exchange: HttpExchange) -> Result<HttpExchange> {
        exchange.set_header("Authorization", &format!("Bearer {}", self.token))?;
        Ok(exchange)
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::configuration("Bearer token is empty"));
        }
        Ok(())
    }
}

static ENV_PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();

/// Expand environment variables in the format `${ENV:VAR_NAME}`
pub fn expand_env_vars(value: &str) -> Result<String> {
    let re = ENV_PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$\{ENV:([^}]+)\}").ok())
        .as_ref()
        .ok_or_else(|| Error::Configuration {
            message: "Invalid environment placeholder pattern".to_string(),
            source: None,
        })?;

    let mut result = value.to_string();
    for cap in re.captures_iter(value) {
        let var_name = &cap[1];
        let env_value = std::env::var(var_name).map_err(|_| {
            Error::configuration(format!("Environment variable {} not found", var_name))
        })?;

        result = result.replace(&cap[0], &env_value);
    }

    Ok(result)
}
