//! API configuration
//!
//! [`ApiConfig`] replaces process-wide state: the active environment, the
//! base URLs, the debug flag and the request signer are handed explicitly to
//! [`ApiController::new`](crate::ApiController::new) and are read-only from
//! then on.
//!
//! Values are resolved in this order (later wins):
//! - Built-in defaults
//! - Builder setters
//! - `RESTMAP_*` environment variables (via [`ApiConfig::merge_env`])

use crate::error::{Error, Result};
use crate::http::RequestSigner;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LIVE_URL: &str = "https://api.mastercard.com";
pub const DEFAULT_SANDBOX_URL: &str = "https://sandbox.api.mastercard.com";
/// Local endpoint used by [`ApiConfig::set_localhost`]
pub const LOCALHOST_URL: &str = "http://localhost:8080";

const ENV_SANDBOX: &str = "RESTMAP_SANDBOX";
const ENV_DEBUG: &str = "RESTMAP_DEBUG";
const ENV_LIVE_URL: &str = "RESTMAP_LIVE_URL";
const ENV_SANDBOX_URL: &str = "RESTMAP_SANDBOX_URL";

/// Which base URL requests go to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Live => write!(f, "live"),
        }
    }
}

/// Configuration read by the request builder and the dispatcher
#[derive(Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    /// Log every exchange at DEBUG level
    pub debug: bool,
    pub live_url: String,
    pub sandbox_url: String,
    /// Signs every outgoing request; required by `ApiController::new`
    pub signer: Option<Arc<dyn RequestSigner>>,
    /// Whole-request timeout; none by default
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Sandbox,
            debug: false,
            live_url: DEFAULT_LIVE_URL.to_string(),
            sandbox_url: DEFAULT_SANDBOX_URL.to_string(),
            signer: None,
            timeout: None,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("environment", &self.environment)
            .field("debug", &self.debug)
            .field("live_url", &self.live_url)
            .field("sandbox_url", &self.sandbox_url)
            .field("signer", &self.signer.as_ref().map(|_| "<signer>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Defaults, then a `.env` file if present, then `RESTMAP_*` variables
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Point both environments at [`LOCALHOST_URL`]
    pub fn set_localhost(&mut self) -> &mut Self {
        self.live_url = LOCALHOST_URL.to_string();
        self.sandbox_url = LOCALHOST_URL.to_string();
        self
    }

    /// Undo [`set_localhost`](Self::set_localhost)
    pub fn unset_localhost(&mut self) -> &mut Self {
        self.reset_hosts()
    }

    /// Override either base URL; `None` leaves that one untouched
    pub fn set_custom_hosts(&mut self, sandbox: Option<&str>, live: Option<&str>) -> &mut Self {
        if let Some(sandbox) = sandbox {
            self.sandbox_url = sandbox.to_string();
        }
        if let Some(live) = live {
            self.live_url = live.to_string();
        }
        self
    }

    /// Restore both default base URLs
    pub fn reset_hosts(&mut self) -> &mut Self {
        self.live_url = DEFAULT_LIVE_URL.to_string();
        self.sandbox_url = DEFAULT_SANDBOX_URL.to_string();
        self
    }

    /// Base URL of the active environment
    pub fn base_url(&self) -> &str {
        match self.environment {
            Environment::Sandbox => &self.sandbox_url,
            Environment::Live => &self.live_url,
        }
    }

    pub fn is_sandbox(&self) -> bool {
        self.environment == Environment::Sandbox
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Live
    }

    /// Apply `RESTMAP_SANDBOX`, `RESTMAP_DEBUG`, `RESTMAP_LIVE_URL` and
    /// `RESTMAP_SANDBOX_URL` when they are set
    pub fn merge_env(&mut self) -> Result<&mut Self> {
        if let Some(sandbox) = env_flag(ENV_SANDBOX)? {
            self.environment = if sandbox {
                Environment::Sandbox
            } else {
                Environment::Live
            };
        }
        if let Some(debug) = env_flag(ENV_DEBUG)? {
            self.debug = debug;
        }
        if let Ok(url) = std::env::var(ENV_LIVE_URL) {
            self.live_url = url;
        }
        if let Ok(url) = std::env::var(ENV_SANDBOX_URL) {
            self.sandbox_url = url;
        }
        Ok(self)
    }

    /// Check that a signer with usable credentials is present and both base
    /// URLs are absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        let Some(signer) = &self.signer else {
            return Err(Error::configuration(
                "No request signer configured. Set one with ApiConfig::with_signer",
            ));
        };
        signer.validate_credentials()?;

        validate_base_url("live", &self.live_url)?;
        validate_base_url("sandbox", &self.sandbox_url)?;

        Ok(())
    }
}

fn validate_base_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::Configuration {
        message: format!("Invalid {} base URL: {}", name, value),
        source: Some(anyhow::Error::new(e)),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::configuration(format!(
            "Invalid {} base URL: {} (scheme must be http or https)",
            name, value
        )));
    }
    Ok(())
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::Validation {
            field: name.to_string(),
            message: format!("cannot interpret '{}' as a boolean", raw),
            expected: Some("true or false".to_string()),
        }),
    }
}
