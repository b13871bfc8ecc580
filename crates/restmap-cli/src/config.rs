//! Configuration management for the CLI
//!
//! Settings are layered, later layers winning:
//! - Default values
//! - A configuration file (YAML/JSON)
//! - `RESTMAP_*` environment variables
//! - Command-line flags

use crate::error::{Error, Result};
use crate::logging::redaction;
use crate::logging::LoggingConfig;
use restmap_core::http::expand_env_vars;
use restmap_core::{ApiConfig, BearerSigner, Environment, HeaderSigner, RequestSigner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Header used when the file configures no authentication at all
pub const DEFAULT_AUTH_HEADER: (&str, &str) = ("Authorization", "Bearer ${ENV:RESTMAP_TOKEN}");

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target the sandbox environment
    pub sandbox: bool,

    /// Log every exchange
    pub debug: bool,

    /// Point both environments at `http://localhost:8080`
    pub localhost: bool,

    pub live_url: Option<String>,
    pub sandbox_url: Option<String>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    pub auth: AuthConfig,

    pub logging: LoggingConfig,

    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// How outgoing requests are signed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token; may reference `${ENV:NAME}`
    pub bearer_token: Option<String>,

    /// Static headers; values may reference `${ENV:NAME}`
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sandbox: true,
            debug: false,
            localhost: false,
            live_url: None,
            sandbox_url: None,
            timeout: None,
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            source: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let mut config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "YAML".to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "JSON".to_string(),
            })?
        };
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the first configuration file found in the default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".restmap.yaml"),
            PathBuf::from(".restmap.yml"),
            PathBuf::from(".restmap.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let restmap_dir = config_dir.join("restmap");
            paths.push(restmap_dir.join("config.yaml"));
            paths.push(restmap_dir.join("config.json"));
        }

        paths
    }

    /// Build the signer described by the `auth` section
    pub fn signer(&self) -> Result<Arc<dyn RequestSigner>> {
        if let Some(token) = &self.auth.bearer_token {
            return Ok(Arc::new(BearerSigner::new(expand_env_vars(token)?)));
        }

        let signer = if self.auth.headers.is_empty() {
            let (name, value) = DEFAULT_AUTH_HEADER;
            HeaderSigner::default().with_header(name, value)
        } else {
            HeaderSigner::new(self.auth.headers.clone())
        };
        Ok(Arc::new(signer))
    }

    /// File settings, then environment overrides, then the `--live` and
    /// `--debug` flags
    pub fn to_api_config(&self, live: bool, debug: bool) -> Result<ApiConfig> {
        let environment = if self.sandbox {
            Environment::Sandbox
        } else {
            Environment::Live
        };

        let mut api_config = ApiConfig::default()
            .with_environment(environment)
            .with_debug(self.debug)
            .with_signer(self.signer()?);
        if let Some(seconds) = self.timeout {
            api_config = api_config.with_timeout(Duration::from_secs(seconds));
        }
        if self.localhost {
            api_config.set_localhost();
        }
        api_config.set_custom_hosts(self.sandbox_url.as_deref(), self.live_url.as_deref());
        api_config.merge_env()?;

        if live {
            api_config.environment = Environment::Live;
        }
        if debug {
            api_config.debug = true;
        }

        Ok(api_config)
    }

    /// The configuration as JSON with credentials masked
    pub fn redacted(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        redaction::redact_json_value(&mut value);
        Ok(value)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
