//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use restmap_core::ApiConfig;
use serde_json::{json, Value};

pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    api_config: &ApiConfig,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => handle_config_show(config, api_config, output),
    }
}

/// Print the file settings and the resolved client configuration
fn handle_config_show(config: &Config, api_config: &ApiConfig, output: &mut OutputWriter) -> Result<()> {
    match &config.source {
        Some(path) => output.info(&format!("Configuration loaded from {}", path.display()))?,
        None => output.info("No configuration file found, using defaults")?,
    }

    let view = json!({
        "file": config.redacted()?,
        "effective": effective_view(api_config),
    });
    output.data(&view)
}

fn effective_view(api_config: &ApiConfig) -> Value {
    json!({
        "environment": api_config.environment.to_string(),
        "base_url": api_config.base_url(),
        "live_url": api_config.live_url,
        "sandbox_url": api_config.sandbox_url,
        "debug": api_config.debug,
        "timeout_secs": api_config.timeout.map(|t| t.as_secs()),
        "signer": api_config.signer.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use restmap_core::Environment;

    #[test]
    fn test_effective_view() {
        let mut api_config = ApiConfig::default().with_environment(Environment::Live);
        api_config.set_localhost();

        let view = effective_view(&api_config);
        assert_eq!(view["environment"], api_config.environment.to_string());
        assert_eq!(view["base_url"], "http://localhost:8080");
        assert_eq!(view["signer"], false);
        assert_eq!(view["timeout_secs"], Value::Null);
    }
}
