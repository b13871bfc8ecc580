//! Shared utilities for command handlers

use crate::cli::OperationArgs;
use crate::error::{Error, Result};
use restmap_core::{OperationConfig, OperationMetadata, PropertyMap};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Descriptor, metadata and fields for one command-line operation
pub struct Operation {
    pub config: OperationConfig,
    pub metadata: OperationMetadata,
    pub fields: PropertyMap,
}

/// Turn `call`/`preview` arguments into an operation; `--body-file` is
/// imported first so `-f` fields override it
pub fn build_operation(args: &OperationArgs) -> Result<Operation> {
    if !args.query_fields.is_empty() && !args.action.sends_body() {
        return Err(Error::invalid_args(format!(
            "--query-field only applies to create and update; {} sends every field in the query string",
            args.action
        )));
    }

    let config = OperationConfig::new(args.path_template.clone(), args.action)
        .with_header_params(args.header_fields.iter().cloned())
        .with_query_params(args.query_fields.iter().cloned());

    let mut metadata = OperationMetadata::new(args.api_version.clone());
    if let Some(host) = &args.host {
        metadata = metadata.with_host(host.clone());
    }

    let mut fields = PropertyMap::new();
    if let Some(path) = &args.body_file {
        fields.set_all(load_document(path)?)?;
    }
    for (key, value) in &args.fields {
        fields.set(key, value.clone())?;
    }
    debug!(fields = fields.size(), action = %args.action, "Operation assembled");

    Ok(Operation {
        config,
        metadata,
        fields,
    })
}

/// Read a JSON or YAML document, chosen by extension
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    if !matches!(value, Value::Object(_) | Value::Array(_)) {
        return Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "an object or a list of objects".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use restmap_core::{Action, PropertyValue};
    use std::io::Write;

    fn operation_args(argv: &[&str]) -> OperationArgs {
        let mut full = vec!["restmap"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Call(args) | Commands::Preview(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_build_operation_from_flags() {
        let args = operation_args(&[
            "call",
            "/accounts/{id}",
            "-a",
            "update",
            "-f",
            "id=7",
            "-f",
            "Account.Tags[]=vip",
            "--query-field",
            "dryRun",
            "--host",
            "https://eu.api.test",
            "--api-version",
            "2.1.0",
        ]);

        let operation = build_operation(&args).unwrap();
        assert_eq!(operation.config.action, Action::Update);
        assert!(operation.config.query_params.contains("dryRun"));
        assert_eq!(operation.metadata.api_version, "2.1.0");
        assert_eq!(operation.metadata.host.as_deref(), Some("https://eu.api.test"));
        assert_eq!(operation.fields.get("id").and_then(PropertyValue::as_i64), Some(7));
        assert_eq!(
            operation.fields.get("Account.Tags[0]").and_then(PropertyValue::as_str),
            Some("vip")
        );
    }

    #[test]
    fn test_flags_override_body_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "name: from-file\ncolor: red").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let args = operation_args(&[
            "preview",
            "/widgets",
            "-a",
            "create",
            "--body-file",
            &path,
            "-f",
            "name=from-flag",
        ]);

        let operation = build_operation(&args).unwrap();
        assert_eq!(operation.fields.get("name").and_then(PropertyValue::as_str), Some("from-flag"));
        assert_eq!(operation.fields.get("color").and_then(PropertyValue::as_str), Some("red"));
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "42").unwrap();

        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_query_fields_need_a_body_action() {
        let args = operation_args(&["call", "/widgets", "-a", "list", "--query-field", "max"]);
        let err = build_operation(&args).err().unwrap();
        assert!(err.should_show_help());
    }

    #[test]
    fn test_bad_key_path_is_reported() {
        let args = operation_args(&["call", "/widgets", "-a", "create", "-f", "a..b=1"]);
        let err = build_operation(&args).err().unwrap();
        assert!(matches!(err, Error::Core(restmap_core::Error::InvalidKeyPath { .. })));
    }
}
