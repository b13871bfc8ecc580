//! Shared test support utilities for integration tests

#![allow(dead_code)]

use restmap_core::resource::unknown_operation;
use restmap_core::{
    Action, ApiConfig, ApiController, HeaderSigner, OperationConfig, OperationMetadata,
    PropertyMap, Resource, Result,
};
use serde_json::Value;
use std::sync::Arc;
use wiremock::MockServer;

/// The mock CRUD resource used across the dispatch tests
pub struct Post {
    host: String,
}

impl Post {
    pub fn at(server: &MockServer) -> Self {
        Self { host: server.uri() }
    }
}

impl Resource for Post {
    fn operation_config(&self, operation_id: &str) -> Result<OperationConfig> {
        match operation_id {
            "list" => Ok(OperationConfig::new("/mock_crud_server/posts", Action::List)),
            "create" => Ok(OperationConfig::new("/mock_crud_server/posts", Action::Create)),
            "read" => Ok(OperationConfig::new("/mock_crud_server/posts/{id}", Action::Read)),
            "delete" => Ok(OperationConfig::new("/mock_crud_server/posts/{id}", Action::Delete)),
            "update" => Ok(OperationConfig::new("/mock_crud_server/posts/{id}", Action::Update)),
            other => Err(unknown_operation(other)),
        }
    }

    fn operation_metadata(&self) -> OperationMetadata {
        OperationMetadata::new("1.0.0").with_host(self.host.clone())
    }
}

/// Configuration with a static header signer pointed at the mock server
pub fn config_for(server: &MockServer) -> ApiConfig {
    let signer = HeaderSigner::default().with_header("X-Test-Auth", "signed");
    let mut config = ApiConfig::default().with_signer(Arc::new(signer));
    config.set_custom_hosts(Some(&server.uri()), Some(&server.uri()));
    config
}

pub fn controller_for(server: &MockServer) -> ApiController {
    match ApiController::new(config_for(server)) {
        Ok(controller) => controller,
        Err(e) => panic!("test configuration should be valid: {}", e),
    }
}

/// Build a property map from a JSON literal
pub fn fields(value: Value) -> PropertyMap {
    let mut map = PropertyMap::new();
    if let Err(e) = map.set_all(value) {
        panic!("fixture should import: {}", e);
    }
    map
}

/// A post as the mock server returns it
pub fn post_json(id: u64, title: &str) -> Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "body": "some body text",
        "userId": 1
    })
}
