//! Resource descriptions and the typed helpers on top of them
//!
//! A [`Resource`] is pure configuration: it maps operation ids such as
//! `"list"` or `"read"` to an [`OperationConfig`] and supplies the
//! [`OperationMetadata`] shared by all of its operations.
//! [`ResourceClient`] pairs a resource with an [`ApiController`] and offers
//! the usual CRUD entry points.

use crate::error::{Error, Result};
use crate::http::ApiController;
use crate::operation::{Action, OperationConfig, OperationMetadata};
use crate::property_map::{PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative description of one API resource
pub trait Resource {
    /// Descriptor for an operation id
    fn operation_config(&self, operation_id: &str) -> Result<OperationConfig>;

    fn operation_metadata(&self) -> OperationMetadata;
}

/// Error for an operation id the resource does not declare
pub fn unknown_operation(operation_id: &str) -> Error {
    Error::Validation {
        field: "operation_id".to_string(),
        message: format!("Invalid operation id supplied: {}", operation_id),
        expected: None,
    }
}

/// Table-driven resource, loadable from JSON or YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub metadata: OperationMetadata,
    pub operations: BTreeMap<String, OperationConfig>,
}

impl ResourceDefinition {
    pub fn new(metadata: OperationMetadata) -> Self {
        Self {
            metadata,
            operations: BTreeMap::new(),
        }
    }

    /// Register an operation under its action name
    pub fn with_operation(mut self, operation: OperationConfig) -> Self {
        self.operations
            .insert(operation.action.to_string(), operation);
        self
    }

    /// Register an operation under an explicit id
    pub fn with_named_operation(mut self, id: impl Into<String>, operation: OperationConfig) -> Self {
        self.operations.insert(id.into(), operation);
        self
    }
}

impl Resource for ResourceDefinition {
    fn operation_config(&self, operation_id: &str) -> Result<OperationConfig> {
        self.operations
            .get(operation_id)
            .cloned()
            .ok_or_else(|| unknown_operation(operation_id))
    }

    fn operation_metadata(&self) -> OperationMetadata {
        self.metadata.clone()
    }
}

/// CRUD helpers for one resource
pub struct ResourceClient<'a, R: Resource> {
    controller: &'a ApiController,
    resource: R,
}

impl<'a, R: Resource> ResourceClient<'a, R> {
    pub fn new(controller: &'a ApiController, resource: R) -> Self {
        Self {
            controller,
            resource,
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Execute the operation registered under `operation_id`
    pub async fn execute(&self, operation_id: &str, fields: PropertyMap) -> Result<PropertyMap> {
        let operation = self.resource.operation_config(operation_id)?;
        let metadata = self.resource.operation_metadata();
        self.controller.execute(&operation, &metadata, fields).await
    }

    pub async fn list(&self, criteria: Option<PropertyMap>) -> Result<PropertyMap> {
        self.execute(Action::List.as_str(), criteria.unwrap_or_default())
            .await
    }

    pub async fn query(&self, criteria: Option<PropertyMap>) -> Result<PropertyMap> {
        self.execute(Action::Query.as_str(), criteria.unwrap_or_default())
            .await
    }

    pub async fn create(&self, map: PropertyMap) -> Result<PropertyMap> {
        self.execute(Action::Create.as_str(), map).await
    }

    /// Read by id; `criteria` is merged in after the id
    pub async fn read(
        &self,
        id: impl Into<PropertyValue>,
        criteria: Option<PropertyMap>,
    ) -> Result<PropertyMap> {
        let mut fields = PropertyMap::new();
        fields.set("id", id)?;
        if let Some(criteria) = criteria {
            fields.set_all(criteria)?;
        }
        self.execute(Action::Read.as_str(), fields).await
    }

    pub async fn update(&self, map: PropertyMap) -> Result<PropertyMap> {
        self.execute(Action::Update.as_str(), map).await
    }

    pub async fn delete_by_id(&self, id: impl Into<PropertyValue>) -> Result<PropertyMap> {
        let mut fields = PropertyMap::new();
        fields.set("id", id)?;
        self.execute(Action::Delete.as_str(), fields).await
    }

    pub async fn delete(&self, map: PropertyMap) -> Result<PropertyMap> {
        self.execute(Action::Delete.as_str(), map).await
    }
}
