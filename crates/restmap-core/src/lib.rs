//! Restmap Core - declarative REST SDK engine
//!
//! This crate turns declarative resource descriptions into signed HTTP
//! exchanges and maps the outcome back into a typed result.
//!
//! # Main Components
//!
//! - **Property Map**: nested store addressed by key paths such as
//!   `"Account.Listed"` or `"list[2].field"`, used for every request and response
//! - **Operations**: immutable descriptors of a resource path, an action and
//!   the declared header/query fields
//! - **Configuration**: explicit [`ApiConfig`] with environment selection,
//!   host overrides and the request signer
//! - **Dispatch**: [`RequestBuilder`] partitions fields into path, query,
//!   headers and body; [`ApiController`] sends the exchange and classifies
//!   failures into [`ErrorKind`]s
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use restmap_core::{
//!     Action, ApiConfig, ApiController, BearerSigner, OperationConfig, OperationMetadata,
//!     PropertyMap, Result,
//! };
//!
//! async fn example() -> Result<()> {
//!     let config = ApiConfig::default().with_signer(Arc::new(BearerSigner::new("token")));
//!     let controller = ApiController::new(config)?;
//!
//!     let operation = OperationConfig::new("/widgets/{id}", Action::Read);
//!     let metadata = OperationMetadata::new("1.0.0");
//!
//!     let mut fields = PropertyMap::new();
//!     fields.set("id", "42")?;
//!
//!     let widget = controller.execute(&operation, &metadata, fields).await?;
//!     println!("{}", widget);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod operation;
pub mod property_map;
pub mod resource;

// Re-export main types for convenience
pub use config::{ApiConfig, Environment, DEFAULT_LIVE_URL, DEFAULT_SANDBOX_URL, LOCALHOST_URL};
pub use error::{Error, ErrorDetails, ErrorKind, FieldError, Result};
pub use http::{
    classify, ApiController, BearerSigner, HeaderSigner, HttpExchange, RequestBuilder,
    RequestSigner,
};
pub use operation::{Action, OperationConfig, OperationMetadata};
pub use property_map::{KeyPath, Properties, PropertyMap, PropertyValue};
pub use resource::{Resource, ResourceClient, ResourceDefinition};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
