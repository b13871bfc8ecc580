//! HTTP dispatch for declarative operations
//!
//! This module provides:
//! - The drafted exchange passed between the stages
//! - Request building from operation descriptors and a property map
//! - Pluggable request signing
//! - Error classification of non-success responses
//! - The dispatcher that ties them together

pub mod builder;
pub mod classify;
pub mod client;
pub mod exchange;
pub mod signer;

pub use builder::RequestBuilder;
pub use classify::classify;
pub use client::ApiController;
pub use exchange::{is_sensitive_header, HttpExchange};
pub use signer::{expand_env_vars, BearerSigner, HeaderSigner, RequestSigner};

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};
