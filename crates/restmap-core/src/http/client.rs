//! Dispatcher
//!
//! [`ApiController`] builds and signs the request for an operation, sends
//! it, and turns the response into a [`PropertyMap`] or a classified error.
//! Each call performs exactly one exchange: no retries, and the full body is
//! read before the status is interpreted.

use crate::config::ApiConfig;
use crate::error::{Error, ErrorDetails, Result};
use crate::http::classify::{into_error, transport_error};
use crate::http::exchange::redact_headers;
use crate::http::{HttpExchange, RequestBuilder};
use crate::operation::{OperationConfig, OperationMetadata};
use crate::property_map::{PropertyMap, PropertyValue};
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, StatusCode};
use tracing::{debug, info, warn, Level};

/// Status codes below this decode as success
const HTTP_AMBIGUOUS: u16 = 300;

/// Sends operations to the API described by an [`ApiConfig`]
#[derive(Debug, Clone)]
pub struct ApiController {
    config: ApiConfig,
    builder: RequestBuilder,
    client: ReqwestClient,
}

impl ApiController {
    /// Validate the configuration and create the HTTP client.
    ///
    /// Fails with a configuration error when no signer is set or a base URL
    /// is malformed.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;
        let signer = config
            .signer
            .clone()
            .ok_or_else(|| Error::configuration("No request signer configured"))?;

        let client = ReqwestClient::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::HttpRequest {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        info!(
            environment = %config.environment,
            base_url = %config.base_url(),
            debug = config.debug,
            "API controller ready"
        );

        Ok(Self {
            builder: RequestBuilder::new(config.base_url(), signer),
            config,
            client,
        })
    }

    /// Replace the underlying HTTP client
    pub fn with_client(mut self, client: ReqwestClient) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Build and sign the request without sending it
    pub fn prepare(
        &self,
        operation: &OperationConfig,
        metadata: &OperationMetadata,
        fields: PropertyMap,
    ) -> Result<HttpExchange> {
        self.builder.build_request(operation, metadata, fields)
    }

    /// Execute one operation
    pub async fn execute(
        &self,
        operation: &OperationConfig,
        metadata: &OperationMetadata,
        fields: PropertyMap,
    ) -> Result<PropertyMap> {
        let exchange = self.prepare(operation, metadata, fields)?;
        let debug_enabled = self.config.debug;

        if debug_enabled {
            log_request(&exchange, Level::DEBUG);
        }

        let request = exchange.clone().into_request(self.config.timeout);
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                if !debug_enabled {
                    log_request(&exchange, Level::WARN);
                }
                warn!(error = %e, "<< no response");
                return Err(transport_error(e));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let content = match response.text().await {
            Ok(content) => content,
            Err(e) => {
                if !debug_enabled {
                    log_request(&exchange, Level::WARN);
                }
                warn!(status = status.as_u16(), error = %e, "<< unreadable response");
                return Err(transport_error(e));
            }
        };

        if status.as_u16() < HTTP_AMBIGUOUS {
            if debug_enabled {
                log_response(status, &headers, &content, Level::DEBUG);
            }
            return decode_success(status, &content);
        }

        // Failed exchanges are always logged, once
        if !debug_enabled {
            log_request(&exchange, Level::WARN);
        }
        log_response(status, &headers, &content, Level::WARN);

        Err(into_error(status.as_u16(), decode_error_body(&content)))
    }

    /// Execute on an internal current-thread runtime
    ///
    /// Fails with [`Error::HttpRequest`] when called from inside a Tokio
    /// runtime; async callers use [`ApiController::execute`].
    #[cfg(feature = "blocking")]
    pub fn execute_blocking(
        &self,
        operation: &OperationConfig,
        metadata: &OperationMetadata,
        fields: PropertyMap,
    ) -> Result<PropertyMap> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::HttpRequest {
                message: "execute_blocking cannot run inside an async runtime; use execute"
                    .to_string(),
                source: None,
            });
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::HttpRequest {
                message: format!("Failed to start runtime: {}", e),
                source: Some(Box::new(e)),
            })?;
        runtime.block_on(self.execute(operation, metadata, fields))
    }
}

fn decode_success(status: StatusCode, content: &str) -> Result<PropertyMap> {
    let mut map = PropertyMap::new();
    if content.trim().is_empty() {
        return Ok(map);
    }

    let value: PropertyValue = serde_json::from_str(content).map_err(|e| Error::System {
        details: ErrorDetails::new(format!("Unable to decode response body: {}", e))
            .with_status(status.as_u16()),
        source: Some(Box::new(e)),
    })?;

    if value.is_scalar() {
        return Err(Error::System {
            details: ErrorDetails::new("Unexpected response body: expected a JSON object or array")
                .with_status(status.as_u16()),
            source: None,
        });
    }

    map.set_all(value)?;
    Ok(map)
}

/// Error bodies that are not JSON objects or arrays are dropped
fn decode_error_body(content: &str) -> Option<PropertyMap> {
    let value: PropertyValue = serde_json::from_str(content).ok()?;
    if value.is_scalar() {
        return None;
    }
    let mut map = PropertyMap::new();
    map.set_all(value).ok()?;
    Some(map)
}

fn log_request(exchange: &HttpExchange, level: Level) {
    let headers = exchange.redacted_headers();
    let body = exchange.body_text();
    if level == Level::DEBUG {
        debug!(method = %exchange.method, url = %exchange.url, ?headers, %body, ">> request");
    } else {
        warn!(method = %exchange.method, url = %exchange.url, ?headers, %body, ">> request");
    }
}

fn log_response(status: StatusCode, headers: &HeaderMap, body: &str, level: Level) {
    let headers = redact_headers(headers);
    let status = status.as_u16();
    if level == Level::DEBUG {
        debug!(status, ?headers, %body, "<< response");
    } else {
        warn!(status, ?headers, %body, "<< response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::BearerSigner;
    use crate::operation::Action;
    use std::sync::Arc;
    use tracing_test::traced_test;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller(server: &MockServer, debug: bool) -> ApiController {
        let mut config = ApiConfig::default()
            .with_signer(Arc::new(BearerSigner::new("secret-token")))
            .with_debug(debug);
        config.set_custom_hosts(Some(&server.uri()), Some(&server.uri()));
        ApiController::new(config).unwrap()
    }

    fn read_widget() -> (OperationConfig, OperationMetadata, PropertyMap) {
        let mut fields = PropertyMap::new();
        fields.set("id", "42").unwrap();
        (
            OperationConfig::new("/widgets/{id}", Action::Read),
            OperationMetadata::new("1.0.0"),
            fields,
        )
    }

    #[test]
    fn test_new_requires_signer() {
        let err = ApiController::new(ApiConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_decode_success() {
        assert!(decode_success(StatusCode::NO_CONTENT, "").unwrap().is_empty());
        assert!(decode_success(StatusCode::OK, "  \n").unwrap().is_empty());

        let map = decode_success(StatusCode::OK, r#"{"a":{"b":1}}"#).unwrap();
        assert_eq!(map.get("a.b").and_then(PropertyValue::as_i64), Some(1));

        assert!(matches!(decode_success(StatusCode::OK, "42"), Err(Error::System { .. })));
        assert!(matches!(decode_success(StatusCode::OK, "{oops"), Err(Error::System { .. })));
    }

    #[test]
    fn test_decode_success_keeps_unaddressable_keys() {
        let map = decode_success(StatusCode::OK, r#"{"items[3]": 1, "id": "w1"}"#).unwrap();
        assert_eq!(map.size(), 2);
        assert!(map.get("items").is_none());
        assert_eq!(map.get("id").and_then(PropertyValue::as_str), Some("w1"));
        assert!(map.iter().any(|(key, _)| key == "items[3]"));
    }

    #[test]
    fn test_decode_error_body() {
        assert!(decode_error_body("").is_none());
        assert!(decode_error_body("<html>").is_none());
        assert!(decode_error_body(r#"{"Errors":{}}"#).is_some());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_success_is_silent_without_debug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/widgets/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"42"}"#))
            .mount(&server)
            .await;

        let (op, meta, fields) = read_widget();
        controller(&server, false).execute(&op, &meta, fields).await.unwrap();

        assert!(!logs_contain(">> request"));
        assert!(!logs_contain("<< response"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failure_logs_exchange_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/widgets/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (op, meta, fields) = read_widget();
        let err = controller(&server, false)
            .execute(&op, &meta, fields)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ObjectNotFound);

        logs_assert(|lines: &[&str]| {
            let requests = lines.iter().filter(|l| l.contains(">> request")).count();
            let responses = lines.iter().filter(|l| l.contains("<< response")).count();
            if requests == 1 && responses == 1 {
                Ok(())
            } else {
                Err(format!("expected one request and one response line, got {} and {}", requests, responses))
            }
        });
        assert!(logs_contain("WARN"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_debug_failure_does_not_repeat_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/widgets/42"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (op, meta, fields) = read_widget();
        let _ = controller(&server, true).execute(&op, &meta, fields).await;

        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains(">> request")).count() {
                1 => Ok(()),
                n => Err(format!("request logged {} times", n)),
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_logged_headers_are_redacted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (op, meta, fields) = read_widget();
        controller(&server, true).execute(&op, &meta, fields).await.unwrap();

        assert!(logs_contain(">> request"));
        assert!(logs_contain("[REDACTED]"));
        assert!(!logs_contain("secret-token"));
    }

    fn controller_for_host(uri: &str) -> ApiController {
        let mut config = ApiConfig::default().with_signer(Arc::new(BearerSigner::new("t")));
        config.set_custom_hosts(Some(uri), Some(uri));
        ApiController::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_transport_failure_is_system_error() {
        // Reserve a port, then release it so nothing is listening
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let controller = controller_for_host(&format!("http://127.0.0.1:{}", port));

        let (op, meta, fields) = read_widget();
        let err = controller.execute(&op, &meta, fields).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SystemError);
        assert!(err.status().is_none());
        assert!(err.describe().starts_with("An unexpected error has been raised"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_truncated_body_is_logged() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"id\"";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let controller = controller_for_host(&uri);
        let (op, meta, fields) = read_widget();
        let err = controller.execute(&op, &meta, fields).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SystemError);
        assert!(logs_contain(">> request"));
        assert!(logs_contain("<< unreadable response"));
    }
}
