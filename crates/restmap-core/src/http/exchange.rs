//! The drafted HTTP exchange passed between builder, signer and dispatcher

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::time::Duration;
use url::Url;

const REDACTED: &str = "[REDACTED]";

/// Method, URL, headers and body of one outgoing request
#[derive(Debug, Clone)]
pub struct HttpExchange {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// JSON body, empty for bodiless actions
    pub body: Vec<u8>,
}

impl HttpExchange {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set a header, replacing any previous value under the same name
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::HttpRequest {
            message: format!("Invalid header name: {}", name),
            source: Some(Box::new(e)),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| Error::HttpRequest {
            message: format!("Invalid value for header {}", name),
            source: Some(Box::new(e)),
        })?;

        self.headers.insert(header_name, header_value);
        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Headers as `name: value` pairs with sensitive values masked
    pub fn redacted_headers(&self) -> Vec<(String, String)> {
        redact_headers(&self.headers)
    }

    pub(crate) fn into_request(self, timeout: Option<Duration>) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        if !self.body.is_empty() {
            *request.body_mut() = Some(self.body.into());
        }
        *request.timeout_mut() = timeout;
        request
    }
}

/// Whether a header's value must be kept out of logs
pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    matches!(name.as_str(), "authorization" | "proxy-authorization" | "cookie" | "set-cookie")
        || ["key", "token", "secret", "signature"]
            .iter()
            .any(|marker| name.contains(marker))
}

pub(crate) fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive_header(name.as_str()) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}
