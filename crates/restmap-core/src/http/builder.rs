//! HTTP request builder
//!
//! Partitions request fields between the URL path, the query string, the
//! headers and the JSON body according to the operation's action, then hands
//! the draft to the configured signer.

use crate::error::{Error, Result};
use crate::http::{HttpExchange, RequestSigner};
use crate::operation::{OperationConfig, OperationMetadata};
use crate::property_map::PropertyMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};
use url::Url;

/// Characters escaped when a field value is substituted into a path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();

fn placeholder_pattern() -> Result<&'static Regex> {
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{([^{}/]+)\}").ok())
        .as_ref()
        .ok_or_else(|| Error::HttpRequest {
            message: "Invalid placeholder pattern".to_string(),
            source: None,
        })
}

/// Builder for signed requests against one base URL
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: String,
    signer: Arc<dyn RequestSigner>,
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    pub fn new(base_url: impl Into<String>, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            base_url: base_url.into(),
            signer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the draft exchange and pass it through the signer
    pub fn build_request(
        &self,
        operation: &OperationConfig,
        metadata: &OperationMetadata,
        fields: PropertyMap,
    ) -> Result<HttpExchange> {
        let draft = self.draft_request(operation, metadata, fields)?;
        let url = draft.url.clone();
        self.signer.sign(&url, draft)
    }

    /// Build the exchange without signing it
    pub fn draft_request(
        &self,
        operation: &OperationConfig,
        metadata: &OperationMetadata,
        mut fields: PropertyMap,
    ) -> Result<HttpExchange> {
        // Header fields leave the map before the URL sees it
        let header_fields = take_header_fields(operation, &mut fields)?;

        let url = self.build_url(operation, metadata, &mut fields)?;
        let mut exchange = HttpExchange::new(operation.action.method(), url);

        if operation.action.sends_body() {
            exchange.body = serde_json::to_vec(fields.properties())?;
        }

        exchange.set_header("Accept", "application/json")?;
        exchange.set_header("Content-Type", "application/json")?;
        exchange.set_header("User-Agent", &format!("Rust-SDK/{}", metadata.api_version))?;
        for (name, value) in &header_fields {
            exchange.set_header(name, value)?;
        }

        Ok(exchange)
    }

    /// Resolve the full URL for an operation.
    ///
    /// Fields consumed by path placeholders are removed from `fields`, as are
    /// declared query fields of body-carrying actions. Bodiless actions put
    /// every remaining scalar field in the query string and leave `fields`
    /// otherwise untouched.
    pub fn build_url(
        &self,
        operation: &OperationConfig,
        metadata: &OperationMetadata,
        fields: &mut PropertyMap,
    ) -> Result<Url> {
        let host = metadata.host.as_deref().unwrap_or(&self.base_url);
        let path = resolve_path(&operation.resource_path, fields)?;
        let raw = format!("{}{}", host.trim_end_matches('/'), path);

        let mut url = Url::parse(&raw).map_err(|e| Error::HttpRequest {
            message: format!("Invalid request URL: {}", raw),
            source: Some(Box::new(e)),
        })?;

        let query = take_query_fields(operation, fields);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("Format", "JSON");
        }

        Ok(url)
    }
}

/// Substitute `{name}` placeholders, consuming the matching fields
fn resolve_path(template: &str, fields: &mut PropertyMap) -> Result<String> {
    let re = placeholder_pattern()?;

    let template = template.trim_end_matches('/');
    let mut resolved = String::with_capacity(template.len());
    let mut last = 0;

    for cap in re.captures_iter(template) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let name = name.as_str();

        let value = fields
            .remove(name)
            .ok_or_else(|| Error::MissingPathParameter {
                name: name.to_string(),
                resource_path: template.to_string(),
            })?;
        let text = value.to_text().ok_or_else(|| Error::Validation {
            field: name.to_string(),
            message: "path parameters must be scalar values".to_string(),
            expected: Some("a string, number or boolean".to_string()),
        })?;
        // The URL parser would collapse these as dot segments
        if text == "." || text == ".." {
            return Err(Error::Validation {
                field: name.to_string(),
                message: format!("'{}' is not a valid path parameter", text),
                expected: Some("a value other than '.' or '..'".to_string()),
            });
        }

        resolved.push_str(&template[last..whole.start()]);
        resolved.extend(utf8_percent_encode(&text, PATH_SEGMENT));
        last = whole.end();
    }
    resolved.push_str(&template[last..]);

    if !resolved.is_empty() && !resolved.starts_with('/') {
        resolved.insert(0, '/');
    }
    Ok(resolved)
}

fn take_header_fields(
    operation: &OperationConfig,
    fields: &mut PropertyMap,
) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::new();
    for name in &operation.header_params {
        let Some(value) = fields.remove(name) else {
            continue;
        };
        let text = value.to_text().ok_or_else(|| Error::Validation {
            field: name.clone(),
            message: "header parameters must be scalar values".to_string(),
            expected: Some("a string, number or boolean".to_string()),
        })?;
        headers.push((name.clone(), text));
    }
    Ok(headers)
}

fn take_query_fields(operation: &OperationConfig, fields: &mut PropertyMap) -> Vec<(String, String)> {
    if !operation.action.sends_body() {
        return fields
            .iter()
            .filter_map(|(key, value)| value.to_text().map(|text| (key.clone(), text)))
            .collect();
    }

    let declared: Vec<String> = fields
        .iter()
        .map(|(key, _)| key)
        .filter(|key| operation.query_params.contains(*key))
        .cloned()
        .collect();

    declared
        .into_iter()
        .filter_map(|key| {
            let value = fields.remove(&key)?;
            value.to_text().map(|text| (key, text))
        })
        .collect()
}
