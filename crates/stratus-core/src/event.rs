//! Gateway event model.
//!
//! [`GatewayRequest`] and [`GatewayResponse`] mirror the JSON documents an
//! API gateway exchanges with a proxied function. Field names serialize in
//! camelCase so events can be decoded straight from the wire.
//!
//! Gateways send `null` for absent maps and bodies; those decode to empty
//! values rather than failing.

use std::borrow::Cow;
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StratusError;

/// Decodes `null` (or a missing field) as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Case-insensitive lookup in a header map.
fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Metadata the gateway attaches to each invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestMetadata {
    /// Gateway-assigned request identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub request_id: String,
}

/// An inbound gateway event.
///
/// # Example
///
/// ```
/// use stratus_core::GatewayRequest;
///
/// let request = GatewayRequest::new("GET", "/books/7")
///     .with_header("Authorization", "Bearer abc")
///     .with_query("userId", "u-1");
///
/// assert_eq!(request.header("authorization"), Some("Bearer abc"));
/// assert_eq!(request.query_string_parameters["userId"], "u-1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayRequest {
    /// HTTP method, e.g. `GET`.
    #[serde(deserialize_with = "null_as_default")]
    pub http_method: String,

    /// Raw request path, without the query string.
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,

    /// Headers that carried exactly one value.
    #[serde(deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,

    /// Every header with all of its values.
    #[serde(deserialize_with = "null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,

    /// Query parameters that carried exactly one value.
    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,

    /// Every query parameter with all of its values.
    #[serde(deserialize_with = "null_as_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,

    /// Parameters captured from the path template.
    #[serde(deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,

    /// Request body, base64 encoded when `is_base64_encoded` is set.
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,

    /// Whether `body` is base64 encoded.
    #[serde(deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,

    /// Invocation metadata.
    #[serde(deserialize_with = "null_as_default")]
    pub request_context: RequestMetadata,
}

impl GatewayRequest {
    /// Creates an event with a method and path and nothing else.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a single-value header (also recorded in the multi-value map).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        self.multi_value_headers
            .entry(name.clone())
            .or_default()
            .push(value.clone());
        self.headers.insert(name, value);
        self
    }

    /// Adds a single-value query parameter (also recorded in the multi-value map).
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        self.multi_value_query_string_parameters
            .entry(name.clone())
            .or_default()
            .push(value.clone());
        self.query_string_parameters.insert(name, value);
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    /// Sets a textual body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_base64_encoded = false;
        self
    }

    /// Sets the gateway request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_context.request_id = request_id.into();
        self
    }

    /// Looks a header up by name, ignoring case.
    ///
    /// Falls back to the first value in the multi-value map.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name).or_else(|| {
            self.multi_value_headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .and_then(|(_, values)| values.first())
                .map(String::as_str)
        })
    }

    /// Returns the raw body bytes, decoding base64 when flagged.
    pub fn body_bytes(&self) -> Result<Cow<'_, [u8]>, StratusError> {
        if self.is_base64_encoded {
            STANDARD
                .decode(&self.body)
                .map(Cow::Owned)
                .map_err(|e| StratusError::bad_request(format!("invalid base64 body: {e}")))
        } else {
            Ok(Cow::Borrowed(self.body.as_bytes()))
        }
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, StratusError> {
        let bytes = self.body_bytes()?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StratusError::bad_request(format!("invalid JSON body: {e}")))
    }
}

/// An outbound gateway response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status_code: u16,

    /// Single-value response headers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,

    /// Multi-value response headers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,

    /// Response body, base64 encoded when `is_base64_encoded` is set.
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,

    /// Whether `body` is base64 encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    /// Creates a response with a status and textual body.
    #[must_use]
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            ..Self::default()
        }
    }

    /// Looks a single-value header up by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Sets a header, replacing any existing entry whose name differs only
    /// in case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}
