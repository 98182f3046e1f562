//! Response building.
//!
//! Every response a handler or middleware produces goes through a
//! [`Responder`], which owns the process-wide response settings: CORS
//! headers and whether 5xx messages reach the client. The settings are an
//! immutable [`ResponseConfig`] shared behind an `Arc`; to vary them (in
//! tests, say) build another `Responder`.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use stratus_core::{HttpError, Responder, ResponseConfig};
//!
//! let responder = Responder::new(ResponseConfig::default().with_expose_server_errors(false));
//!
//! let ok = responder.success(&serde_json::json!({"title": "Dune"}));
//! assert_eq!(ok.status_code, 200);
//!
//! let err = responder.error(HttpError::internal("database down"));
//! assert_eq!(err.body, r#"{"status":500,"message":"Internal Server Error"}"#);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::StatusCode;
use serde::Serialize;

use crate::error::{HttpError, StratusError, GENERIC_SERVER_MESSAGE};
use crate::event::GatewayResponse;

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Content type of every JSON response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
/// CORS allowed-headers response header.
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
/// CORS allowed-methods response header.
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
/// CORS allowed-origin response header.
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// CORS values stamped on every response.
///
/// Each value is independent; an unset or empty value leaves its header
/// alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
    /// Value for `Access-Control-Allow-Headers`.
    pub allow_headers: Option<String>,
    /// Value for `Access-Control-Allow-Methods`.
    pub allow_methods: Option<String>,
    /// Value for `Access-Control-Allow-Origin`.
    pub allow_origin: Option<String>,
}

impl CorsConfig {
    /// Sets all three values to `*`.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_headers: Some("*".to_string()),
            allow_methods: Some("*".to_string()),
            allow_origin: Some("*".to_string()),
        }
    }

    /// Header name/value pairs to apply, skipping unset and empty values.
    pub fn headers(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (ALLOW_HEADERS, self.allow_headers.as_deref()),
            (ALLOW_METHODS, self.allow_methods.as_deref()),
            (ALLOW_ORIGIN, self.allow_origin.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
    }
}

/// Immutable response settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseConfig {
    /// CORS values.
    pub cors: CorsConfig,
    /// Whether 5xx messages are sent verbatim. When false they are replaced
    /// with the status's reason phrase.
    pub expose_server_errors: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            cors: CorsConfig::default(),
            expose_server_errors: true,
        }
    }
}

impl ResponseConfig {
    /// Replaces the CORS values.
    #[must_use]
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    /// Sets whether 5xx messages are exposed.
    #[must_use]
    pub fn with_expose_server_errors(mut self, expose: bool) -> Self {
        self.expose_server_errors = expose;
        self
    }
}

/// Builds gateway responses.
///
/// Cloning is cheap; clones share the same configuration.
#[derive(Debug, Clone, Default)]
pub struct Responder {
    config: Arc<ResponseConfig>,
}

impl Responder {
    /// Creates a responder owning `config`.
    #[must_use]
    pub fn new(config: ResponseConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a responder sharing an existing configuration.
    #[must_use]
    pub fn from_shared(config: Arc<ResponseConfig>) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Serializes `value` as the JSON body of a `status` response.
    ///
    /// If serialization fails the response becomes a 500 with the generic
    /// server message, whatever `status` and `expose_server_errors` say.
    pub fn custom<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        headers: Option<HashMap<String, String>>,
        value: &T,
    ) -> GatewayResponse {
        let mut response = GatewayResponse::default();
        for (name, header_value) in headers.unwrap_or_default() {
            response.set_header(name, header_value);
        }

        match serde_json::to_string(value) {
            Ok(body) => {
                response.status_code = status.as_u16();
                response.body = body;
            }
            Err(source) => {
                let err = StratusError::Serialization { source };
                tracing::error!(error = ?err, "failed to serialize response body");
                response.status_code = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
                response.body = generic_failure_body();
            }
        }

        response.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        self.finish(response)
    }

    /// A 200 with `value` as JSON.
    pub fn success<T: Serialize + ?Sized>(&self, value: &T) -> GatewayResponse {
        self.custom(StatusCode::OK, None, value)
    }

    /// A 200 with an empty JSON object.
    pub fn empty(&self) -> GatewayResponse {
        self.custom(StatusCode::OK, None, &serde_json::Map::new())
    }

    /// Converts any error into an error response.
    ///
    /// The error chain is searched for an [`HttpError`] or a
    /// [`StratusError`]; if neither is found the error becomes a 500 with its
    /// display text as the message.
    pub fn error(&self, err: impl Into<anyhow::Error>) -> GatewayResponse {
        let err = err.into();
        let http_error = resolve_http_error(&err);
        self.http_error(&http_error)
    }

    /// Converts an error into a response with a forced status.
    pub fn status_and_error(
        &self,
        status: StatusCode,
        err: impl Into<anyhow::Error>,
    ) -> GatewayResponse {
        let err = err.into();
        let message = resolve_http_error(&err).message().to_string();
        self.http_error(&HttpError::new(status, message))
    }

    /// Renders an [`HttpError`], applying 5xx redaction.
    pub fn http_error(&self, err: &HttpError) -> GatewayResponse {
        if err.status().is_server_error() && !self.config.expose_server_errors {
            let redacted = err.redacted();
            return self.custom(redacted.status(), None, &redacted);
        }
        self.custom(err.status(), None, err)
    }

    /// A 200 carrying `bytes` as text with an explicit content type.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn file(
        &self,
        content_type: &str,
        headers: Option<HashMap<String, String>>,
        bytes: &[u8],
    ) -> GatewayResponse {
        let body = String::from_utf8_lossy(bytes).into_owned();
        self.raw(content_type, headers, body, false)
    }

    /// A 200 carrying `bytes` base64 encoded, flagged for the gateway to
    /// decode.
    pub fn file_b64(
        &self,
        content_type: &str,
        headers: Option<HashMap<String, String>>,
        bytes: &[u8],
    ) -> GatewayResponse {
        self.raw(content_type, headers, STANDARD.encode(bytes), true)
    }

    fn raw(
        &self,
        content_type: &str,
        headers: Option<HashMap<String, String>>,
        body: String,
        is_base64_encoded: bool,
    ) -> GatewayResponse {
        let mut response = GatewayResponse::new(StatusCode::OK.as_u16(), body);
        response.is_base64_encoded = is_base64_encoded;
        for (name, value) in headers.unwrap_or_default() {
            response.set_header(name, value);
        }
        response.set_header(CONTENT_TYPE, content_type);
        self.finish(response)
    }

    /// Stamps CORS headers, overwriting existing values.
    fn finish(&self, mut response: GatewayResponse) -> GatewayResponse {
        for (name, value) in self.config.cors.headers() {
            response.set_header(name, value);
        }
        response
    }
}

fn generic_failure_body() -> String {
    format!(
        r#"{{"status":{},"message":"{}"}}"#,
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        GENERIC_SERVER_MESSAGE
    )
}

fn resolve_http_error(err: &anyhow::Error) -> HttpError {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<HttpError>()
                .cloned()
                .or_else(|| cause.downcast_ref::<StratusError>().map(StratusError::to_http_error))
        })
        .unwrap_or_else(|| HttpError::internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Serializer;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refuses to serialize"))
        }
    }

    fn cors_responder(expose: bool) -> Responder {
        Responder::new(
            ResponseConfig::default()
                .with_cors(CorsConfig::permissive())
                .with_expose_server_errors(expose),
        )
    }

    fn assert_cors(response: &GatewayResponse) {
        assert_eq!(response.header(ALLOW_HEADERS), Some("*"));
        assert_eq!(response.header(ALLOW_METHODS), Some("*"));
        assert_eq!(response.header(ALLOW_ORIGIN), Some("*"));
    }

    #[test]
    fn test_custom_sets_json_content_type() {
        let responder = Responder::default();
        let mut headers = HashMap::new();
        headers.insert("X-Total".to_string(), "3".to_string());
        headers.insert("content-type".to_string(), "text/plain".to_string());

        let response = responder.custom(StatusCode::CREATED, Some(headers), &vec![1, 2, 3]);
        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, "[1,2,3]");
        assert_eq!(response.header("x-total"), Some("3"));
        assert_eq!(response.header(CONTENT_TYPE), Some(JSON_CONTENT_TYPE));
        assert!(!response.is_base64_encoded);
    }

    #[test]
    fn test_serialization_failure_is_generic_500() {
        for expose in [true, false] {
            let response = cors_responder(expose).custom(StatusCode::CREATED, None, &Unserializable);
            assert_eq!(response.status_code, 500);
            assert_eq!(
                response.body,
                r#"{"status":500,"message":"the server has encountered an unexpected error"}"#
            );
            assert_cors(&response);
        }
    }

    #[test]
    fn test_empty_is_empty_object() {
        let response = Responder::default().empty();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "{}");
    }

    #[test]
    fn test_error_uses_http_error_status() {
        let response = Responder::default().error(HttpError::bad_request("Invalid input"));
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"status":400,"message":"Invalid input"}"#);
    }

    #[test]
    fn test_error_exposes_server_message_by_default() {
        let response = Responder::default().error(HttpError::internal("database down"));
        assert_eq!(response.body, r#"{"status":500,"message":"database down"}"#);
    }

    #[test]
    fn test_error_redacts_server_message() {
        let response = cors_responder(false).error(HttpError::internal("database down"));
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, r#"{"status":500,"message":"Internal Server Error"}"#);
    }

    #[test]
    fn test_redaction_keeps_client_errors() {
        let response = cors_responder(false).error(HttpError::not_found("book 7 not found"));
        assert_eq!(response.body, r#"{"status":404,"message":"book 7 not found"}"#);
    }

    #[test]
    fn test_unclassified_error_is_500() {
        let err = anyhow::anyhow!("disk full");
        let response = Responder::default().error(err);
        assert_eq!(response.body, r#"{"status":500,"message":"disk full"}"#);

        let response = cors_responder(false).error(anyhow::anyhow!("disk full"));
        assert_eq!(response.body, r#"{"status":500,"message":"Internal Server Error"}"#);
    }

    #[test]
    fn test_error_found_under_context() {
        let err = anyhow::Error::new(HttpError::new(StatusCode::CONFLICT, "duplicate title"))
            .context("creating book");
        let response = Responder::default().error(err);
        assert_eq!(response.status_code, 409);
        assert_eq!(response.body, r#"{"status":409,"message":"duplicate title"}"#);
    }

    #[test]
    fn test_stratus_error_maps_status() {
        let response = Responder::default().error(StratusError::MissingAuthorizationHeader);
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"status":400,"message":"no authorization header"}"#);
    }

    #[test]
    fn test_status_and_error_forces_status() {
        let response = Responder::default()
            .status_and_error(StatusCode::BAD_GATEWAY, anyhow::anyhow!("upstream timeout"));
        assert_eq!(response.status_code, 502);
        assert_eq!(response.body, r#"{"status":502,"message":"upstream timeout"}"#);

        let response = cors_responder(false)
            .status_and_error(StatusCode::BAD_GATEWAY, anyhow::anyhow!("upstream timeout"));
        assert_eq!(response.body, r#"{"status":502,"message":"Bad Gateway"}"#);
    }

    #[test]
    fn test_file_is_text() {
        let response = Responder::default().file("text/csv", None, b"id,title\n1,Dune\n");
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "id,title\n1,Dune\n");
        assert!(!response.is_base64_encoded);
        assert_eq!(response.header(CONTENT_TYPE), Some("text/csv"));
    }

    #[test]
    fn test_file_b64_is_encoded() {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Disposition".to_string(),
            "attachment; filename=cover.png".to_string(),
        );
        let bytes = [0x89, b'P', b'N', b'G', 0x00];

        let response = Responder::default().file_b64("image/png", Some(headers), &bytes);
        assert!(response.is_base64_encoded);
        assert_eq!(STANDARD.decode(&response.body).unwrap(), bytes);
        assert_eq!(response.header(CONTENT_TYPE), Some("image/png"));
        assert_eq!(
            response.header("content-disposition"),
            Some("attachment; filename=cover.png")
        );
    }

    #[test]
    fn test_cors_on_every_variant() {
        let responder = cors_responder(true);
        let responses = [
            responder.success(&"ok"),
            responder.empty(),
            responder.error(HttpError::bad_request("nope")),
            responder.file("text/plain", None, b"x"),
            responder.file_b64("application/octet-stream", None, b"x"),
        ];
        for response in &responses {
            assert_cors(response);
        }
    }

    #[test]
    fn test_cors_overwrites_existing_values() {
        let mut headers = HashMap::new();
        headers.insert(
            "access-control-allow-origin".to_string(),
            "https://old.example".to_string(),
        );
        let response = cors_responder(true).custom(StatusCode::OK, Some(headers), &"x");
        assert_eq!(response.header(ALLOW_ORIGIN), Some("*"));
        assert_eq!(
            response
                .headers
                .keys()
                .filter(|k| k.eq_ignore_ascii_case(ALLOW_ORIGIN))
                .count(),
            1
        );
    }

    #[test]
    fn test_empty_cors_values_are_skipped() {
        let cors = CorsConfig {
            allow_headers: Some(String::new()),
            allow_methods: None,
            allow_origin: Some("https://books.example".to_string()),
        };
        let response = Responder::new(ResponseConfig::default().with_cors(cors)).empty();
        assert_eq!(response.header(ALLOW_HEADERS), None);
        assert_eq!(response.header(ALLOW_METHODS), None);
        assert_eq!(response.header(ALLOW_ORIGIN), Some("https://books.example"));
    }
}
