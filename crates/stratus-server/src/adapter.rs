//! Conversion between hyper messages and gateway events.
//!
//! The local server speaks plain HTTP while handlers expect gateway events.
//! [`dispatch`] bridges the two: it collects the body, builds a
//! [`GatewayRequest`], runs it through a [`LambdaRouter`] and writes the
//! resulting [`GatewayResponse`] back as an HTTP response.
//!
//! Request side:
//!
//! - header and query maps keep every value in their multi-value form; the
//!   single-value maps only carry keys that appear exactly once;
//! - query pairs with malformed escapes are dropped rather than rejected;
//! - `multipart/form-data` bodies are base64 encoded and flagged, every
//!   other body is passed through as (lossy) UTF-8 text;
//! - the request id comes from `X-Request-Id` when present.
//!
//! Response side:
//!
//! - flagged bodies are base64 decoded;
//! - multi-value headers are written first, single-value headers only fill
//!   names that are still absent.
//!
//! Adapter failures are answered through the router's [`Responder`], so they
//! carry CORS headers and follow the server error exposure setting.

use std::collections::HashMap;
use std::fmt::Display;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::request::Parts;
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use stratus_core::{GatewayRequest, GatewayResponse, Responder, StratusError};
use uuid::Uuid;

use crate::router::LambdaRouter;

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MULTIPART_PREFIX: &str = "multipart/form-data; boundary";

/// Body type of every response the adapter produces.
pub type ResponseBody = Full<Bytes>;

/// HTTP response produced by the adapter.
pub type HttpResponse = Response<ResponseBody>;

/// Failures while converting between HTTP and gateway events.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The request body could not be read.
    #[error("failed reading request body: {0}")]
    Body(String),

    /// The handler flagged its body as base64 but it does not decode.
    #[error("handler returned invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The HTTP response could not be assembled.
    #[error("failed building response: {0}")]
    Response(#[from] http::Error),
}

impl From<AdapterError> for StratusError {
    fn from(err: AdapterError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Builds a gateway event from request head and collected body.
///
/// Query pairs that do not decode are dropped; the rest of the query is
/// kept.
pub fn gateway_request(parts: &Parts, body: &[u8]) -> GatewayRequest {
    let multi_value_headers = header_values(&parts.headers);

    let mut multi_value_query: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in query_pairs(parts.uri.query().unwrap_or_default()) {
        multi_value_query.entry(name).or_default().push(value);
    }

    let multipart = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(MULTIPART_PREFIX));

    let request_id = parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(|| Uuid::now_v7().to_string(), ToString::to_string);

    let mut request =
        GatewayRequest::new(parts.method.as_str(), parts.uri.path()).with_request_id(request_id);
    request.headers = single_values(&multi_value_headers);
    request.multi_value_headers = multi_value_headers;
    request.query_string_parameters = single_values(&multi_value_query);
    request.multi_value_query_string_parameters = multi_value_query;
    if multipart {
        request.body = STANDARD.encode(body);
        request.is_base64_encoded = true;
    } else {
        request.body = String::from_utf8_lossy(body).into_owned();
    }
    request
}

/// Decoded `name=value` pairs of a query string.
///
/// A pair with a malformed percent escape or a `;` is skipped.
fn query_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.contains(';') && escapes_are_valid(pair))
        .filter_map(|pair| serde_urlencoded::from_str::<Vec<(String, String)>>(pair).ok())
        .flatten()
}

fn escapes_are_valid(pair: &str) -> bool {
    let bytes = pair.as_bytes();
    bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

/// Converts a gateway response into an HTTP response.
///
/// # Errors
///
/// [`AdapterError::Base64`] when a flagged body does not decode and
/// [`AdapterError::Response`] when the status code is out of range.
pub fn http_response(response: GatewayResponse) -> Result<HttpResponse, AdapterError> {
    let body = if response.is_base64_encoded {
        Bytes::from(STANDARD.decode(response.body.as_bytes())?)
    } else {
        Bytes::from(response.body)
    };

    let mut headers = HeaderMap::new();
    for (name, values) in &response.multi_value_headers {
        let Some(name) = header_name(name) else {
            continue;
        };
        for (i, value) in values.iter().enumerate() {
            let Some(value) = header_value(&name, value) else {
                continue;
            };
            if i == 0 {
                headers.insert(name.clone(), value);
            } else {
                headers.append(name.clone(), value);
            }
        }
    }
    for (name, value) in &response.headers {
        let Some(name) = header_name(name) else {
            continue;
        };
        if headers.contains_key(&name) {
            continue;
        }
        if let Some(value) = header_value(&name, value) {
            headers.insert(name, value);
        }
    }

    let mut http = Response::builder()
        .status(response.status_code)
        .body(Full::new(body))?;
    *http.headers_mut() = headers;
    Ok(http)
}

/// Runs one HTTP request through `router`.
///
/// Never fails: adapter problems become JSON error responses.
pub async fn dispatch<B>(router: &LambdaRouter, request: Request<B>) -> HttpResponse
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let err = AdapterError::Body(err.to_string());
            tracing::error!(error = %err, "request body unavailable");
            return failure(router.responder(), err);
        }
    };

    let response = router.handle(gateway_request(&parts, &body)).await;
    match http_response(response) {
        Ok(http) => http,
        Err(err) => {
            tracing::error!(error = %err, "handler response could not be written");
            failure(router.responder(), err)
        }
    }
}

/// Answers an adapter failure through `responder`.
fn failure(responder: &Responder, err: AdapterError) -> HttpResponse {
    write_error(responder.error(StratusError::from(err)))
}

/// Writes an error response, falling back to a bare 500.
pub(crate) fn write_error(response: GatewayResponse) -> HttpResponse {
    http_response(response).unwrap_or_else(|err| {
        tracing::error!(error = %err, "error response could not be written");
        plain_internal_error()
    })
}

fn plain_internal_error() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(
        br#"{"status":500,"message":"Internal Server Error"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=UTF-8"),
    );
    response
}

fn header_values(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut values: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        values
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    values
}

fn single_values(multi: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
    multi
        .iter()
        .filter_map(|(name, values)| match values.as_slice() {
            [only] => Some((name.clone(), only.clone())),
            _ => None,
        })
        .collect()
}

fn header_name(name: &str) -> Option<HeaderName> {
    match HeaderName::from_bytes(name.as_bytes()) {
        Ok(name) => Some(name),
        Err(_) => {
            tracing::warn!(header = name, "skipping invalid response header name");
            None
        }
    }
}

fn header_value(name: &HeaderName, value: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(value) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(header = %name, "skipping invalid response header value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::{json, Value};
    use stratus_core::{CorsConfig, HandlerResult, RequestContext, ResponseConfig};

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_single_value_maps_skip_repeated_keys() {
        let head = parts(
            Request::builder()
                .uri("/books?tag=a&tag=b&page=2")
                .header("Accept", "application/json")
                .header("X-Trace", "1")
                .header("X-Trace", "2")
                .body(())
                .unwrap(),
        );
        let event = gateway_request(&head, b"");

        assert_eq!(event.path, "/books");
        assert_eq!(event.query_string_parameters.get("page").map(String::as_str), Some("2"));
        assert!(!event.query_string_parameters.contains_key("tag"));
        assert_eq!(event.multi_value_query_string_parameters["tag"], ["a", "b"]);

        assert_eq!(event.headers["accept"], "application/json");
        assert!(!event.headers.contains_key("x-trace"));
        assert_eq!(event.multi_value_headers["x-trace"], ["1", "2"]);
    }

    #[test]
    fn test_query_values_are_decoded() {
        let head = parts(Request::builder().uri("/s?q=hello%20world&x=a+b").body(()).unwrap());
        let event = gateway_request(&head, b"");

        assert_eq!(event.query_string_parameters["q"], "hello world");
        assert_eq!(event.query_string_parameters["x"], "a b");
    }

    #[test]
    fn test_malformed_query_pairs_are_dropped() {
        let head = parts(
            Request::builder()
                .uri("/books?author=Le%20Guin&bad=%zz&half=%4&a;b=c&&flag")
                .body(())
                .unwrap(),
        );
        let event = gateway_request(&head, b"");

        assert_eq!(event.query_string_parameters["author"], "Le Guin");
        assert_eq!(event.query_string_parameters["flag"], "");
        for dropped in ["bad", "half", "a", "a;b"] {
            assert!(!event.multi_value_query_string_parameters.contains_key(dropped), "{dropped}");
        }
    }

    #[test]
    fn test_multipart_body_is_base64() {
        let head = parts(
            Request::builder()
                .method(Method::POST)
                .uri("/upload")
                .header(CONTENT_TYPE, "multipart/form-data; boundary=xyz")
                .body(())
                .unwrap(),
        );
        let event = gateway_request(&head, &[0xff, 0x00, 0x10]);

        assert!(event.is_base64_encoded);
        assert_eq!(event.body, STANDARD.encode([0xff, 0x00, 0x10]));
        assert_eq!(*event.body_bytes().unwrap(), [0xff, 0x00, 0x10]);
    }

    #[test]
    fn test_text_body_passes_through() {
        let head = parts(
            Request::builder()
                .method(Method::POST)
                .uri("/books")
                .header(CONTENT_TYPE, "application/json")
                .body(())
                .unwrap(),
        );
        let event = gateway_request(&head, br#"{"title":"Dune"}"#);

        assert!(!event.is_base64_encoded);
        assert_eq!(event.body, r#"{"title":"Dune"}"#);
        assert_eq!(event.http_method, "POST");
    }

    #[test]
    fn test_request_id_from_header_or_generated() {
        let head = parts(
            Request::builder()
                .uri("/")
                .header("X-Request-Id", "req-77")
                .body(())
                .unwrap(),
        );
        assert_eq!(gateway_request(&head, b"").request_context.request_id, "req-77");

        let head = parts(Request::builder().uri("/").body(()).unwrap());
        let generated = gateway_request(&head, b"").request_context.request_id;
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn test_multi_value_headers_win_over_single() {
        let mut response = GatewayResponse::new(201, "created");
        response.set_header("X-Source", "single");
        response.set_header("X-Only", "single");
        response
            .multi_value_headers
            .insert("X-Source".to_string(), vec!["first".to_string(), "second".to_string()]);

        let http = http_response(response).unwrap();
        assert_eq!(http.status(), StatusCode::CREATED);
        let sources: Vec<_> = http.headers().get_all("x-source").iter().collect();
        assert_eq!(sources, ["first", "second"]);
        assert_eq!(http.headers()["x-only"], "single");
    }

    #[tokio::test]
    async fn test_base64_response_is_decoded() {
        let mut response = GatewayResponse::new(200, STANDARD.encode(b"\x89PNG"));
        response.is_base64_encoded = true;

        let http = http_response(response).unwrap();
        let bytes = http.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"\x89PNG");
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        let mut response = GatewayResponse::new(200, "%%%");
        response.is_base64_encoded = true;

        let err = http_response(response).unwrap_err();
        assert!(matches!(err, AdapterError::Base64(_)));
        assert!(err.to_string().starts_with("handler returned invalid base64 data"));
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let mut response = GatewayResponse::new(200, "{}");
        response.set_header("Bad Header", "x");
        response.set_header("X-Bad-Value", "line\nbreak");
        response.set_header("X-Good", "ok");

        let http = http_response(response).unwrap();
        assert_eq!(http.headers()["x-good"], "ok");
        assert!(http.headers().get("x-bad-value").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_invalid_base64_goes_through_responder() {
        async fn broken(_ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
            let mut response = GatewayResponse::new(200, "not base64!");
            response.is_base64_encoded = true;
            Ok(response)
        }

        let mut router = LambdaRouter::with_config(
            ResponseConfig::default().with_cors(CorsConfig::permissive()),
        );
        router.route(Method::GET, "/broken", broken, []).unwrap();

        let request = Request::get("/broken").body(Full::new(Bytes::new())).unwrap();
        let response = dispatch(&router, request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = body_json(response).await;
        assert_eq!(body["status"], 500);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("handler returned invalid base64 data"));
    }

    #[tokio::test]
    async fn test_dispatch_redacts_adapter_failures_when_configured() {
        async fn broken(_ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
            let mut response = GatewayResponse::new(200, "not base64!");
            response.is_base64_encoded = true;
            Ok(response)
        }

        let mut router = LambdaRouter::with_config(
            ResponseConfig::default().with_expose_server_errors(false),
        );
        router.route(Method::GET, "/broken", broken, []).unwrap();

        let request = Request::get("/broken").body(Full::new(Bytes::new())).unwrap();
        let body = body_json(dispatch(&router, request).await).await;
        assert_eq!(body, json!({"status": 500, "message": "Internal Server Error"}));
    }

    #[tokio::test]
    async fn test_dispatch_round_trip() {
        async fn echo(ctx: RequestContext, req: GatewayRequest) -> HandlerResult {
            Ok(ctx.responder().success(&json!({
                "id": req.path_parameters.get("id"),
                "body": req.body,
            })))
        }

        let mut router = LambdaRouter::new();
        router.route(Method::PUT, "/books/{id}", echo, []).unwrap();

        let request = Request::put("/books/12")
            .body(Full::new(Bytes::from_static(b"hello")))
            .unwrap();
        let response = dispatch(&router, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=UTF-8"
        );
        assert_eq!(body_json(response).await, json!({"id": "12", "body": "hello"}));
    }
}
