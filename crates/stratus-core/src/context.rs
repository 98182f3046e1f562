//! Request context.
//!
//! A [`RequestContext`] is created for every request and carries what the
//! middleware learned about it: identifiers, method and path, parameters,
//! resolved ids and decoded claims. It is append-only in spirit: setters
//! ignore empty values so a later stage can never blank out something an
//! earlier stage recorded.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::claims::{Claims, ExpandedClaims, StandardClaims};
use crate::response::Responder;

/// Field names used when a context is rendered for logging.
pub mod keys {
    /// Resolved `id`.
    pub const ID: &str = "id";
    /// HTTP method.
    pub const METHOD: &str = "method";
    /// Multi-value query parameters.
    pub const MULTI_PARAMS: &str = "multiParams";
    /// Raw path.
    pub const PATH: &str = "path";
    /// Path parameters.
    pub const PATH_PARAMS: &str = "pathParams";
    /// Single-value query parameters.
    pub const QUERY_PARAMS: &str = "queryParams";
    /// Gateway request id.
    pub const REQUEST_ID: &str = "requestId";
    /// Resolved `userId`.
    pub const USER_ID: &str = "userId";
    /// Resolved `userType`.
    pub const USER_TYPE: &str = "userType";
    /// Decoded claims, nested under their wire names.
    pub const CLAIMS: &str = "claims";
}

/// Per-request state threaded through the middleware pipeline.
///
/// # Example
///
/// ```
/// use stratus_core::RequestContext;
///
/// let mut ctx = RequestContext::default();
/// ctx.set_method("GET");
/// ctx.set_method("");
///
/// assert_eq!(ctx.method(), Some("GET"));
/// assert_eq!(ctx.user_id(), None);
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    responder: Responder,
    request_id: Option<String>,
    method: Option<String>,
    path: Option<String>,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    multi_query_params: HashMap<String, Vec<String>>,
    id: Option<String>,
    user_id: Option<String>,
    user_type: Option<String>,
    claims: Option<Claims>,
    started_at: Instant,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Responder::default())
    }
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    (!value.is_empty()).then_some(value)
}

impl RequestContext {
    /// Creates an empty context that builds responses with `responder`.
    #[must_use]
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            request_id: None,
            method: None,
            path: None,
            path_params: HashMap::new(),
            query_params: HashMap::new(),
            multi_query_params: HashMap::new(),
            id: None,
            user_id: None,
            user_type: None,
            claims: None,
            started_at: Instant::now(),
        }
    }

    /// The response builder for this request.
    #[must_use]
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Gateway request id.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Records the request id. Empty values are ignored.
    pub fn set_request_id(&mut self, value: impl Into<String>) {
        if let Some(value) = non_empty(value) {
            self.request_id = Some(value);
        }
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Records the method. Empty values are ignored.
    pub fn set_method(&mut self, value: impl Into<String>) {
        if let Some(value) = non_empty(value) {
            self.method = Some(value);
        }
    }

    /// Raw request path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Records the path. Empty values are ignored.
    pub fn set_path(&mut self, value: impl Into<String>) {
        if let Some(value) = non_empty(value) {
            self.path = Some(value);
        }
    }

    /// Path parameters.
    #[must_use]
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Single-value query parameters.
    #[must_use]
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Multi-value query parameters.
    #[must_use]
    pub fn multi_query_params(&self) -> &HashMap<String, Vec<String>> {
        &self.multi_query_params
    }

    /// Adds path parameters, skipping empty values.
    pub fn extend_path_params<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            if let Some(value) = non_empty(value) {
                self.path_params.insert(key.into(), value);
            }
        }
    }

    /// Adds single-value query parameters, skipping empty values.
    pub fn extend_query_params<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            if let Some(value) = non_empty(value) {
                self.query_params.insert(key.into(), value);
            }
        }
    }

    /// Adds multi-value query parameters, skipping empty value lists.
    pub fn extend_multi_query_params<I, K>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        for (key, values) in params {
            if !values.is_empty() {
                self.multi_query_params.insert(key.into(), values);
            }
        }
    }

    /// Resolved `id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Records the resolved `id`. Empty values are ignored.
    pub fn set_id(&mut self, value: impl Into<String>) {
        if let Some(value) = non_empty(value) {
            self.id = Some(value);
        }
    }

    /// Resolved `userId`.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Records the resolved `userId`. Empty values are ignored.
    pub fn set_user_id(&mut self, value: impl Into<String>) {
        if let Some(value) = non_empty(value) {
            self.user_id = Some(value);
        }
    }

    /// Resolved `userType`.
    #[must_use]
    pub fn user_type(&self) -> Option<&str> {
        self.user_type.as_deref()
    }

    /// Records the resolved `userType`. Empty values are ignored.
    pub fn set_user_type(&mut self, value: impl Into<String>) {
        if let Some(value) = non_empty(value) {
            self.user_type = Some(value);
        }
    }

    /// Decoded claims, if a decode stage ran.
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Registered claims of whichever shape was decoded.
    #[must_use]
    pub fn standard_claims(&self) -> Option<&StandardClaims> {
        self.claims.as_ref().map(Claims::standard)
    }

    /// Expanded claims, if that shape was decoded.
    #[must_use]
    pub fn expanded_claims(&self) -> Option<&ExpandedClaims> {
        self.claims.as_ref().and_then(Claims::expanded)
    }

    /// Records decoded claims.
    ///
    /// Unlike the string setters this always replaces the earlier value.
    /// A verified token has no empty form, so when two decode stages run the
    /// later one wins.
    pub fn set_claims(&mut self, claims: impl Into<Claims>) {
        self.claims = Some(claims.into());
    }

    /// Every populated value, keyed by the names in [`keys`].
    ///
    /// Empty maps and unset values are left out.
    #[must_use]
    pub fn populated(&self) -> Map<String, Value> {
        let mut out = Map::new();
        let mut put_str = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                out.insert(key.to_string(), Value::from(value));
            }
        };
        put_str(keys::ID, self.id());
        put_str(keys::METHOD, self.method());
        put_str(keys::PATH, self.path());
        put_str(keys::REQUEST_ID, self.request_id());
        put_str(keys::USER_ID, self.user_id());
        put_str(keys::USER_TYPE, self.user_type());

        let maps = [
            (keys::PATH_PARAMS, serde_json::to_value(&self.path_params)),
            (keys::QUERY_PARAMS, serde_json::to_value(&self.query_params)),
            (keys::MULTI_PARAMS, serde_json::to_value(&self.multi_query_params)),
        ];
        for (key, value) in maps {
            if let Ok(Value::Object(map)) = value {
                if !map.is_empty() {
                    out.insert(key.to_string(), Value::Object(map));
                }
            }
        }

        if let Some(claims) = &self.claims {
            let map = claims.to_map();
            if !map.is_empty() {
                out.insert(keys::CLAIMS.to_string(), Value::Object(map));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = RequestContext::default();
        assert_eq!(ctx.request_id(), None);
        assert_eq!(ctx.method(), None);
        assert!(ctx.path_params().is_empty());
        assert!(ctx.claims().is_none());
        assert!(ctx.populated().is_empty());
    }

    #[test]
    fn test_empty_values_never_overwrite() {
        let mut ctx = RequestContext::default();
        ctx.set_request_id("req-1");
        ctx.set_user_id("u-1");
        ctx.set_request_id("");
        ctx.set_user_id(String::new());

        assert_eq!(ctx.request_id(), Some("req-1"));
        assert_eq!(ctx.user_id(), Some("u-1"));
    }

    #[test]
    fn test_empty_param_values_are_skipped() {
        let mut ctx = RequestContext::default();
        ctx.extend_path_params([("id", "7"), ("userId", "")]);
        ctx.extend_query_params(vec![("page".to_string(), "2".to_string())]);
        ctx.extend_multi_query_params([("tag", vec!["a".to_string()]), ("empty", Vec::new())]);

        assert_eq!(ctx.path_params().len(), 1);
        assert_eq!(ctx.query_params()["page"], "2");
        assert!(ctx.multi_query_params().contains_key("tag"));
        assert!(!ctx.multi_query_params().contains_key("empty"));
    }

    #[test]
    fn test_claim_accessors() {
        let mut ctx = RequestContext::default();
        ctx.set_claims(StandardClaims {
            subject: "u-9".to_string(),
            ..StandardClaims::default()
        });

        assert_eq!(ctx.standard_claims().map(|c| c.subject.as_str()), Some("u-9"));
        assert!(ctx.expanded_claims().is_none());
    }

    #[test]
    fn test_later_claims_replace_earlier() {
        let mut ctx = RequestContext::default();
        ctx.set_claims(StandardClaims {
            subject: "u-1".to_string(),
            ..StandardClaims::default()
        });
        ctx.set_claims(ExpandedClaims {
            standard: StandardClaims::default(),
            email: "ada@example.com".to_string(),
            ..ExpandedClaims::default()
        });

        assert_eq!(ctx.standard_claims().map(|c| c.subject.as_str()), Some(""));
        assert_eq!(
            ctx.expanded_claims().map(|c| c.email.as_str()),
            Some("ada@example.com")
        );
    }

    #[test]
    fn test_populated_lists_only_set_values() {
        let mut ctx = RequestContext::default();
        ctx.set_method("DELETE");
        ctx.set_path("/books/3");
        ctx.extend_path_params([("id", "3")]);
        ctx.set_id("3");
        ctx.set_claims(ExpandedClaims {
            email: "a@example.com".to_string(),
            ..ExpandedClaims::default()
        });

        let populated = ctx.populated();
        assert_eq!(populated[keys::METHOD], "DELETE");
        assert_eq!(populated[keys::PATH], "/books/3");
        assert_eq!(populated[keys::ID], "3");
        assert_eq!(populated[keys::PATH_PARAMS]["id"], "3");
        assert_eq!(populated[keys::CLAIMS]["email"], "a@example.com");
        assert!(!populated.contains_key(keys::QUERY_PARAMS));
        assert!(!populated.contains_key(keys::USER_ID));
    }
}
