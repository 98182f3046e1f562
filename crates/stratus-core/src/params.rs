//! Identifier resolution across path, query and body.
//!
//! The same logical identifier (`id`, `userId`, `userType`) can arrive in
//! the path, the query string or the JSON body. [`IdentifierParams`] gathers
//! every candidate and resolves each field with [`choose_longest`]: the
//! candidate with the most characters wins, and ties go to the earlier
//! source in the order path, query, body.
//!
//! Longest-wins is a convenience for handlers that accept an id from more
//! than one place. It is not a trust boundary: a caller can always make the
//! body value longer than the path value. Handlers that need a strict
//! source must read that source directly.

use serde_json::Value;

use crate::event::GatewayRequest;

/// Returns the candidate with the most characters.
///
/// Ties resolve to the earliest candidate; an empty list yields `""`.
///
/// # Example
///
/// ```
/// use stratus_core::params::choose_longest;
///
/// assert_eq!(choose_longest(&["1", "22", ""]), "22");
/// assert_eq!(choose_longest(&["abc", "de", "fghij"]), "fghij");
/// assert_eq!(choose_longest(&["ab", "cd"]), "ab");
/// ```
#[must_use]
pub fn choose_longest<'a>(candidates: &[&'a str]) -> &'a str {
    let mut best = "";
    let mut best_len = None;
    for &candidate in candidates {
        let len = candidate.chars().count();
        if best_len.map_or(true, |current| len > current) {
            best = candidate;
            best_len = Some(len);
        }
    }
    best
}

/// Identifier candidates gathered from one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierParams {
    /// `id` path parameter.
    pub id_path: String,
    /// `id` query parameter.
    pub id_query: String,
    /// `userId` path parameter.
    pub user_id_path: String,
    /// `userId` query parameter.
    pub user_id_query: String,
    /// `userId` body field.
    pub user_id_body: String,
    /// `userType` path parameter.
    pub user_type_path: String,
    /// `userType` query parameter.
    pub user_type_query: String,
    /// `userType` body field.
    pub user_type_body: String,
}

impl IdentifierParams {
    /// Gathers candidates from an event.
    ///
    /// The body is only consulted when it parses as a JSON object; anything
    /// else leaves the body candidates empty. Non-string body values are
    /// ignored.
    #[must_use]
    pub fn from_request(request: &GatewayRequest) -> Self {
        let path = |key: &str| request.path_parameters.get(key).cloned().unwrap_or_default();
        let query = |key: &str| {
            request
                .query_string_parameters
                .get(key)
                .cloned()
                .unwrap_or_default()
        };

        let body = if request.body.is_empty() {
            None
        } else {
            match request.json::<Value>() {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::debug!(error = %err, "request body is not JSON, skipping body identifiers");
                    None
                }
            }
        };
        let body_field = |key: &str| {
            body.as_ref()
                .and_then(|b| b.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };

        Self {
            id_path: path("id"),
            id_query: query("id"),
            user_id_path: path("userId"),
            user_id_query: query("userId"),
            user_id_body: body_field("userId"),
            user_type_path: path("userType"),
            user_type_query: query("userType"),
            user_type_body: body_field("userType"),
        }
    }

    /// Resolved `id` from path and query.
    #[must_use]
    pub fn id(&self) -> &str {
        choose_longest(&[self.id_path.as_str(), self.id_query.as_str()])
    }

    /// Resolved `userId` from path, query and body.
    #[must_use]
    pub fn user_id(&self) -> &str {
        choose_longest(&[
            self.user_id_path.as_str(),
            self.user_id_query.as_str(),
            self.user_id_body.as_str(),
        ])
    }

    /// The longer of [`id`](Self::id) and [`user_id`](Self::user_id).
    #[must_use]
    pub fn owner_id(&self) -> &str {
        choose_longest(&[self.id(), self.user_id()])
    }

    /// Resolved `userType` from path, query and body.
    #[must_use]
    pub fn user_type(&self) -> &str {
        choose_longest(&[
            self.user_type_path.as_str(),
            self.user_type_query.as_str(),
            self.user_type_body.as_str(),
        ])
    }
}
