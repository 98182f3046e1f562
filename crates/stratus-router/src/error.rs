//! Registration and matching errors.

use http::Method;
use thiserror::Error;

/// Errors raised while registering a route.
///
/// These surface at startup, before any request is served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The method is already bound to this template.
    #[error("route conflict: {method} {template} is already registered")]
    Conflict {
        /// HTTP method of the rejected registration.
        method: Method,
        /// Normalized template of the rejected registration.
        template: String,
    },

    /// The template does not follow the segment grammar.
    #[error("invalid path template '{template}': {reason}")]
    InvalidTemplate {
        /// Template as given by the caller.
        template: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl RouteError {
    pub(crate) fn invalid(template: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while matching a request against the route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No template matches the path.
    #[error("no route matches the requested path")]
    NotFound,

    /// A template matches the path, but not under this method.
    #[error("method not allowed")]
    MethodNotAllowed {
        /// Methods bound to the matching template, in registration order.
        allowed: Vec<Method>,
    },
}

impl MatchError {
    /// HTTP status code conventionally used for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed { .. } => 405,
        }
    }
}
