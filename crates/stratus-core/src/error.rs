//! Error types for Stratus.
//!
//! Two types cooperate here:
//!
//! - [`HttpError`] is the wire-level pair `{status, message}` that ends up
//!   in an error response body. Handlers return it (through `anyhow`) to
//!   pick a status.
//! - [`StratusError`] is the taxonomy raised by the dispatch layer itself.
//!   Every variant maps to a fixed status.
//!
//! | Variant | Status |
//! |---|---|
//! | `BadRequest` | 400 |
//! | `MissingAuthorizationHeader` | 400 |
//! | `InvalidToken` | 401 |
//! | `NotFound` | 404 |
//! | `MethodNotAllowed` | 405 |
//! | `VerificationFailed` | 500 |
//! | `ClaimShape` | 500 |
//! | `Serialization` | 500 |
//! | `Internal` | 500 |

use http::StatusCode;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result type alias using [`StratusError`].
pub type StratusResult<T> = Result<T, StratusError>;

/// Message used whenever a response body could not be produced.
pub const GENERIC_SERVER_MESSAGE: &str = "the server has encountered an unexpected error";

/// Message carried by [`StratusError::MissingAuthorizationHeader`].
pub const NO_AUTHORIZATION_HEADER: &str = "no authorization header";

/// Returns the canonical reason phrase for `status`, or the generic server
/// message for codes without one.
#[must_use]
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or(GENERIC_SERVER_MESSAGE)
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

/// An HTTP status paired with a client-facing message.
///
/// Serializes as `{"status": <int>, "message": <string>}`, which is the error
/// body format of every Stratus response.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use stratus_core::HttpError;
///
/// let err = HttpError::new(StatusCode::CONFLICT, "book already exists");
/// assert_eq!(
///     serde_json::to_string(&err).unwrap(),
///     r#"{"status":409,"message":"book already exists"}"#
/// );
///
/// // an empty message falls back to the reason phrase
/// assert_eq!(HttpError::new(StatusCode::NOT_FOUND, "").message(), "Not Found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct HttpError {
    #[serde(serialize_with = "serialize_status")]
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// Creates an error. An empty message is replaced with the status's
    /// reason phrase.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            reason_phrase(status).to_string()
        } else {
            message
        };
        Self { status, message }
    }

    /// Shorthand for a 400.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Shorthand for a 404.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Shorthand for a 500.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// The HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a copy with the message replaced by the reason phrase.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            status: self.status,
            message: reason_phrase(self.status).to_string(),
        }
    }
}

/// Errors raised by the dispatch layer.
#[derive(Debug, Error)]
pub enum StratusError {
    /// The request could not be understood.
    #[error("{message}")]
    BadRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// No route matches the path.
    #[error("no route matches {path}")]
    NotFound {
        /// Requested path.
        path: String,
    },

    /// A route matches the path, but not under this method.
    #[error("method {method} is not allowed on {path}")]
    MethodNotAllowed {
        /// Requested method.
        method: String,
        /// Requested path.
        path: String,
        /// Methods bound to the matched template.
        allowed: Vec<String>,
    },

    /// No bearer token was supplied.
    #[error("no authorization header")]
    MissingAuthorizationHeader,

    /// The token was rejected by the verifier.
    #[error("invalid token: {message}")]
    InvalidToken {
        /// Verifier's reason.
        message: String,
    },

    /// The verifier itself failed (bad key, unsupported algorithm).
    #[error("token verification failed: {message}")]
    VerificationFailed {
        /// Verifier's reason.
        message: String,
    },

    /// Verified claims do not fit the requested claims variant.
    #[error("claims do not match the expected shape: {message}")]
    ClaimShape {
        /// Decoder's reason.
        message: String,
    },

    /// A response value could not be serialized.
    #[error("the server has encountered an unexpected error")]
    Serialization {
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// Any other internal failure.
    #[error("{message}")]
    Internal {
        /// What failed.
        message: String,
    },
}

impl StratusError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an invalid token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a verification failure.
    #[must_use]
    pub fn verification_failed(message: impl Into<String>) -> Self {
        Self::VerificationFailed {
            message: message.into(),
        }
    }

    /// Creates a claim shape error.
    #[must_use]
    pub fn claim_shape(message: impl Into<String>) -> Self {
        Self::ClaimShape {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } | Self::MissingAuthorizationHeader => StatusCode::BAD_REQUEST,
            Self::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::VerificationFailed { .. }
            | Self::ClaimShape { .. }
            | Self::Serialization { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts to the wire-level error.
    #[must_use]
    pub fn to_http_error(&self) -> HttpError {
        HttpError::new(self.status_code(), self.to_string())
    }
}

impl From<StratusError> for HttpError {
    fn from(err: StratusError) -> Self {
        err.to_http_error()
    }
}
