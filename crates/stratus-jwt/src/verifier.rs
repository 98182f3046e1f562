//! Token verification capability.
//!
//! Stratus never checks signatures itself. A [`TokenVerifier`] takes the raw
//! token and either returns its claims as a JSON object or explains why it
//! refused. Signature, expiry and not-before checks all happen behind this
//! trait; the decoder only ever sees claims that passed them.

use serde_json::{Map, Value};
use stratus_core::{BoxFuture, StratusError};
use thiserror::Error;

/// Claims as returned by a verifier: claim name to JSON value.
pub type ClaimMap = Map<String, Value>;

/// Why a verifier did not return claims.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The token is bad: malformed, wrongly signed, expired, not yet valid.
    #[error("{0}")]
    Rejected(String),

    /// The verifier could not do its job: unusable key, unsupported
    /// algorithm, unreachable key store.
    #[error("{0}")]
    Unavailable(String),
}

impl From<VerifyError> for StratusError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Rejected(message) => Self::invalid_token(message),
            VerifyError::Unavailable(message) => Self::verification_failed(message),
        }
    }
}

/// Verifies bearer tokens.
///
/// Implementations must check the signature and, when present, the `exp`
/// and `nbf` claims before returning.
pub trait TokenVerifier: Send + Sync + 'static {
    /// Verifies `token` and returns its claims.
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<ClaimMap, VerifyError>>;
}
