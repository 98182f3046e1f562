//! Bearer token extraction and claim binding.
//!
//! Decoding is three steps, each usable on its own:
//!
//! 1. [`extract_token`] pulls the token out of the `Authorization` header
//! 2. [`verify_and_parse`] hands it to a [`TokenVerifier`]
//! 3. [`bind`] shapes the verified mapping into a [`ClaimSet`]
//!
//! [`decode`] runs all three.

use std::collections::HashMap;

use stratus_core::{ClaimSet, StratusError};

use crate::verifier::{ClaimMap, TokenVerifier};

/// Name of the header carrying the token.
pub const AUTHORIZATION: &str = "authorization";

/// Returns the bearer token from `headers`.
///
/// The header name is matched case-insensitively. The value must start with
/// `Bearer ` (or `bearer `) followed by a non-empty token.
///
/// # Errors
///
/// [`StratusError::MissingAuthorizationHeader`] when the header is absent,
/// uses another scheme or carries no token.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use stratus_jwt::extract_token;
///
/// let headers = HashMap::from([("Authorization".to_string(), "Bearer abc.def.ghi".to_string())]);
/// assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
///
/// let headers = HashMap::from([("Authorization".to_string(), "Basic Zm9vOmJhcg==".to_string())]);
/// assert!(extract_token(&headers).is_err());
/// ```
pub fn extract_token(headers: &HashMap<String, String>) -> Result<&str, StratusError> {
    let value = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION))
        .map(|(_, value)| value.as_str())
        .ok_or(StratusError::MissingAuthorizationHeader)?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(StratusError::MissingAuthorizationHeader)
}

/// Verifies `token` and returns its claims.
///
/// # Errors
///
/// [`StratusError::InvalidToken`] when the verifier rejects the token,
/// [`StratusError::VerificationFailed`] when the verifier itself failed.
pub async fn verify_and_parse(
    verifier: &dyn TokenVerifier,
    token: &str,
) -> Result<ClaimMap, StratusError> {
    verifier.verify(token).await.map_err(|err| {
        tracing::debug!(error = %err, "token verification failed");
        StratusError::from(err)
    })
}

/// Copies verified claims into the `C` shape.
///
/// Unknown claims are ignored and missing ones take their defaults. A claim
/// with the wrong JSON type fails the bind; nothing is re-verified here.
///
/// # Errors
///
/// [`StratusError::ClaimShape`] when a recognized claim has the wrong type.
pub fn bind<C: ClaimSet>(claims: ClaimMap) -> Result<C, StratusError> {
    serde_json::from_value(serde_json::Value::Object(claims)).map_err(|err| {
        StratusError::claim_shape(format!("{} claims: {err}", C::KIND))
    })
}

/// Extracts, verifies and binds in one go.
///
/// # Errors
///
/// Any error of [`extract_token`], [`verify_and_parse`] or [`bind`].
pub async fn decode<C: ClaimSet>(
    verifier: &dyn TokenVerifier,
    headers: &HashMap<String, String>,
) -> Result<C, StratusError> {
    let token = extract_token(headers)?;
    let claims = verify_and_parse(verifier, token).await?;
    bind(claims)
}
