//! Shared-secret verifier built on `jsonwebtoken`.
//!
//! Accepts HS256, HS384 and HS512 tokens. `exp` and `nbf` are checked when
//! the token carries them and are otherwise optional; `aud` is not checked,
//! handlers that care read it from the context.

use std::fmt;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use stratus_core::BoxFuture;

use crate::verifier::{ClaimMap, TokenVerifier, VerifyError};

/// Verifies and signs HMAC tokens with one secret.
///
/// # Example
///
/// ```
/// use stratus_jwt::{HmacVerifier, TokenVerifier};
/// use stratus_core::StandardClaims;
///
/// # tokio_test::block_on(async {
/// let verifier = HmacVerifier::new(b"local-dev-secret");
/// let token = verifier
///     .sign(&StandardClaims { subject: "u-1".into(), ..Default::default() })
///     .unwrap();
///
/// let claims = verifier.verify(&token).await.unwrap();
/// assert_eq!(claims["sub"], "u-1");
/// # });
/// ```
#[derive(Clone)]
pub struct HmacVerifier {
    algorithm: Algorithm,
    decoding: DecodingKey,
    encoding: EncodingKey,
    leeway_secs: u64,
}

impl fmt::Debug for HmacVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacVerifier")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

impl HmacVerifier {
    /// Creates an HS256 verifier with no clock leeway.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            algorithm: Algorithm::HS256,
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            leeway_secs: 0,
        }
    }

    /// Switches to another HMAC algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Unavailable`] for non-HMAC algorithms, which
    /// need key material this verifier does not hold.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, VerifyError> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(VerifyError::Unavailable(format!(
                "{algorithm:?} is not an HMAC algorithm"
            )));
        }
        self.algorithm = algorithm;
        Ok(self)
    }

    /// Allows `exp`/`nbf` to be off by up to `secs` seconds.
    #[must_use]
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Signs `claims` into a compact token.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, VerifyError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(classify)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway_secs;
        validation
    }

    fn verify_now(&self, token: &str) -> Result<ClaimMap, VerifyError> {
        let data = jsonwebtoken::decode::<ClaimMap>(token, &self.decoding, &self.validation())
            .map_err(classify)?;
        Ok(data.claims)
    }
}

impl TokenVerifier for HmacVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<ClaimMap, VerifyError>> {
        Box::pin(async move { self.verify_now(token) })
    }
}

/// Splits `jsonwebtoken` failures into "bad token" and "broken verifier".
fn classify(err: JwtError) -> VerifyError {
    match err.kind() {
        ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::RsaFailedSigning
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::MissingAlgorithm
        | ErrorKind::Crypto(_) => {
            tracing::error!(error = %err, "token verifier is misconfigured");
            VerifyError::Unavailable(err.to_string())
        }
        _ => VerifyError::Rejected(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> i64 {
        i64::try_from(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip() {
        let verifier = HmacVerifier::new("s3cret");
        let token = verifier
            .sign(&json!({"sub": "u-1", "exp": now() + 600, "custom": true}))
            .unwrap();

        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims["sub"], "u-1");
        assert_eq!(claims["custom"], true);
    }

    #[tokio::test]
    async fn test_claims_without_exp_are_accepted() {
        let verifier = HmacVerifier::new("s3cret");
        let token = verifier.sign(&json!({"sub": "u-1"})).unwrap();
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let verifier = HmacVerifier::new("s3cret");
        let token = verifier.sign(&json!({"exp": now() - 120})).unwrap();

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_leeway_tolerates_small_skew() {
        let verifier = HmacVerifier::new("s3cret").with_leeway(300);
        let token = verifier.sign(&json!({"exp": now() - 120})).unwrap();
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_future_nbf_is_rejected() {
        let verifier = HmacVerifier::new("s3cret");
        let token = verifier.sign(&json!({"nbf": now() + 3600})).unwrap();

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let token = HmacVerifier::new("one").sign(&json!({"sub": "x"})).unwrap();
        let err = HmacVerifier::new("two").verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_algorithm_mismatch_is_rejected() {
        let signer = HmacVerifier::new("s3cret")
            .with_algorithm(Algorithm::HS512)
            .unwrap();
        let token = signer.sign(&json!({"sub": "x"})).unwrap();

        let err = HmacVerifier::new("s3cret").verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_garbage_is_rejected() {
        let err = HmacVerifier::new("s3cret")
            .verify("not.a.token")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[test]
    fn test_non_hmac_algorithm_is_refused() {
        let err = HmacVerifier::new("s3cret")
            .with_algorithm(Algorithm::RS256)
            .unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable(_)));
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", HmacVerifier::new("s3cret"));
        assert!(rendered.contains("HS256"));
        assert!(!rendered.contains("s3cret"));
    }
}
