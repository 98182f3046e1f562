//! # Stratus JWT
//!
//! Bearer token handling for the Stratus claim-decoding middleware.
//!
//! Signature checks live behind the [`TokenVerifier`] trait so deployments
//! can plug in whatever key source they use. [`HmacVerifier`] covers the
//! shared-secret case with `jsonwebtoken`.
//!
//! ```
//! use std::collections::HashMap;
//! use stratus_core::ExpandedClaims;
//! use stratus_jwt::{decode, HmacVerifier};
//!
//! # tokio_test::block_on(async {
//! let verifier = HmacVerifier::new("local-dev-secret");
//! let token = verifier
//!     .sign(&serde_json::json!({ "sub": "u-1", "userType": "admin" }))
//!     .unwrap();
//! let headers = HashMap::from([("Authorization".to_string(), format!("Bearer {token}"))]);
//!
//! let claims: ExpandedClaims = decode(&verifier, &headers).await.unwrap();
//! assert_eq!(claims.user_type, "admin");
//! # });
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decoder;
mod hmac;
mod verifier;

pub use decoder::{bind, decode, extract_token, verify_and_parse, AUTHORIZATION};
pub use hmac::HmacVerifier;
pub use jsonwebtoken::Algorithm;
pub use verifier::{ClaimMap, TokenVerifier, VerifyError};
