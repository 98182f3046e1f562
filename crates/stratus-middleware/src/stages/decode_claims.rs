//! JWT claim decoding.
//!
//! Reads the bearer token, verifies it, binds the claims into the requested
//! shape and stores them in the context. Failures end the request here:
//!
//! | Failure                      | Status |
//! |------------------------------|--------|
//! | no `Authorization: Bearer …` | 400    |
//! | token rejected by verifier   | 401    |
//! | verifier unavailable         | 500    |
//! | claims of the wrong shape    | 500    |

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use stratus_core::{
    BoxFuture, ClaimSet, ExpandedClaims, GatewayRequest, GatewayResponse, RequestContext,
    StandardClaims,
};
use stratus_jwt::TokenVerifier;

use crate::middleware::{Middleware, Next};

/// Decodes claims of shape `C` into the context.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stratus_jwt::HmacVerifier;
/// use stratus_middleware::{DecodeClaims, Middleware};
///
/// let verifier = Arc::new(HmacVerifier::new("local-dev-secret"));
/// let standard = DecodeClaims::standard(verifier.clone());
/// let expanded = DecodeClaims::expanded(verifier);
///
/// assert_eq!(standard.name(), "decode_standard_claims");
/// assert_eq!(expanded.name(), "decode_expanded_claims");
/// ```
pub struct DecodeClaims<C> {
    verifier: Arc<dyn TokenVerifier>,
    name: &'static str,
    shape: PhantomData<fn() -> C>,
}

impl<C> Clone for DecodeClaims<C> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            name: self.name,
            shape: PhantomData,
        }
    }
}

impl<C: ClaimSet> fmt::Debug for DecodeClaims<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeClaims")
            .field("shape", &C::KIND)
            .finish_non_exhaustive()
    }
}

impl DecodeClaims<StandardClaims> {
    /// Decodes the registered claims only.
    #[must_use]
    pub fn standard(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self::with_name(verifier, "decode_standard_claims")
    }
}

impl DecodeClaims<ExpandedClaims> {
    /// Decodes the registered claims plus user profile fields.
    #[must_use]
    pub fn expanded(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self::with_name(verifier, "decode_expanded_claims")
    }
}

impl<C: ClaimSet> DecodeClaims<C> {
    /// Decodes claims of a custom shape.
    #[must_use]
    pub fn with_name(verifier: Arc<dyn TokenVerifier>, name: &'static str) -> Self {
        Self {
            verifier,
            name,
            shape: PhantomData,
        }
    }
}

impl<C: ClaimSet> Middleware for DecodeClaims<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResponse> {
        Box::pin(async move {
            match stratus_jwt::decode::<C>(self.verifier.as_ref(), &request.headers).await {
                Ok(claims) => {
                    ctx.set_claims(claims.into_claims());
                    next.run(ctx, request).await
                }
                Err(err) => {
                    tracing::debug!(
                        shape = C::KIND,
                        status = err.status_code().as_u16(),
                        error = %err,
                        "claim decoding failed"
                    );
                    ctx.responder().error(err)
                }
            }
        })
    }
}
