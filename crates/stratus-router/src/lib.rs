//! Radix tree path-template router for Stratus.
//!
//! The router maps `(method, template)` pairs to values of any type and
//! resolves concrete request paths against them, capturing named
//! parameters along the way.
//!
//! # Template grammar
//!
//! - **Literal**: `/books`
//! - **Parameter**: `/books/{id}` captures exactly one non-empty segment
//! - **Wildcard**: `/assets/*key` or `/assets/{key+}` captures one or more
//!   trailing segments as a single `/`-joined value. Only allowed last.
//!
//! Empty segments are ignored, so trailing slashes never matter.
//!
//! # Example
//!
//! ```rust
//! use stratus_router::{MatchError, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/books/{id}", "getBook").unwrap();
//! router.insert(Method::GET, "/assets/*key", "getAsset").unwrap();
//!
//! let found = router.at(&Method::GET, "/assets/covers/42.png").unwrap();
//! assert_eq!(*found.value, "getAsset");
//! assert_eq!(found.params.get("key"), Some("covers/42.png"));
//!
//! let err = router.at(&Method::POST, "/books/42").unwrap_err();
//! assert!(matches!(err, MatchError::MethodNotAllowed { .. }));
//! ```
//!
//! # Layout
//!
//! ```text
//!                (root)
//!                  │
//!          ┌───────┴───────┐
//!       "books"         "assets"
//!          │               │
//!        "{id}"          "*key"
//!          │               │
//!        [GET]           [GET]
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::{MatchError, RouteError};
pub use method_router::MethodRouter;
pub use params::Params;
pub use router::Router;

/// A successful match: the bound value and the captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// Value bound to the matched `(method, template)`.
    pub value: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a match result.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}
