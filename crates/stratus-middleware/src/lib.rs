//! # Stratus Middleware
//!
//! Composable request processing for Stratus handlers.
//!
//! A [`Pipeline`] wraps a terminal [`Handler`](stratus_core::Handler) in an
//! ordered list of [`Middleware`] stages. The first stage is outermost. Each
//! stage gets the mutable [`RequestContext`](stratus_core::RequestContext)
//! and may record values in it, answer on its own, or call [`Next`].
//!
//! ```text
//! Request → LogRequest → AllowOptions → InjectContext → DecodeClaims → Handler
//!                                                                        ↓
//! Response ← LogRequest ←─────────────────────────────────────────────────┘
//! ```
//!
//! Stages never return errors. Failures become responses built by the
//! context's [`Responder`](stratus_core::Responder), so CORS headers and
//! server error redaction apply to them like to any other response.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{Endpoint, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::{AllowOptions, DecodeClaims, InjectContext, LogRequest};
