//! # Stratus Core
//!
//! Shared types for the Stratus dispatch layer:
//!
//! - [`GatewayRequest`] / [`GatewayResponse`] - the gateway event model
//! - [`RequestContext`] - typed per-request state built by middleware
//! - [`StandardClaims`] / [`ExpandedClaims`] - decoded JWT claim shapes
//! - [`IdentifierParams`] - longest-wins identifier resolution
//! - [`Responder`] - JSON, error and file responses with CORS
//! - [`HttpError`] / [`StratusError`] - error types
//! - [`Handler`] - the terminal handler trait

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod claims;
pub mod context;
mod error;
mod event;
mod handler;
pub mod params;
pub mod response;

pub use claims::{ClaimSet, Claims, ExpandedClaims, StandardClaims};
pub use context::RequestContext;
pub use error::{
    reason_phrase, HttpError, StratusError, StratusResult, GENERIC_SERVER_MESSAGE,
    NO_AUTHORIZATION_HEADER,
};
pub use event::{GatewayRequest, GatewayResponse, RequestMetadata};
pub use handler::{BoxFuture, Handler, HandlerResult};
pub use params::IdentifierParams;
pub use response::{CorsConfig, Responder, ResponseConfig};
