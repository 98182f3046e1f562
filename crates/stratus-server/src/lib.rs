//! # Stratus Server
//!
//! Request dispatch and local serving for Stratus functions.
//!
//! - [`LambdaRouter`] binds `(method, template)` pairs to handlers, each with
//!   its own middleware, and answers unknown paths with 404 and unknown
//!   methods with 405 plus an `Allow` header.
//! - [`adapter`] converts between hyper messages and gateway events.
//! - [`Server`] serves a router over HTTP/1.1 with graceful shutdown.
//!
//! In production the gateway invokes [`LambdaRouter::handle`] directly; the
//! HTTP server exists for local development and tests.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod adapter;
mod config;
mod error;
mod router;
mod server;
pub mod shutdown;

pub use adapter::{AdapterError, HttpResponse, REQUEST_ID_HEADER};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::{ServerError, ServerResult};
pub use router::{IntoShared, LambdaRouter, ALLOW};
pub use server::Server;
pub use shutdown::ShutdownSignal;
