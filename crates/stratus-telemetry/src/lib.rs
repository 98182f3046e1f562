//! # Stratus Telemetry
//!
//! Logging setup for Stratus services.
//!
//! Library crates only emit `tracing` events; binaries call
//! [`init_logging`] once at startup to decide where those events go.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
