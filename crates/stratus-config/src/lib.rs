//! Typed configuration for Stratus functions.
//!
//! Configuration is layered: defaults, then a TOML or JSON document, then
//! environment variables of the form `STRATUS__SECTION__KEY`. Unknown
//! fields are rejected, and [`ConfigLoader::load`] validates the result.
//!
//! ```no_run
//! use stratus_config::ConfigLoader;
//!
//! # fn main() -> Result<(), stratus_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("stratus.toml")?
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [cors]
//! headers = "Authorization,Content-Type"
//! methods = "GET,POST,PUT,DELETE"
//! origin = "*"
//!
//! [errors]
//! expose_server_errors = false
//!
//! [jwt]
//! secret = "change-me"
//! algorithm = "HS256"
//! leeway_secs = 0
//!
//! [logging]
//! level = "info"
//! format = "json"
//! service_name = "books"
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{StratusConfig, SUPPORTED_ALGORITHMS};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{CorsSection, ErrorsSection, JwtSection, LoggingSection, ServerSection};
pub use stratus_telemetry::LogFormat;
