//! Top-level configuration.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stratus_core::{CorsConfig, ResponseConfig};
use stratus_telemetry::{LogConfig, LogFormat};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{CorsSection, ErrorsSection, JwtSection, LoggingSection, ServerSection};

/// Algorithms accepted for `jwt.algorithm`.
pub const SUPPORTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Complete configuration of a Stratus function.
///
/// ```
/// use stratus_config::StratusConfig;
///
/// let config = StratusConfig::default();
/// assert!(config.errors.expose_server_errors);
/// assert_eq!(config.jwt.algorithm, "HS256");
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StratusConfig {
    /// Local HTTP server.
    pub server: ServerSection,

    /// CORS header values.
    pub cors: CorsSection,

    /// Error response policy.
    pub errors: ErrorsSection,

    /// Bearer token verification.
    pub jwt: JwtSection,

    /// Logging output.
    pub logging: LoggingSection,
}

impl StratusConfig {
    /// Debug logging in pretty format, permissive CORS, verbose errors.
    #[must_use]
    pub fn development() -> Self {
        Self {
            cors: CorsSection {
                headers: Some("*".to_string()),
                methods: Some("*".to_string()),
                origin: Some("*".to_string()),
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// JSON logging and redacted server errors.
    #[must_use]
    pub fn production() -> Self {
        Self {
            errors: ErrorsSection {
                expose_server_errors: false,
            },
            ..Self::default()
        }
    }

    /// Checks values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        self.socket_addr()?;

        stratus_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        if !SUPPORTED_ALGORITHMS.contains(&self.jwt.algorithm.as_str()) {
            return Err(ConfigError::invalid_value(
                "jwt.algorithm",
                format!(
                    "'{}' is not one of {}",
                    self.jwt.algorithm,
                    SUPPORTED_ALGORITHMS.join(", ")
                ),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// The bind address, parsed.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for `server.http_addr`.
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        self.server
            .http_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ConfigError::invalid_value(
                    "server.http_addr",
                    format!("'{}': {e}", self.server.http_addr),
                )
            })
    }

    /// Shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Settings for the response builder.
    #[must_use]
    pub fn response_config(&self) -> ResponseConfig {
        ResponseConfig::default()
            .with_cors(CorsConfig {
                allow_headers: self.cors.headers.clone(),
                allow_methods: self.cors.methods.clone(),
                allow_origin: self.cors.origin.clone(),
            })
            .with_expose_server_errors(self.errors.expose_server_errors)
    }

    /// Settings for [`stratus_telemetry::init_logging`].
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Pretty => LogConfig::development(),
            LogFormat::Json => LogConfig::production(),
        };
        base.with_level(self.logging.level.as_str())
            .with_service_name(self.logging.service_name.as_str())
    }
}
