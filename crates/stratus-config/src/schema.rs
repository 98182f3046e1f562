//! Configuration sections.
//!
//! Every section rejects unknown fields and fills missing ones with
//! defaults, so a file only needs the values it changes.

use serde::{Deserialize, Serialize};
use stratus_telemetry::LogFormat;

/// Local HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address, e.g. `127.0.0.1:8080`.
    pub http_addr: String,

    /// Grace period for open connections on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            shutdown_timeout_secs: 30,
            request_timeout_ms: 30_000,
        }
    }
}

/// CORS header values. Unset or empty values leave the header out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsSection {
    /// `Access-Control-Allow-Headers`.
    pub headers: Option<String>,

    /// `Access-Control-Allow-Methods`.
    pub methods: Option<String>,

    /// `Access-Control-Allow-Origin`.
    pub origin: Option<String>,
}

/// Error response policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorsSection {
    /// Send 5xx messages verbatim instead of the reason phrase.
    pub expose_server_errors: bool,
}

impl Default for ErrorsSection {
    fn default() -> Self {
        Self {
            expose_server_errors: true,
        }
    }
}

/// Bearer token verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtSection {
    /// Shared HMAC secret.
    pub secret: String,

    /// `HS256`, `HS384` or `HS512`.
    pub algorithm: String,

    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtSection {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: "HS256".to_string(),
            leeway_secs: 0,
        }
    }
}

impl std::fmt::Debug for JwtSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSection")
            .field("secret", &if self.secret.is_empty() { "" } else { "<redacted>" })
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directives, e.g. `info` or `stratus_server=debug`.
    pub level: String,

    /// `json` or `pretty`.
    pub format: LogFormat,

    /// Service name reported at startup.
    pub service_name: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            service_name: "stratus".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let server: ServerSection = toml::from_str(r#"http_addr = "0.0.0.0:9000""#).unwrap();
        assert_eq!(server.http_addr, "0.0.0.0:9000");
        assert_eq!(server.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = toml::from_str::<ErrorsSection>("expose = false").unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_secret_is_not_printed() {
        let jwt = JwtSection {
            secret: "hunter2".to_string(),
            ..JwtSection::default()
        };
        let printed = format!("{jwt:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("HS256"));
    }
}
