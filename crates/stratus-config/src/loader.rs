//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning:
//!
//! 1. built-in defaults (or a preset);
//! 2. a TOML or JSON document, from a file or a string;
//! 3. environment variables named `PREFIX__SECTION__KEY`.
//!
//! ```
//! use stratus_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_string("[errors]\nexpose_server_errors = false", "toml")
//!     .unwrap()
//!     .with_vars([("STRATUS__CORS__ORIGIN", "*")])
//!     .load()
//!     .unwrap();
//!
//! assert!(!config.errors.expose_server_errors);
//! assert_eq!(config.cors.origin.as_deref(), Some("*"));
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use stratus_telemetry::LogFormat;

use crate::config::StratusConfig;
use crate::error::{ConfigError, ConfigResult};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "STRATUS";

/// Builds a [`StratusConfig`] from defaults, a document and the environment.
#[derive(Debug)]
pub struct ConfigLoader {
    config: StratusConfig,
    env_prefix: String,
    vars: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from the defaults with the `STRATUS` prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: StratusConfig::default(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            vars: None,
        }
    }

    /// Starts from [`StratusConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = StratusConfig::development();
        self
    }

    /// Starts from [`StratusConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = StratusConfig::production();
        self
    }

    /// Replaces the configuration with a file, chosen by extension
    /// (`.toml` or `.json`). Sections missing from the file get defaults.
    ///
    /// # Errors
    ///
    /// Missing or unreadable files, unknown extensions, parse errors and
    /// unknown fields.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) for files that exist.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the configuration with a `toml` or `json` document.
    ///
    /// # Errors
    ///
    /// Unknown formats, parse errors and unknown fields.
    pub fn with_string(mut self, content: &str, format: &str) -> ConfigResult<Self> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Changes the environment variable prefix.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_uppercase();
        self
    }

    /// Reads overrides from `vars` instead of the process environment.
    #[must_use]
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Loads `.env` from the working directory into the process
    /// environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Dotenv`] when the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> ConfigResult<Self> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Malformed overrides and failed validation.
    pub fn load(mut self) -> ConfigResult<StratusConfig> {
        let vars = match self.vars.take() {
            Some(vars) => vars,
            None => env::vars().collect(),
        };

        let prefix = format!("{}__", self.env_prefix);
        let mut overrides: Vec<_> = vars
            .iter()
            .filter_map(|(key, value)| key.strip_prefix(&prefix).map(|rest| (key, rest, value)))
            .collect();
        // Stable order keeps error reporting deterministic.
        overrides.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (key, rest, value) in overrides {
            self.apply_env_var(key, rest, value)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> StratusConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }

            ["CORS", "HEADERS"] => config.cors.headers = non_empty(value),
            ["CORS", "METHODS"] => config.cors.methods = non_empty(value),
            ["CORS", "ORIGIN"] => config.cors.origin = non_empty(value),

            ["ERRORS", "EXPOSE_SERVER_ERRORS"] => {
                config.errors.expose_server_errors = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse(key, "expected boolean"))?;
            }

            ["JWT", "SECRET"] => config.jwt.secret = value.to_string(),
            ["JWT", "ALGORITHM"] => config.jwt.algorithm = value.to_uppercase(),
            ["JWT", "LEEWAY_SECS"] => config.jwt.leeway_secs = parse_number(key, value)?,

            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "SERVICE_NAME"] => config.logging.service_name = value.to_string(),

            // Unrelated variables that happen to share the prefix.
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> ConfigResult<StratusConfig> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_number(key: &str, value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(key, "expected a non-negative integer"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> ConfigLoader {
        ConfigLoader::new().with_vars(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_defaults_load() {
        let config = no_env().load().unwrap();
        assert_eq!(config, StratusConfig::default());
    }

    #[test]
    fn test_cors_from_env() {
        let config = no_env()
            .with_vars([
                ("STRATUS__CORS__HEADERS", "Authorization,Content-Type"),
                ("STRATUS__CORS__METHODS", "GET,POST"),
                ("STRATUS__CORS__ORIGIN", ""),
            ])
            .load()
            .unwrap();

        assert_eq!(config.cors.headers.as_deref(), Some("Authorization,Content-Type"));
        assert_eq!(config.cors.methods.as_deref(), Some("GET,POST"));
        assert_eq!(config.cors.origin, None);
    }

    #[test]
    fn test_env_overrides_document() {
        let toml = r#"
            [server]
            http_addr = "127.0.0.1:3000"

            [jwt]
            secret = "from-file"
        "#;
        let config = no_env()
            .with_string(toml, "toml")
            .unwrap()
            .with_vars([
                ("STRATUS__JWT__SECRET", "from-env"),
                ("STRATUS__JWT__ALGORITHM", "hs512"),
                ("STRATUS__ERRORS__EXPOSE_SERVER_ERRORS", "off"),
                ("OTHER__JWT__SECRET", "ignored"),
            ])
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.jwt.secret, "from-env");
        assert_eq!(config.jwt.algorithm, "HS512");
        assert!(!config.errors.expose_server_errors);
    }

    #[test]
    fn test_custom_prefix() {
        let config = ConfigLoader::new()
            .with_env_prefix("books")
            .with_vars([("BOOKS__LOGGING__FORMAT", "pretty"), ("STRATUS__LOGGING__LEVEL", "nope=")])
            .load()
            .unwrap();

        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_env_values() {
        let err = no_env()
            .with_vars([("STRATUS__SERVER__SHUTDOWN_TIMEOUT_SECS", "soon")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { ref var, .. } if var == "STRATUS__SERVER__SHUTDOWN_TIMEOUT_SECS"));

        let err = no_env()
            .with_vars([("STRATUS__ERRORS__EXPOSE_SERVER_ERRORS", "maybe")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { .. }));
    }

    #[test]
    fn test_validation_runs_after_env() {
        let err = no_env()
            .with_vars([("STRATUS__SERVER__HTTP_ADDR", "not-an-address")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{"errors": {"expose_server_errors": false}, "logging": {"format": "pretty"}}"#;
        let config = no_env().with_string(json, "JSON").unwrap().load().unwrap();
        assert!(!config.errors.expose_server_errors);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_format_and_fields() {
        assert!(matches!(
            no_env().with_string("a: 1", "yaml"),
            Err(ConfigError::UnsupportedFormat(ref f)) if f == "yaml"
        ));
        assert!(matches!(
            no_env().with_string("[cors]\nallow_all = true", "toml"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_presets() {
        let config = no_env().with_production().load().unwrap();
        assert!(!config.errors.expose_server_errors);

        let config = no_env().with_development().load().unwrap();
        assert_eq!(config.cors.origin.as_deref(), Some("*"));
    }
}
