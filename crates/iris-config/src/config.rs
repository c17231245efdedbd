//! The top-level [`IrisConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, JsonApiConfig, LogFormat, LoggingConfig, ServerConfig};

/// Complete Iris server configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use iris_config::IrisConfig;
///
/// let config = IrisConfig::default();
/// assert_eq!(config.json_api.rest_api_root, "/api");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct IrisConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// JSON:API layer configuration.
    #[serde(default, alias = "jsonApi")]
    pub json_api: JsonApiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IrisConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> IrisConfigBuilder {
        IrisConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `server.http_addr` is not a socket address
    /// - `server.mount_path` or `json_api.rest_api_root` lacks a leading `/`
    /// - `server.request_timeout_ms` is zero
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if !self.server.mount_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "server.mount_path",
                "must start with '/'",
            ));
        }

        if !self.json_api.rest_api_root.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "json_api.rest_api_root",
                "must start with '/'",
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if let Err(e) = iris_telemetry::logging::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }

    /// Pretty debug logging with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:3000".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// JSON info logging.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

/// Builder for [`IrisConfig`].
#[derive(Debug, Default)]
pub struct IrisConfigBuilder {
    server: Option<ServerConfig>,
    json_api: Option<JsonApiConfig>,
    logging: Option<LoggingConfig>,
}

impl IrisConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the JSON:API configuration.
    #[must_use]
    pub fn json_api(mut self, json_api: JsonApiConfig) -> Self {
        self.json_api = Some(json_api);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration; unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> IrisConfig {
        IrisConfig {
            server: self.server.unwrap_or_default(),
            json_api: self.json_api.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<IrisConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
