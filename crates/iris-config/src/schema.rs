//! Configuration schema types.

use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use iris_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.mount_path, "/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Path prefix of the host's native REST endpoints.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// Upper bound for reading one request body, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Reuse a valid incoming `X-Request-ID` instead of generating one.
    #[serde(default)]
    pub trust_request_ids: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            mount_path: default_mount_path(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            trust_request_ids: false,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_mount_path() -> String {
    "/".to_string()
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// JSON:API section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JsonApiConfig {
    /// URL prefix used in every generated link.
    #[serde(default = "default_rest_api_root", alias = "restApiRoot")]
    pub rest_api_root: String,

    /// Reject inbound documents without `data.type`.
    #[serde(default, alias = "requireType")]
    pub require_type: bool,
}

impl Default for JsonApiConfig {
    fn default() -> Self {
        Self {
            rest_api_root: default_rest_api_root(),
            require_type: false,
        }
    }
}

fn default_rest_api_root() -> String {
    "/api".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts the section into the subscriber settings `init_logging` takes.
    #[must_use]
    pub fn to_log_config(&self) -> iris_telemetry::LogConfig {
        iris_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.include_location,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:3000");
        assert_eq!(config.mount_path, "/");
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert!(!config.trust_request_ids);
    }

    #[test]
    fn test_server_config_unknown_field_rejected() {
        let toml = r#"
            http_addr = "127.0.0.1:3000"
            unknown_field = "value"
        "#;
        let result: Result<ServerConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_api_defaults() {
        let config = JsonApiConfig::default();
        assert_eq!(config.rest_api_root, "/api");
        assert!(!config.require_type);
    }

    #[test]
    fn test_json_api_camel_case_alias() {
        let config: JsonApiConfig =
            serde_json::from_str(r#"{"restApiRoot": "/v2", "requireType": true}"#).unwrap();
        assert_eq!(config.rest_api_root, "/v2");
        assert!(config.require_type);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert!(serde_json::from_str::<LogFormat>(r#""xml""#).is_err());
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Default::default()
        };
        let log = section.to_log_config();
        assert_eq!(log.level, "debug");
        assert!(!log.json_format);
        assert!(log.file_line_info);
    }
}
