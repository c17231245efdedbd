//! Typed configuration for Iris.
//!
//! Configuration is layered: defaults, then an optional TOML or JSON file,
//! then `IRIS__SECTION__KEY` environment variables. Unknown fields are
//! rejected.
//!
//! # Example
//!
//! ```no_run
//! use iris_config::ConfigLoader;
//!
//! # fn main() -> Result<(), iris_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("iris.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("IRIS")
//!     .load()?;
//!
//! println!("JSON:API mounted at {}", config.json_api.rest_api_root);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:3000"
//! mount_path = "/"
//! request_timeout_ms = 30000
//! shutdown_timeout_secs = 30
//! trust_request_ids = false
//!
//! [json_api]
//! rest_api_root = "/api"
//! require_type = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `IRIS__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `IRIS__JSON_API__REST_API_ROOT=/v1`
//! - `IRIS__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
