//! Observability for Iris.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` facade
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `iris_requests_total` | Counter | `mode`, `status` | Total request count |
//! | `iris_request_duration_seconds` | Histogram | `mode` | Request latency |
//! | `iris_documents_total` | Counter | `kind` | JSON:API documents emitted |
//!
//! `mode` is `json_api` for requests that went through the JSON:API
//! pipeline and `bypass` for everything else.
//!
//! # Example
//!
//! ```rust,ignore
//! use iris_telemetry::{init_logging, init_metrics, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! let handle = init_metrics()?;
//! println!("{}", handle.render());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
