//! Pipeline stages.
//!
//! ## Pre-Handler Stages
//!
//! 1. [`request_id`] - Assign request id
//! 2. [`negotiation`] - JSON:API media-type gate
//! 3. [`tracing`] - Request span and metrics
//!
//! ## Post-Handler Stages
//!
//! 4. [`finalizer`] - `Content-Type` and `Location`
//! 5. [`error_document`] - `errors` body on every failure

pub mod error_document;
pub mod finalizer;
pub mod negotiation;
pub mod request_id;
pub mod tracing;

pub use error_document::ErrorDocumentMiddleware;
pub use finalizer::FinalizerMiddleware;
pub use negotiation::{is_json_api, NegotiationMiddleware};
pub use request_id::RequestIdMiddleware;
pub use self::tracing::TracingMiddleware;
