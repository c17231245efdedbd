//! # Iris Middleware
//!
//! The fixed-order request pipeline that wraps every request the host
//! serves, and the stages that make up the JSON:API translation layer's
//! request-level behavior.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → Negotiation → Tracing → Handler
//!                                                  ↓
//! Response ← Finalizer ← ErrorDocument ←───────────┘
//! ```
//!
//! | Stage | Middleware     | Purpose                                        |
//! |-------|----------------|------------------------------------------------|
//! | 1     | Request ID     | Assign request id (UUID v7)                    |
//! | 2     | Negotiation    | `InPipeline` vs `Bypass` from media types      |
//! | 3     | Tracing        | Request span, completion log, metrics          |
//! | 4     | Finalizer      | `Content-Type`, `Location` on creation         |
//! | 5     | Error Document | `errors` body on every in-pipeline failure     |
//!
//! Bypassed requests flow through the same chain, but no stage alters
//! their response.
//!
//! ## Example
//!
//! ```
//! use iris_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 5);
//! assert_eq!(stages[1].name(), "negotiation");
//! ```

#![doc(html_root_url = "https://docs.rs/iris-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use stages::is_json_api;
pub use types::{CreatedResource, JsonApiBody, NativeBody, Request, Response, ResponseExt};
