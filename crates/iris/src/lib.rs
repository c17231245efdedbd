//! # Iris
//!
//! **JSON:API translation and negotiation for REST resource servers**
//!
//! Iris sits in front of a host's native REST endpoints. Requests that
//! declare `application/vnd.api+json` are negotiated into the JSON:API
//! pipeline, where inbound documents are flattened for storage and
//! results are rendered as JSON:API documents with canonical links. Every
//! other request is served by the native endpoints, untouched.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use iris::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("IRIS").load()?;
//!     init_logging(&config.logging.to_log_config())?;
//!
//!     let mut app = App::from_config(Arc::new(MyStorage::default()), &config.server);
//!     app.model(ResourceDescriptor::builder("post").field("title").has_many("comments", "comment").build());
//!     app.model(ResourceDescriptor::builder("comment").field("body").field("postId").build());
//!     install(&mut app, &JsonApiOptions::from(&config.json_api))?;
//!
//!     Server::new(app, &config.server).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → Negotiation → Tracing → Finalizer → ErrorDocument → Dispatch
//!                            │                                                 │
//!                            └── bypass: native route table ◄─────────────────┤
//!                                json_api: adapted route table ◄──────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/iris/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use iris_codec as codec;
pub use iris_config as config;
pub use iris_core as core;
pub use iris_middleware as middleware;
pub use iris_server as server;
pub use iris_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use iris::prelude::*;
/// ```
pub mod prelude {
    pub use iris_core::{
        Attributes, BoxRecord, Document, FieldFailure, IrisError, IrisResult, KeyType, MapRecord,
        ModelRegistry, Record, ResourceDescriptor, Storage, ValidationFailures,
    };

    pub use iris_codec::{LinkBuilder, Serializer};

    pub use iris_config::{ConfigLoader, IrisConfig};

    pub use iris_server::{install, install_with_adapter, App, JsonApiOptions, Server, ShutdownSignal};

    pub use iris_telemetry::{init_logging, init_metrics, LogConfig};
}
