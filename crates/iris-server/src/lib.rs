//! # Iris Server
//!
//! The REST resource server the JSON:API layer is installed on.
//!
//! - [`App`] - declared resource types, native REST endpoints, dispatch
//! - [`install`] - snapshots models, adapts endpoints, enables negotiation
//! - [`AdapterRegistry`] - per-type `{predicate, transform}` rules
//! - [`Server`] - HTTP/1.1 via Hyper with graceful shutdown
//!
//! ## Routing
//!
//! Two route tables exist once the layer is installed. The native table
//! serves bypassed requests exactly as before. The in-pipeline table is
//! derived from it by the adapter: scalar endpoints such as `count` are
//! removed, the rest are wrapped to speak JSON:API, and every to-many
//! relation gains a `relationships` route. Both tables match paths under the
//! app's mount path; `rest_api_root` only shapes generated links.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use iris_core::ResourceDescriptor;
//! use iris_server::{install, App, JsonApiOptions, Server};
//!
//! let mut app = App::from_config(storage, &config.server);
//! app.model(ResourceDescriptor::builder("post").field("title").build());
//! install(&mut app, &JsonApiOptions::from(&config.json_api))?;
//! Server::new(app, &config.server).run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/iris-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod adapter;
mod app;
pub mod handlers;
mod install;
pub mod routes;
mod server;
pub mod shutdown;

pub use adapter::{default_rules, AdapterRegistry, AdapterRule, Transform};
pub use app::App;
pub use install::{install, install_with_adapter, JsonApiOptions, JsonApiState, DEFAULT_REST_API_ROOT};
pub use routes::{Dispatch, Endpoint, RouteTable};
pub use server::{Server, ServerError};
pub use shutdown::ShutdownSignal;
