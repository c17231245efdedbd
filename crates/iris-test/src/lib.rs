//! # Iris Test
//!
//! In-memory test utilities for Iris apps: requests go straight into
//! [`App::handle`](iris_server::App::handle) through the full pipeline,
//! without binding a port.
//!
//! - [`TestClient`] - fluent requests against an app
//! - [`TestResponse`] - buffered response with status, header and document assertions
//! - [`MemoryStorage`] - an ordered in-memory [`Storage`](iris_core::Storage) with
//!   presence validation
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use iris_core::ResourceDescriptor;
//! use iris_server::{install, App, JsonApiOptions};
//! use iris_test::{MemoryStorage, TestClient};
//!
//! #[tokio::test]
//! async fn test_create_post() {
//!     let mut app = App::new(Arc::new(MemoryStorage::new()));
//!     app.model(ResourceDescriptor::builder("post").field("title").build());
//!     install(&mut app, &JsonApiOptions::default()).unwrap();
//!
//!     let response = TestClient::new(app)
//!         .json_api()
//!         .post("/posts")
//!         .json(&json!({"data": {"type": "posts", "attributes": {"title": "t"}}}))
//!         .send()
//!         .await;
//!
//!     response.assert_status(StatusCode::CREATED).assert_json_api();
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/iris-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;
mod storage;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
pub use storage::MemoryStorage;
