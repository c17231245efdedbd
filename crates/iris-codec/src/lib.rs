//! # Iris Codec
//!
//! Translation between the host's native record shape and JSON:API documents.
//!
//! - [`Serializer`] - records, collections and relationships to [`Document`]s
//! - [`deserialize`] - inbound request documents to flat attributes
//! - [`translate`] - [`IrisError`]s to `errors` documents
//! - [`LinkBuilder`] - canonical `self` / `related` URLs
//!
//! Every function here is synchronous and pure. The only shared input is the
//! read-only [`ResourceDescriptor`].
//!
//! ## Example
//!
//! ```
//! use iris_codec::{LinkBuilder, Serializer};
//! use iris_core::{MapRecord, ResourceDescriptor};
//! use serde_json::json;
//!
//! let posts = ResourceDescriptor::builder("post").field("title").build();
//! let links = LinkBuilder::new("http://localhost:3000", "/api");
//! let record = MapRecord::from_value("id", json!({"id": 1, "title": "hi", "secret": "x"}));
//!
//! let object = Serializer::new(&links).resource_object(&record, &posts);
//! assert_eq!(object.id, "1");
//! assert_eq!(object.links.self_link, "http://localhost:3000/api/posts/1");
//! assert!(object.attributes.get("secret").is_none());
//! ```
//!
//! [`Document`]: iris_core::Document
//! [`IrisError`]: iris_core::IrisError
//! [`ResourceDescriptor`]: iris_core::ResourceDescriptor

#![doc(html_root_url = "https://docs.rs/iris-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod deserializer;
mod errors;
mod links;
mod serializer;

pub use deserializer::{deserialize, deserialize_slice, DeserializeOptions};
pub use errors::{error_objects, status_error_object, translate};
pub use links::LinkBuilder;
pub use serializer::Serializer;
