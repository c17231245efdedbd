//! # Iris Core
//!
//! Core types and traits for the Iris JSON:API translation layer.
//!
//! This crate provides the foundational types used throughout Iris:
//!
//! - [`ModelRegistry`] - Read-only snapshot of declared resource types
//! - [`ResourceDescriptor`] - Fields, primary key and relations of one type
//! - [`Record`] - Capability interface over storage-layer records
//! - [`Storage`] - The storage collaborator the pipeline calls into
//! - [`Document`] - JSON:API top-level document shapes
//! - [`IrisError`] - Standard error types
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/iris-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod descriptor;
pub mod document;
mod error;
pub mod media;
pub mod record;
mod storage;

pub use context::{PipelineMode, RequestId};
pub use descriptor::{
    KeyType, ModelRegistry, ModelRegistryBuilder, RegistryError, RelationDescriptor, RelationKind,
    ResourceDescriptor, ResourceDescriptorBuilder,
};
pub use document::{
    Document, ErrorObject, ErrorSource, InboundData, InboundDocument, Linkage, Links,
    RelationshipObject, ResourceIdentifier, ResourceObject,
};
pub use error::{ErrorCategory, FieldFailure, IrisError, IrisResult, ValidationFailures};
pub use media::{JSON_API_CONTENT_TYPE, JSON_API_MEDIA_TYPE, NATIVE_JSON_CONTENT_TYPE};
pub use record::{key_to_string, Attributes, BoxRecord, MapRecord, Record};
pub use storage::Storage;
