//! Canonical URL construction.

use http::header::HOST;
use http::{HeaderMap, Uri};
use iris_core::ResourceDescriptor;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Builds `self` and `related` URLs for one request.
///
/// | Link         | Shape                                         |
/// |--------------|-----------------------------------------------|
/// | collection   | `<origin><root>/<plural>`                     |
/// | resource     | `<origin><root>/<plural>/<id>`                |
/// | relationship | `<origin><root>/<plural>/<id>/relationships/<rel>` |
/// | related      | `<origin><root>/<plural>/<id>/<rel>`          |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    origin: String,
    root: String,
}

impl LinkBuilder {
    /// Creates a builder from an origin (`scheme://host[:port]`) and a REST root.
    pub fn new(origin: impl Into<String>, rest_api_root: &str) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            root: normalize_root(rest_api_root),
        }
    }

    /// Derives the origin from request headers.
    ///
    /// Scheme comes from `X-Forwarded-Proto` (default `http`); host from
    /// `Host`, then the URI authority, then `localhost`.
    pub fn from_request(headers: &HeaderMap, uri: &Uri, rest_api_root: &str) -> Self {
        let scheme = headers
            .get(FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .or_else(|| uri.authority().map(http::uri::Authority::as_str))
            .unwrap_or("localhost");
        Self::new(format!("{scheme}://{host}"), rest_api_root)
    }

    /// `scheme://host[:port]`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Normalized REST root; empty for `/`.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Collection URL of a resource type.
    pub fn collection(&self, descriptor: &ResourceDescriptor) -> String {
        format!("{}{}/{}", self.origin, self.root, descriptor.plural_name())
    }

    /// Canonical URL of one resource.
    pub fn resource(&self, descriptor: &ResourceDescriptor, id: &str) -> String {
        format!("{}/{}", self.collection(descriptor), id)
    }

    /// Relationship URL: `<resource>/relationships/<relation>`.
    pub fn relationship(&self, descriptor: &ResourceDescriptor, id: &str, relation: &str) -> String {
        format!("{}/relationships/{}", self.resource(descriptor, id), relation)
    }

    /// Related-resources URL: `<resource>/<relation>`.
    pub fn related(&self, descriptor: &ResourceDescriptor, id: &str, relation: &str) -> String {
        format!("{}/{}", self.resource(descriptor, id), relation)
    }
}

/// Strips trailing slashes and guarantees a leading one; `/` becomes empty.
fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
