//! Request handlers for matched routes.
//!
//! [`native`] renders the host's own JSON shapes. [`json_api`] serves the
//! adapted endpoints with documents. Both take the whole request body
//! already buffered.

pub mod json_api;
pub mod native;

use bytes::Bytes;
use iris_core::{IrisError, IrisResult, ResourceDescriptor};
use serde_json::Value;

use crate::routes::RouteMatch;

/// Parses the `{id}` path parameter into the key's native type.
///
/// An id that cannot be a key of this type names no record.
fn path_id(route: &RouteMatch, descriptor: &ResourceDescriptor) -> IrisResult<(String, Value)> {
    let raw = route
        .id()
        .ok_or_else(|| IrisError::internal("route has no id parameter"))?;
    descriptor
        .key_type()
        .parse(raw)
        .map(|id| (raw.to_string(), id))
        .ok_or_else(|| IrisError::not_found_resource(descriptor.type_name(), raw))
}

fn parse_json(body: &Bytes) -> IrisResult<Value> {
    if body.is_empty() {
        return Err(IrisError::malformed("request body is empty"));
    }
    serde_json::from_slice(body)
        .map_err(|e| IrisError::malformed(format!("request body is not valid JSON: {e}")))
}
