//! Document Deserializer.

use iris_core::{Attributes, InboundDocument, IrisError, IrisResult, ResourceDescriptor};
use serde_json::Value;

/// Knobs for inbound document handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Reject documents whose `data.type` is absent.
    pub require_type: bool,
}

/// Flattens `{ data: { type, id?, attributes } }` into storage attributes.
///
/// Checks, in order: `data` must be an object; `data.type` must be present
/// when [`DeserializeOptions::require_type`] is set (a mismatching type is
/// tolerated and dropped); `data.id`, when present, is parsed back to the
/// key's native type and stored under the primary-key field, taking
/// precedence over an attribute of the same name.
///
/// # Example
///
/// ```
/// use iris_codec::{deserialize, DeserializeOptions};
/// use iris_core::ResourceDescriptor;
/// use serde_json::json;
///
/// let posts = ResourceDescriptor::builder("post").field("title").build();
/// let body = json!({"data": {"type": "posts", "id": "7", "attributes": {"title": "t"}}});
///
/// let attributes = deserialize(&body, &posts, DeserializeOptions::default()).unwrap();
/// assert_eq!(attributes["id"], json!(7));
/// assert_eq!(attributes["title"], json!("t"));
/// ```
pub fn deserialize(
    body: &Value,
    descriptor: &ResourceDescriptor,
    options: DeserializeOptions,
) -> IrisResult<Attributes> {
    if !body.is_object() {
        return Err(IrisError::malformed("request document must be a JSON object"));
    }
    let document: InboundDocument = serde_json::from_value(body.clone())
        .map_err(|e| IrisError::malformed(format!("invalid `data` member: {e}")))?;
    let data = document
        .data
        .ok_or_else(|| IrisError::malformed("missing top-level `data` member"))?;

    match data.resource_type.as_deref() {
        None if options.require_type => {
            return Err(IrisError::malformed("missing `data.type` member"));
        }
        None => {
            tracing::debug!(
                resource_type = descriptor.plural_name(),
                "inbound document has no type"
            );
        }
        Some(declared) if declared != descriptor.plural_name() => {
            tracing::debug!(
                expected = descriptor.plural_name(),
                declared,
                "inbound document type mismatch tolerated"
            );
        }
        Some(_) => {}
    }

    let mut attributes = data.attributes.unwrap_or_default();
    if let Some(id) = data.id.filter(|id| !id.is_null()) {
        let key = descriptor.key_type().coerce(&id).ok_or_else(|| {
            IrisError::malformed(format!(
                "`data.id` {id} is not a valid {} key",
                descriptor.type_name()
            ))
        })?;
        attributes.insert(descriptor.primary_key().to_string(), key);
    }
    Ok(attributes)
}

/// Parses raw body bytes, then [`deserialize`]s them.
///
/// Empty or non-JSON bodies are malformed.
pub fn deserialize_slice(
    body: &[u8],
    descriptor: &ResourceDescriptor,
    options: DeserializeOptions,
) -> IrisResult<Attributes> {
    if body.is_empty() {
        return Err(IrisError::malformed("request body is empty"));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| IrisError::malformed(format!("request body is not valid JSON: {e}")))?;
    deserialize(&value, descriptor, options)
}
