//! JSON:API document types.
//!
//! Outbound shapes ([`Document`], [`ResourceObject`], [`RelationshipObject`],
//! [`ErrorObject`]) and the inbound request shape ([`InboundDocument`]).
//! A document carries either `data` or `errors`, never both.

use crate::record::Attributes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `{ type, id }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// Plural resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Stringified primary key.
    pub id: String,
}

impl ResourceIdentifier {
    /// Creates an identifier.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

/// A `links` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// Canonical URL of the enclosing object.
    #[serde(rename = "self")]
    pub self_link: String,
    /// URL of the related resources, on relationship objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

impl Links {
    /// `{ self }` only.
    pub fn to_self(self_link: impl Into<String>) -> Self {
        Self {
            self_link: self_link.into(),
            related: None,
        }
    }

    /// `{ self, related }`.
    pub fn with_related(self_link: impl Into<String>, related: impl Into<String>) -> Self {
        Self {
            self_link: self_link.into(),
            related: Some(related.into()),
        }
    }
}

/// Resource linkage inside a relationship object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    /// Ordered to-many linkage; may be empty.
    ToMany(Vec<ResourceIdentifier>),
    /// To-one linkage.
    ToOne(ResourceIdentifier),
    /// Linkage known to be empty for a to-one relation.
    Null,
}

/// A member of `relationships`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipObject {
    /// `self` and `related` URLs.
    pub links: Links,
    /// Omitted unless the caller supplied pre-loaded linkage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Linkage>,
}

/// One record rendered as a JSON:API resource object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    /// Plural resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Stringified primary key.
    pub id: String,
    /// Declared fields, primary key excluded.
    pub attributes: Attributes,
    /// Declared relations by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<String, RelationshipObject>,
    /// `{ self }`.
    pub links: Links,
}

impl ResourceObject {
    /// The `{ type, id }` of this object.
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.resource_type.clone(), self.id.clone())
    }
}

/// `source` member of an error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// Pointer into the request document, `data/attributes/<field>`.
    pub pointer: String,
}

/// One entry of a top-level `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// HTTP status.
    pub status: u16,
    /// Offending member, for field-level failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    /// Short summary.
    pub title: String,
    /// Machine-readable code.
    pub code: String,
    /// Human-readable explanation.
    pub detail: String,
}

/// A top-level JSON:API document.
///
/// Deserialization tries the variants in declaration order; an empty
/// `data: []` with `links` always reads back as [`Document::Collection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    /// `{ errors: [...] }`.
    Errors {
        /// Error objects, at least one.
        errors: Vec<ErrorObject>,
    },
    /// `{ data: {...} }`.
    Single {
        /// The resource.
        data: Box<ResourceObject>,
    },
    /// `{ data: [...], links: { self } }`.
    Collection {
        /// Resources in storage order.
        data: Vec<ResourceObject>,
        /// Collection URL.
        links: Links,
    },
    /// `{ links: { self, related }, data: [{ type, id }] }`.
    Relationship {
        /// Linkage in storage order.
        data: Vec<ResourceIdentifier>,
        /// Relationship and related URLs.
        links: Links,
    },
}

impl Document {
    /// Wraps error objects.
    pub fn errors(errors: Vec<ErrorObject>) -> Self {
        Self::Errors { errors }
    }

    /// Returns `true` for an errors document.
    pub const fn is_errors(&self) -> bool {
        matches!(self, Self::Errors { .. })
    }

    /// Short label used in logs and metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Errors { .. } => "errors",
            Self::Single { .. } => "single",
            Self::Collection { .. } => "collection",
            Self::Relationship { .. } => "relationship",
        }
    }

    /// Renders the document as JSON.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `data` member of an inbound request document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundData {
    /// Declared type, if any.
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,
    /// Client-supplied id, string or number.
    #[serde(default)]
    pub id: Option<Value>,
    /// Attribute values.
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

/// `{ data: { type, id?, attributes } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundDocument {
    /// Primary data; absent is malformed.
    #[serde(default)]
    pub data: Option<InboundData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource() -> ResourceObject {
        let mut attributes = Attributes::new();
        attributes.insert("title".into(), json!("hello"));
        ResourceObject {
            resource_type: "posts".into(),
            id: "1".into(),
            attributes,
            relationships: IndexMap::new(),
            links: Links::to_self("http://h/api/posts/1"),
        }
    }

    #[test]
    fn test_single_document_shape() {
        let doc = Document::Single {
            data: Box::new(resource()),
        };
        let value = doc.to_value();
        let keys: Vec<_> = value["data"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["type", "id", "attributes", "links"]);
        assert_eq!(value["data"]["links"], json!({"self": "http://h/api/posts/1"}));
        assert_eq!(doc.kind(), "single");
    }

    #[test]
    fn test_empty_collection_keeps_data() {
        let doc = Document::Collection {
            data: vec![],
            links: Links::to_self("http://h/api/posts"),
        };
        assert_eq!(
            doc.to_value(),
            json!({"data": [], "links": {"self": "http://h/api/posts"}})
        );
    }

    #[test]
    fn test_relationship_without_linkage_omits_data() {
        let rel = RelationshipObject {
            links: Links::with_related("a/relationships/c", "a/c"),
            data: None,
        };
        let value = serde_json::to_value(&rel).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["links"]["related"], "a/c");
    }

    #[test]
    fn test_linkage_serialization() {
        assert_eq!(serde_json::to_value(Linkage::Null).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(Linkage::ToMany(vec![])).unwrap(),
            json!([])
        );
        assert_eq!(
            serde_json::to_value(Linkage::ToOne(ResourceIdentifier::new("posts", "1"))).unwrap(),
            json!({"type": "posts", "id": "1"})
        );
    }

    #[test]
    fn test_error_object_without_source() {
        let error = ErrorObject {
            status: 404,
            source: None,
            title: "Not Found".into(),
            code: "not_found".into(),
            detail: "gone".into(),
        };
        let value = serde_json::to_value(Document::errors(vec![error])).unwrap();
        assert!(value["errors"][0].get("source").is_none());
        assert_eq!(value["errors"][0]["status"], 404);
    }

    #[test]
    fn test_inbound_document_parse() {
        let doc: InboundDocument = serde_json::from_value(json!({
            "data": {"type": "posts", "id": 5, "attributes": {"title": "x"}}
        }))
        .unwrap();
        let data = doc.data.unwrap();
        assert_eq!(data.resource_type.as_deref(), Some("posts"));
        assert_eq!(data.id, Some(json!(5)));

        let empty: InboundDocument = serde_json::from_value(json!({})).unwrap();
        assert!(empty.data.is_none());
    }
}
