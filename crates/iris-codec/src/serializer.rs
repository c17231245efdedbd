//! Document Serializer.
//!
//! Three entry points ([`Serializer::single`], [`Serializer::collection`],
//! [`Serializer::relationship`]) share one resource-object builder.
//! Serialization never fails: a field the record lacks is omitted, and a
//! field the descriptor does not declare is dropped.

use crate::links::LinkBuilder;
use indexmap::IndexMap;
use iris_core::{
    key_to_string, Attributes, BoxRecord, Document, Linkage, Links, Record, RelationshipObject,
    ResourceDescriptor, ResourceIdentifier, ResourceObject,
};

/// Turns records into JSON:API documents.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'a> {
    links: &'a LinkBuilder,
}

impl<'a> Serializer<'a> {
    /// Creates a serializer that builds URLs with `links`.
    pub fn new(links: &'a LinkBuilder) -> Self {
        Self { links }
    }

    /// Builds a resource object with relationship links but no linkage.
    pub fn resource_object(
        &self,
        record: &dyn Record,
        descriptor: &ResourceDescriptor,
    ) -> ResourceObject {
        self.resource_object_with_linkage(record, descriptor, &IndexMap::new())
    }

    /// Builds a resource object, attaching `data` to the relations present
    /// in `preloaded`.
    pub fn resource_object_with_linkage(
        &self,
        record: &dyn Record,
        descriptor: &ResourceDescriptor,
        preloaded: &IndexMap<String, Linkage>,
    ) -> ResourceObject {
        let id = record_id(record, descriptor);

        let mut attributes = Attributes::new();
        for field in descriptor.attribute_fields() {
            if field == record.primary_key_field() {
                continue;
            }
            if let Some(value) = record.get(field) {
                attributes.insert(field.to_string(), value.clone());
            }
        }

        let relationships = descriptor
            .relations()
            .iter()
            .map(|relation| {
                let name = relation.name();
                let object = RelationshipObject {
                    links: Links::with_related(
                        self.links.relationship(descriptor, &id, name),
                        self.links.related(descriptor, &id, name),
                    ),
                    data: preloaded.get(name).cloned(),
                };
                (name.to_string(), object)
            })
            .collect();

        ResourceObject {
            resource_type: descriptor.plural_name().to_string(),
            links: Links::to_self(self.links.resource(descriptor, &id)),
            id,
            attributes,
            relationships,
        }
    }

    /// `{ data: <resource object> }`.
    pub fn single(&self, record: &dyn Record, descriptor: &ResourceDescriptor) -> Document {
        Document::Single {
            data: Box::new(self.resource_object(record, descriptor)),
        }
    }

    /// `{ data: [...], links: { self } }`, preserving input order.
    ///
    /// An empty slice yields `data: []`.
    pub fn collection(
        &self,
        records: &[BoxRecord],
        descriptor: &ResourceDescriptor,
        self_url: impl Into<String>,
    ) -> Document {
        Document::Collection {
            data: records
                .iter()
                .map(|record| self.resource_object(record.as_ref(), descriptor))
                .collect(),
            links: Links::to_self(self_url),
        }
    }

    /// `{ links: { self, related }, data: [{ type, id }] }`.
    ///
    /// `target` describes the related records. Zero records yields `data: []`.
    pub fn relationship(
        &self,
        records: &[BoxRecord],
        target: &ResourceDescriptor,
        self_url: impl Into<String>,
        related_url: impl Into<String>,
    ) -> Document {
        Document::Relationship {
            data: identifiers(records, target),
            links: Links::with_related(self_url, related_url),
        }
    }
}

/// `{ type, id }` pairs for `records`, in order.
fn identifiers(
    records: &[BoxRecord],
    target: &ResourceDescriptor,
) -> Vec<ResourceIdentifier> {
    records
        .iter()
        .map(|record| {
            ResourceIdentifier::new(target.plural_name(), record_id(record.as_ref(), target))
        })
        .collect()
}

fn record_id(record: &dyn Record, descriptor: &ResourceDescriptor) -> String {
    match record
        .get(descriptor.primary_key())
        .or_else(|| record.primary_key())
    {
        Some(value) => key_to_string(value),
        None => {
            tracing::debug!(
                resource_type = descriptor.type_name(),
                "record has no primary key value"
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::MapRecord;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn links() -> LinkBuilder {
        LinkBuilder::new("http://127.0.0.1:3000", "/api")
    }

    fn posts() -> ResourceDescriptor {
        ResourceDescriptor::builder("post")
            .field("title")
            .field("content")
            .has_many("comments", "comment")
            .build()
    }

    fn comments() -> ResourceDescriptor {
        ResourceDescriptor::builder("comment").field("body").build()
    }

    fn record(value: Value) -> BoxRecord {
        MapRecord::from_value("id", value).boxed()
    }

    #[test]
    fn test_resource_object() {
        let links = links();
        let post = record(json!({"id": 1, "title": "my post", "content": "body"}));
        let object = Serializer::new(&links).resource_object(post.as_ref(), &posts());

        assert_eq!(object.resource_type, "posts");
        assert_eq!(object.id, "1");
        assert_eq!(
            Value::Object(object.attributes.clone()),
            json!({"title": "my post", "content": "body"})
        );
        assert_eq!(object.links.self_link, "http://127.0.0.1:3000/api/posts/1");

        let rel = &object.relationships["comments"];
        assert_eq!(
            rel.links.self_link,
            "http://127.0.0.1:3000/api/posts/1/relationships/comments"
        );
        assert_eq!(
            rel.links.related.as_deref(),
            Some("http://127.0.0.1:3000/api/posts/1/comments")
        );
        assert!(rel.data.is_none());
    }

    #[test]
    fn test_whitelist_and_missing_fields() {
        let links = links();
        let post = record(json!({"id": "abc", "title": "t", "internal": true}));
        let object = Serializer::new(&links).resource_object(post.as_ref(), &posts());

        assert_eq!(object.id, "abc");
        assert!(object.attributes.get("internal").is_none());
        assert!(object.attributes.get("content").is_none());
        assert_eq!(object.attributes.len(), 1);
    }

    #[test]
    fn test_preloaded_linkage() {
        let links = links();
        let post = record(json!({"id": 2, "title": "t"}));
        let mut preloaded = IndexMap::new();
        preloaded.insert(
            "comments".to_string(),
            Linkage::ToMany(vec![ResourceIdentifier::new("comments", "9")]),
        );
        let object = Serializer::new(&links).resource_object_with_linkage(
            post.as_ref(),
            &posts(),
            &preloaded,
        );
        assert_eq!(
            object.relationships["comments"].data,
            Some(Linkage::ToMany(vec![ResourceIdentifier::new("comments", "9")]))
        );
    }

    #[test]
    fn test_empty_collection() {
        let links = links();
        let doc = Serializer::new(&links).collection(&[], &posts(), "http://h/api/posts");
        assert_eq!(
            doc.to_value(),
            json!({"data": [], "links": {"self": "http://h/api/posts"}})
        );
    }

    #[test]
    fn test_relationship_document() {
        let links = links();
        let serializer = Serializer::new(&links);

        let empty = serializer.relationship(&[], &comments(), "self-url", "related-url");
        assert_eq!(
            empty.to_value(),
            json!({"data": [], "links": {"self": "self-url", "related": "related-url"}})
        );

        let one = serializer.relationship(
            &[record(json!({"id": 1, "body": "hi", "postId": 1}))],
            &comments(),
            "self-url",
            "related-url",
        );
        assert_eq!(one.to_value()["data"], json!([{"type": "comments", "id": "1"}]));
        assert_eq!(one.kind(), "relationship");
    }

    fn attribute_map() -> impl Strategy<Value = Vec<(String, i64)>> {
        proptest::collection::vec(("[a-z]{1,8}", any::<i64>()), 0..8)
    }

    proptest! {
        /// `attributes` never carries the key and `id` is always a string.
        #[test]
        fn key_never_in_attributes(id in any::<i64>(), fields in attribute_map()) {
            let mut builder = ResourceDescriptor::builder("thing");
            let mut values = serde_json::Map::new();
            for (name, value) in &fields {
                builder = builder.field(name.clone());
                values.insert(name.clone(), json!(value));
            }
            values.insert("id".into(), json!(id));
            let descriptor = builder.build();
            let links = links();

            let object = Serializer::new(&links)
                .resource_object(&MapRecord::new("id", values), &descriptor);
            prop_assert!(!object.attributes.contains_key("id"));
            prop_assert_eq!(object.id, id.to_string());
        }

        /// Collections keep length and order; `links.self` is always present.
        #[test]
        fn collection_preserves_order(ids in proptest::collection::vec(any::<u32>(), 0..16)) {
            let links = links();
            let records: Vec<BoxRecord> = ids.iter().map(|id| record(json!({"id": id}))).collect();
            let doc = Serializer::new(&links).collection(&records, &comments(), "self");
            match doc {
                Document::Collection { data, links } => {
                    let got: Vec<String> = data.into_iter().map(|o| o.id).collect();
                    let want: Vec<String> = ids.iter().map(ToString::to_string).collect();
                    prop_assert_eq!(got, want);
                    prop_assert_eq!(links.self_link, "self");
                }
                other => prop_assert!(false, "unexpected document {:?}", other),
            }
        }
    }
}
