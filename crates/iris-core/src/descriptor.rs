//! Model Registry Snapshot.
//!
//! A [`ModelRegistry`] is built once, at install time, from the resource
//! types the host has declared. It is immutable after [`ModelRegistryBuilder::build`]
//! and is shared as `Arc<ModelRegistry>` with every component that needs
//! descriptor lookups, so concurrent requests read it without locking.
//!
//! # Example
//!
//! ```
//! use iris_core::{KeyType, ModelRegistry, ResourceDescriptor};
//!
//! let registry = ModelRegistry::builder()
//!     .register(
//!         ResourceDescriptor::builder("post")
//!             .field("title")
//!             .field("content")
//!             .has_many("comments", "comment")
//!             .build(),
//!     )
//!     .register(ResourceDescriptor::builder("comment").field("body").build())
//!     .build()
//!     .unwrap();
//!
//! let post = registry.descriptor_for("post").unwrap();
//! assert_eq!(post.plural_name(), "posts");
//! assert_eq!(post.primary_key(), "id");
//! assert_eq!(post.key_type(), KeyType::Number);
//! assert!(registry.descriptor_for_plural("comments").is_some());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Native type of a primary-key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Integer keys, e.g. auto-increment ids.
    #[default]
    Number,
    /// Opaque string keys.
    String,
}

impl KeyType {
    /// Parses a path or document id back into the native key value.
    ///
    /// Returns `None` when the text is not a valid key of this type.
    #[must_use]
    pub fn parse(self, raw: &str) -> Option<Value> {
        match self {
            Self::Number => raw
                .parse::<i64>()
                .ok()
                .map(Value::from)
                .or_else(|| raw.parse::<u64>().ok().map(Value::from)),
            Self::String => Some(Value::String(raw.to_string())),
        }
    }

    /// Coerces a JSON id (string or number) into the native key value.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Number, Value::Number(_)) | (Self::String, Value::String(_)) => {
                Some(value.clone())
            }
            (_, Value::String(s)) => self.parse(s),
            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            _ => None,
        }
    }
}

/// Cardinality of a declared relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// One-to-many.
    ToMany,
}

/// A declared relation from one resource type to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    name: String,
    target_type: String,
    kind: RelationKind,
    foreign_key: String,
}

impl RelationDescriptor {
    /// Relation name as used in URLs and `relationships`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the related resource.
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Relation cardinality.
    pub const fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Field on the target that references the owning record.
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }
}

/// Immutable description of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    type_name: String,
    plural_name: String,
    primary_key: String,
    key_type: KeyType,
    fields: Vec<String>,
    relations: Vec<RelationDescriptor>,
}

impl ResourceDescriptor {
    /// Starts a builder for `type_name`.
    pub fn builder(type_name: impl Into<String>) -> ResourceDescriptorBuilder {
        ResourceDescriptorBuilder::new(type_name)
    }

    /// Singular type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Plural name; the JSON:API `type` and the collection path segment.
    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Primary-key field name.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Native type of the primary key.
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// All declared fields, primary key first.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Declared fields excluding the primary key, in declaration order.
    pub fn attribute_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(move |field| *field != self.primary_key)
    }

    /// Returns `true` if `field` is declared.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Declared relations in declaration order.
    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.relations
    }

    /// Looks up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Builder for [`ResourceDescriptor`].
#[derive(Debug)]
pub struct ResourceDescriptorBuilder {
    type_name: String,
    plural_name: Option<String>,
    primary_key: String,
    key_type: KeyType,
    fields: Vec<String>,
    relations: Vec<RelationDescriptor>,
}

impl ResourceDescriptorBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            plural_name: None,
            primary_key: "id".to_string(),
            key_type: KeyType::Number,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Overrides the default plural (`type_name` + `s`).
    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural_name = Some(plural.into());
        self
    }

    /// Overrides the default primary key (`id`, numeric).
    pub fn primary_key(mut self, field: impl Into<String>, key_type: KeyType) -> Self {
        self.primary_key = field.into();
        self.key_type = key_type;
        self
    }

    /// Declares a field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Declares a one-to-many relation whose foreign key is `<type_name>Id`.
    pub fn has_many(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        let foreign_key = format!("{}Id", self.type_name);
        self.has_many_via(name, target_type, foreign_key)
    }

    /// Declares a one-to-many relation with an explicit foreign key.
    pub fn has_many_via(
        mut self,
        name: impl Into<String>,
        target_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDescriptor {
            name: name.into(),
            target_type: target_type.into(),
            kind: RelationKind::ToMany,
            foreign_key: foreign_key.into(),
        });
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> ResourceDescriptor {
        let plural_name = self
            .plural_name
            .unwrap_or_else(|| format!("{}s", self.type_name));
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        fields.push(self.primary_key.clone());
        fields.extend(
            self.fields
                .into_iter()
                .filter(|field| *field != self.primary_key),
        );
        ResourceDescriptor {
            type_name: self.type_name,
            plural_name,
            primary_key: self.primary_key,
            key_type: self.key_type,
            fields,
            relations: self.relations,
        }
    }
}

/// Errors raised while building a [`ModelRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Type name was empty.
    #[error("resource type name must not be empty")]
    EmptyTypeName,

    /// Two descriptors share a type name.
    #[error("resource type '{0}' registered twice")]
    DuplicateType(String),

    /// Two descriptors share a plural name.
    #[error("plural name '{plural}' used by both '{first}' and '{second}'")]
    DuplicatePlural {
        /// The contested plural.
        plural: String,
        /// First type using it.
        first: String,
        /// Second type using it.
        second: String,
    },

    /// A relation points at an undeclared type.
    #[error("relation '{resource}.{relation}' targets unknown type '{target}'")]
    UnknownRelationTarget {
        /// Owning type.
        resource: String,
        /// Relation name.
        relation: String,
        /// Missing target type.
        target: String,
    },
}

/// Read-only snapshot of every declared resource type.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    types: IndexMap<String, Arc<ResourceDescriptor>>,
    by_plural: HashMap<String, String>,
}

impl ModelRegistry {
    /// Starts a builder.
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Looks up a descriptor by type name.
    pub fn descriptor_for(&self, type_name: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.types.get(type_name)
    }

    /// Looks up a descriptor by plural name.
    pub fn descriptor_for_plural(&self, plural: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.by_plural
            .get(plural)
            .and_then(|type_name| self.types.get(type_name))
    }

    /// Descriptor of the type a relation points at.
    pub fn target_of(&self, relation: &RelationDescriptor) -> Option<&Arc<ResourceDescriptor>> {
        self.types.get(relation.target_type())
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDescriptor>> {
        self.types.values()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder for [`ModelRegistry`].
#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    descriptors: Vec<ResourceDescriptor>,
}

impl ModelRegistryBuilder {
    /// Adds a descriptor.
    pub fn register(mut self, descriptor: ResourceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Adds every descriptor from an iterator.
    pub fn extend(mut self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Validates and freezes the registry.
    pub fn build(self) -> Result<ModelRegistry, RegistryError> {
        let mut types = IndexMap::with_capacity(self.descriptors.len());
        let mut by_plural: HashMap<String, String> = HashMap::with_capacity(self.descriptors.len());

        for descriptor in self.descriptors {
            if descriptor.type_name.is_empty() {
                return Err(RegistryError::EmptyTypeName);
            }
            if types.contains_key(&descriptor.type_name) {
                return Err(RegistryError::DuplicateType(descriptor.type_name));
            }
            if let Some(first) = by_plural.get(&descriptor.plural_name) {
                return Err(RegistryError::DuplicatePlural {
                    plural: descriptor.plural_name.clone(),
                    first: first.clone(),
                    second: descriptor.type_name,
                });
            }
            by_plural.insert(descriptor.plural_name.clone(), descriptor.type_name.clone());
            types.insert(descriptor.type_name.clone(), Arc::new(descriptor));
        }

        for descriptor in types.values() {
            for relation in &descriptor.relations {
                if !types.contains_key(&relation.target_type) {
                    return Err(RegistryError::UnknownRelationTarget {
                        resource: descriptor.type_name.clone(),
                        relation: relation.name.clone(),
                        target: relation.target_type.clone(),
                    });
                }
            }
        }

        Ok(ModelRegistry { types, by_plural })
    }
}
