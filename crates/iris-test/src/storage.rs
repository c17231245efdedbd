//! In-memory [`Storage`] for tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use iris_core::{
    key_to_string, Attributes, BoxRecord, IrisError, IrisResult, KeyType, MapRecord,
    RelationDescriptor, ResourceDescriptor, Storage, ValidationFailures,
};
use parking_lot::RwLock;
use serde_json::Value;

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: IndexMap<String, Attributes>,
}

impl Table {
    fn allocate_id(&mut self, key_type: KeyType) -> Value {
        self.next_id += 1;
        match key_type {
            KeyType::Number => Value::from(self.next_id),
            KeyType::String => Value::String(self.next_id.to_string()),
        }
    }

    fn observe_id(&mut self, id: &Value) {
        if let Some(n) = id.as_i64() {
            self.next_id = self.next_id.max(n);
        }
    }
}

/// Stores rows per resource type in insertion order.
///
/// Numeric keys auto-increment from 1. Presence rules registered with
/// [`validates_presence_of`](Self::validates_presence_of) are checked on
/// create and update, in registration order.
///
/// # Example
///
/// ```
/// use iris_test::MemoryStorage;
///
/// let storage = MemoryStorage::new()
///     .validates_presence_of("post", "title")
///     .validates_presence_of("post", "content");
/// assert_eq!(storage.len("post"), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<IndexMap<String, Table>>,
    presence: Vec<(String, String)>,
}

impl MemoryStorage {
    /// Creates an empty store with no validation rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to be present and non-blank on `type_name` records.
    #[must_use]
    pub fn validates_presence_of(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.presence.push((type_name.into(), field.into()));
        self
    }

    /// Number of stored records of `type_name`.
    #[must_use]
    pub fn len(&self, type_name: &str) -> usize {
        self.tables.read().get(type_name).map_or(0, |t| t.rows.len())
    }

    fn validate(&self, descriptor: &ResourceDescriptor, row: &Attributes) -> IrisResult<()> {
        let mut failures = ValidationFailures::new();
        for (_, field) in self
            .presence
            .iter()
            .filter(|(type_name, _)| type_name == descriptor.type_name())
        {
            if is_blank(row.get(field)) {
                failures.add(field.as_str(), "presence", "can't be blank");
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(IrisError::validation(descriptor.type_name(), failures))
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn record(descriptor: &ResourceDescriptor, row: Attributes) -> BoxRecord {
    MapRecord::new(descriptor.primary_key(), row).boxed()
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create(
        &self,
        descriptor: &ResourceDescriptor,
        mut attributes: Attributes,
    ) -> IrisResult<BoxRecord> {
        self.validate(descriptor, &attributes)?;
        let pk = descriptor.primary_key();

        let mut tables = self.tables.write();
        let table = tables.entry(descriptor.type_name().to_string()).or_default();

        let id = match attributes.remove(pk) {
            Some(Value::Null) | None => table.allocate_id(descriptor.key_type()),
            Some(given) => descriptor.key_type().coerce(&given).ok_or_else(|| {
                IrisError::malformed(format!("Invalid \"{pk}\" value {given}."))
            })?,
        };
        let key = key_to_string(&id);
        if table.rows.contains_key(&key) {
            let mut failures = ValidationFailures::new();
            failures.add(pk, "uniqueness", "is not unique");
            return Err(IrisError::validation(descriptor.type_name(), failures));
        }
        table.observe_id(&id);

        let mut row = Attributes::new();
        row.insert(pk.to_string(), id);
        row.extend(attributes);
        table.rows.insert(key, row.clone());
        Ok(record(descriptor, row))
    }

    async fn update(
        &self,
        descriptor: &ResourceDescriptor,
        id: &Value,
        attributes: Attributes,
    ) -> IrisResult<BoxRecord> {
        let key = key_to_string(id);
        let pk = descriptor.primary_key();

        let mut tables = self.tables.write();
        let row = tables
            .get_mut(descriptor.type_name())
            .and_then(|table| table.rows.get_mut(&key))
            .ok_or_else(|| IrisError::not_found_resource(descriptor.type_name(), &key))?;

        let mut merged = row.clone();
        for (field, value) in attributes {
            if field != pk {
                merged.insert(field, value);
            }
        }
        self.validate(descriptor, &merged)?;
        row.clone_from(&merged);

        Ok(record(descriptor, merged))
    }

    async fn find_by_id(
        &self,
        descriptor: &ResourceDescriptor,
        id: &Value,
    ) -> IrisResult<Option<BoxRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .get(descriptor.type_name())
            .and_then(|table| table.rows.get(&key_to_string(id)))
            .map(|row| record(descriptor, row.clone())))
    }

    async fn find(&self, descriptor: &ResourceDescriptor) -> IrisResult<Vec<BoxRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .get(descriptor.type_name())
            .map(|table| {
                table
                    .rows
                    .values()
                    .map(|row| record(descriptor, row.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn destroy(&self, descriptor: &ResourceDescriptor, id: &Value) -> IrisResult<u64> {
        let mut tables = self.tables.write();
        let removed = tables
            .get_mut(descriptor.type_name())
            .and_then(|table| table.rows.shift_remove(&key_to_string(id)));
        Ok(u64::from(removed.is_some()))
    }

    async fn fetch_related(
        &self,
        _owner: &ResourceDescriptor,
        id: &Value,
        relation: &RelationDescriptor,
        target: &ResourceDescriptor,
    ) -> IrisResult<Vec<BoxRecord>> {
        let key = key_to_string(id);
        let tables = self.tables.read();
        Ok(tables
            .get(target.type_name())
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter(|row| {
                        row.get(relation.foreign_key())
                            .is_some_and(|fk| key_to_string(fk) == key)
                    })
                    .map(|row| record(target, row.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, descriptor: &ResourceDescriptor) -> IrisResult<u64> {
        Ok(self.len(descriptor.type_name()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> ResourceDescriptor {
        ResourceDescriptor::builder("post")
            .field("title")
            .field("content")
            .has_many("comments", "comment")
            .build()
    }

    fn comment() -> ResourceDescriptor {
        ResourceDescriptor::builder("comment").field("body").field("postId").build()
    }

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => Attributes::new(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let storage = MemoryStorage::new();
        let first = storage.create(&post(), attrs(json!({"title": "a"}))).await.unwrap();
        let second = storage.create(&post(), attrs(json!({"title": "b"}))).await.unwrap();
        assert_eq!(first.to_value(), json!({"id": 1, "title": "a"}));
        assert_eq!(second.primary_key(), Some(&json!(2)));
        assert_eq!(storage.count(&post()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_explicit_id_advances_sequence() {
        let storage = MemoryStorage::new();
        storage.create(&post(), attrs(json!({"id": 10}))).await.unwrap();
        let next = storage.create(&post(), attrs(json!({}))).await.unwrap();
        assert_eq!(next.primary_key(), Some(&json!(11)));

        let duplicate = storage.create(&post(), attrs(json!({"id": "10"}))).await.unwrap_err();
        assert_eq!(duplicate.failures().unwrap().iter().next().unwrap().code, "uniqueness");
    }

    #[tokio::test]
    async fn test_presence_failures_in_rule_order() {
        let storage = MemoryStorage::new()
            .validates_presence_of("post", "title")
            .validates_presence_of("post", "content");
        let error = storage
            .create(&post(), attrs(json!({"title": ""})))
            .await
            .unwrap_err();
        let fields: Vec<_> = error.failures().unwrap().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["title", "content"]);
        assert_eq!(storage.len("post"), 0);
    }

    #[tokio::test]
    async fn test_update_merges_and_validates() {
        let storage = MemoryStorage::new().validates_presence_of("post", "title");
        storage.create(&post(), attrs(json!({"title": "a", "content": "x"}))).await.unwrap();

        let updated = storage
            .update(&post(), &json!(1), attrs(json!({"content": "y", "id": 5})))
            .await
            .unwrap();
        assert_eq!(updated.to_value(), json!({"id": 1, "title": "a", "content": "y"}));

        let error = storage
            .update(&post(), &json!(1), attrs(json!({"title": null})))
            .await
            .unwrap_err();
        assert!(error.failures().is_some());

        let missing = storage.update(&post(), &json!(9), Attributes::new()).await.unwrap_err();
        assert_eq!(missing.message(), "Unknown \"post\" id \"9\".");
    }

    #[tokio::test]
    async fn test_destroy_and_find() {
        let storage = MemoryStorage::new();
        storage.create(&post(), attrs(json!({"title": "a"}))).await.unwrap();
        storage.create(&post(), attrs(json!({"title": "b"}))).await.unwrap();

        assert_eq!(storage.destroy(&post(), &json!(1)).await.unwrap(), 1);
        assert_eq!(storage.destroy(&post(), &json!(1)).await.unwrap(), 0);
        assert!(storage.find_by_id(&post(), &json!(1)).await.unwrap().is_none());

        let rest = storage.find(&post()).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].get("title"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_fetch_related_by_foreign_key() {
        let storage = MemoryStorage::new();
        let post_desc = post();
        storage.create(&post_desc, attrs(json!({"title": "a"}))).await.unwrap();
        storage.create(&comment(), attrs(json!({"body": "x", "postId": 1}))).await.unwrap();
        storage.create(&comment(), attrs(json!({"body": "y", "postId": "2"}))).await.unwrap();

        let relation = post_desc.relation("comments").unwrap();
        let related = storage
            .fetch_related(&post_desc, &json!(1), relation, &comment())
            .await
            .unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].get("body"), Some(&json!("x")));
    }
}
