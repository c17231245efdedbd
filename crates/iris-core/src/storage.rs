//! The storage collaborator.

use crate::descriptor::{RelationDescriptor, ResourceDescriptor};
use crate::error::IrisResult;
use crate::record::{Attributes, BoxRecord};
use async_trait::async_trait;
use serde_json::Value;

/// Persistence and validation, owned by the host.
///
/// Every operation receives the descriptor of the resource type it acts on.
/// Validation failures are reported as [`IrisError::Validation`] with the
/// field failures in the order they were checked; unknown ids as
/// [`IrisError::NotFound`].
///
/// [`IrisError::Validation`]: crate::IrisError::Validation
/// [`IrisError::NotFound`]: crate::IrisError::NotFound
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Persists a new record.
    async fn create(
        &self,
        descriptor: &ResourceDescriptor,
        attributes: Attributes,
    ) -> IrisResult<BoxRecord>;

    /// Merges `attributes` into the record with key `id`.
    async fn update(
        &self,
        descriptor: &ResourceDescriptor,
        id: &Value,
        attributes: Attributes,
    ) -> IrisResult<BoxRecord>;

    /// Loads one record.
    async fn find_by_id(
        &self,
        descriptor: &ResourceDescriptor,
        id: &Value,
    ) -> IrisResult<Option<BoxRecord>>;

    /// Loads every record of a type, in storage order.
    async fn find(&self, descriptor: &ResourceDescriptor) -> IrisResult<Vec<BoxRecord>>;

    /// Deletes one record, returning how many were removed.
    async fn destroy(&self, descriptor: &ResourceDescriptor, id: &Value) -> IrisResult<u64>;

    /// Loads the records reachable through a to-many relation of `owner`.
    async fn fetch_related(
        &self,
        owner: &ResourceDescriptor,
        id: &Value,
        relation: &RelationDescriptor,
        target: &ResourceDescriptor,
    ) -> IrisResult<Vec<BoxRecord>>;

    /// Counts records of a type.
    async fn count(&self, descriptor: &ResourceDescriptor) -> IrisResult<u64> {
        let records = self.find(descriptor).await?;
        Ok(records.len() as u64)
    }

    /// Returns `true` if a record with key `id` exists.
    async fn exists(&self, descriptor: &ResourceDescriptor, id: &Value) -> IrisResult<bool> {
        Ok(self.find_by_id(descriptor, id).await?.is_some())
    }
}
