//! In-pipeline handlers.
//!
//! Each handler calls storage the same way the native endpoint does, then
//! renders the outcome as a document. Failures go through the error
//! translator, so the response body is always either `data` or `errors`.
//!
//! | Endpoint       | Success                                      |
//! |----------------|----------------------------------------------|
//! | create         | 201, single document, `Location`             |
//! | find           | 200, collection, `links.self` = collection   |
//! | findById       | 200, single document                         |
//! | update         | 200, single document                         |
//! | destroy        | 204, no body                                 |
//! | related        | 200, collection of the target type           |
//! | relationship   | 200, relationship document                   |

use bytes::Bytes;
use http::request::Parts;
use http::StatusCode;
use iris_codec::{deserialize_slice, translate, DeserializeOptions, LinkBuilder, Serializer};
use iris_core::{
    key_to_string, Attributes, BoxRecord, Document, IrisError, IrisResult, ModelRegistry,
    RelationDescriptor, ResourceDescriptor, Storage,
};
use iris_middleware::{CreatedResource, Response, ResponseExt};
use serde_json::Value;
use std::sync::Arc;

use super::path_id;
use crate::install::JsonApiOptions;
use crate::routes::{Endpoint, RouteMatch};

/// Per-request inputs of an in-pipeline handler.
pub struct JsonApiRequest<'a> {
    /// Storage collaborator.
    pub storage: &'a dyn Storage,
    /// Install-time model snapshot.
    pub models: &'a ModelRegistry,
    /// Install options.
    pub options: &'a JsonApiOptions,
    /// Matched in-pipeline route.
    pub route: &'a RouteMatch,
    /// Request head, for link origins.
    pub parts: &'a Parts,
    /// Buffered request body.
    pub body: &'a Bytes,
}

/// Serves one adapted route.
pub async fn handle(request: JsonApiRequest<'_>) -> Response {
    let links = LinkBuilder::from_request(
        &request.parts.headers,
        &request.parts.uri,
        &request.options.rest_api_root,
    );
    match dispatch(&request, &links).await {
        Ok(response) => response,
        Err(error) => {
            let (status, document) = translate(&error);
            document_response(status, &document)
        }
    }
}

async fn dispatch(request: &JsonApiRequest<'_>, links: &LinkBuilder) -> IrisResult<Response> {
    let storage = request.storage;
    let route = request.route;
    let descriptor = descriptor_of(request);
    let descriptor = descriptor.as_ref();
    let serializer = Serializer::new(links);

    match route.route().endpoint() {
        Endpoint::Create => {
            let attributes = inbound(request, descriptor)?;
            let record = storage.create(descriptor, attributes).await?;
            let document = serializer.single(record.as_ref(), descriptor);
            let mut response = document_response(StatusCode::CREATED, &document);
            if let Some(location) = self_link(&document) {
                response.extensions_mut().insert(CreatedResource { location });
            }
            Ok(response)
        }
        Endpoint::Find => {
            let records = storage.find(descriptor).await?;
            let document = serializer.collection(&records, descriptor, links.collection(descriptor));
            Ok(document_response(StatusCode::OK, &document))
        }
        Endpoint::FindById => {
            let (raw, id) = path_id(route, descriptor)?;
            let record = storage
                .find_by_id(descriptor, &id)
                .await?
                .ok_or_else(|| IrisError::not_found_resource(descriptor.type_name(), raw))?;
            Ok(document_response(
                StatusCode::OK,
                &serializer.single(record.as_ref(), descriptor),
            ))
        }
        Endpoint::Update => {
            let (_, id) = path_id(route, descriptor)?;
            let mut attributes = inbound(request, descriptor)?;
            strip_key(&mut attributes, descriptor, &id);
            let record = storage.update(descriptor, &id, attributes).await?;
            Ok(document_response(
                StatusCode::OK,
                &serializer.single(record.as_ref(), descriptor),
            ))
        }
        Endpoint::Destroy => {
            let (raw, id) = path_id(route, descriptor)?;
            match storage.destroy(descriptor, &id).await? {
                0 => Err(IrisError::not_found_resource(descriptor.type_name(), raw)),
                _ => Ok(Response::empty(StatusCode::NO_CONTENT)),
            }
        }
        Endpoint::Related(name) => {
            let (raw, id) = path_id(route, descriptor)?;
            let (relation, target) = relation_of(request.models, descriptor, name)?;
            let records = related(storage, descriptor, &raw, &id, relation, target).await?;
            let key = key_to_string(&id);
            let document =
                serializer.collection(&records, target, links.related(descriptor, &key, name));
            Ok(document_response(StatusCode::OK, &document))
        }
        Endpoint::Relationship(name) => {
            let (raw, id) = path_id(route, descriptor)?;
            let (relation, target) = relation_of(request.models, descriptor, name)?;
            let records = related(storage, descriptor, &raw, &id, relation, target).await?;
            let key = key_to_string(&id);
            let document = serializer.relationship(
                &records,
                target,
                links.relationship(descriptor, &key, name),
                links.related(descriptor, &key, name),
            );
            Ok(document_response(StatusCode::OK, &document))
        }
        Endpoint::Count | Endpoint::Exists => Err(IrisError::internal(format!(
            "{} has no document representation",
            route.route().endpoint().name()
        ))),
    }
}

/// The snapshot's descriptor for the route's type.
fn descriptor_of(request: &JsonApiRequest<'_>) -> Arc<ResourceDescriptor> {
    let resource = request.route.route().resource();
    request
        .models
        .descriptor_for(resource.type_name())
        .map_or_else(|| Arc::clone(resource), Arc::clone)
}

fn inbound(request: &JsonApiRequest<'_>, descriptor: &ResourceDescriptor) -> IrisResult<Attributes> {
    let options = DeserializeOptions {
        require_type: request.options.require_type,
    };
    deserialize_slice(request.body, descriptor, options)
}

/// The path id names the record; a different `data.id` is dropped.
fn strip_key(attributes: &mut Attributes, descriptor: &ResourceDescriptor, id: &Value) {
    if let Some(sent) = attributes.remove(descriptor.primary_key()) {
        if sent != *id {
            tracing::debug!(
                resource = descriptor.type_name(),
                path_id = %key_to_string(id),
                document_id = %key_to_string(&sent),
                "ignoring document id that differs from path id"
            );
        }
    }
}

fn relation_of<'m>(
    models: &'m ModelRegistry,
    descriptor: &'m ResourceDescriptor,
    name: &str,
) -> IrisResult<(&'m RelationDescriptor, &'m ResourceDescriptor)> {
    let relation = descriptor.relation(name).ok_or_else(|| {
        IrisError::internal(format!("'{}' has no relation '{name}'", descriptor.type_name()))
    })?;
    let target = models.target_of(relation).ok_or_else(|| {
        IrisError::internal(format!("relation target '{}' is not registered", relation.target_type()))
    })?;
    Ok((relation, target.as_ref()))
}

async fn related(
    storage: &dyn Storage,
    owner: &ResourceDescriptor,
    raw: &str,
    id: &Value,
    relation: &RelationDescriptor,
    target: &ResourceDescriptor,
) -> IrisResult<Vec<BoxRecord>> {
    if !storage.exists(owner, id).await? {
        return Err(IrisError::not_found_resource(owner.type_name(), raw));
    }
    storage.fetch_related(owner, id, relation, target).await
}

fn self_link(document: &Document) -> Option<String> {
    match document {
        Document::Single { data } => Some(data.links.self_link.clone()),
        _ => None,
    }
}

fn document_response(status: StatusCode, document: &Document) -> Response {
    iris_telemetry::metrics::record_document(document.kind());
    Response::document(status, document)
}
