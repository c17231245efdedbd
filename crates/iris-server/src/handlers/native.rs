//! The host's native REST endpoints.
//!
//! Records render through [`Record::to_value`]. Failures render as
//!
//! ```json
//! {"error": {"statusCode": 422, "name": "ValidationError", "message": "...", "details": {...}}}
//! ```
//!
//! [`Record::to_value`]: iris_core::Record::to_value

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use iris_core::{ErrorCategory, IrisError, IrisResult, ResourceDescriptor, Storage};
use iris_middleware::{Response, ResponseExt};
use serde_json::{json, Map, Value};

use super::{parse_json, path_id};
use crate::routes::{Endpoint, RouteMatch};

/// Serves one matched native route.
///
/// `declared` resolves relation targets.
pub async fn handle(
    storage: &dyn Storage,
    declared: &[Arc<ResourceDescriptor>],
    route: &RouteMatch,
    method: &Method,
    body: &Bytes,
) -> Response {
    match dispatch(storage, declared, route, method, body).await {
        Ok(response) => response,
        Err(error) => error_response(&error),
    }
}

async fn dispatch(
    storage: &dyn Storage,
    declared: &[Arc<ResourceDescriptor>],
    route: &RouteMatch,
    method: &Method,
    body: &Bytes,
) -> IrisResult<Response> {
    let descriptor = route.route().resource().as_ref();

    match route.route().endpoint() {
        Endpoint::Create => {
            let attributes = attributes(body)?;
            let record = storage.create(descriptor, attributes).await?;
            Ok(Response::json(StatusCode::OK, &record.to_value()))
        }
        Endpoint::Find => {
            let records = storage.find(descriptor).await?;
            let values: Vec<Value> = records.iter().map(|r| r.to_value()).collect();
            Ok(Response::json(StatusCode::OK, &Value::Array(values)))
        }
        Endpoint::Count => {
            let count = storage.count(descriptor).await?;
            Ok(Response::json(StatusCode::OK, &json!({ "count": count })))
        }
        Endpoint::FindById => {
            let (raw, id) = path_id(route, descriptor)?;
            let record = storage
                .find_by_id(descriptor, &id)
                .await?
                .ok_or_else(|| IrisError::not_found_resource(descriptor.type_name(), raw))?;
            Ok(Response::json(StatusCode::OK, &record.to_value()))
        }
        Endpoint::Exists => {
            let exists = match descriptor.key_type().parse(route.id().unwrap_or_default()) {
                Some(id) => storage.exists(descriptor, &id).await?,
                None => false,
            };
            if *method == Method::HEAD {
                let status = if exists { StatusCode::OK } else { StatusCode::NOT_FOUND };
                return Ok(Response::empty(status));
            }
            Ok(Response::json(StatusCode::OK, &json!({ "exists": exists })))
        }
        Endpoint::Update => {
            let (_, id) = path_id(route, descriptor)?;
            let attributes = attributes(body)?;
            let record = storage.update(descriptor, &id, attributes).await?;
            Ok(Response::json(StatusCode::OK, &record.to_value()))
        }
        Endpoint::Destroy => {
            let count = match path_id(route, descriptor) {
                Ok((_, id)) => storage.destroy(descriptor, &id).await?,
                Err(_) => 0,
            };
            Ok(Response::json(StatusCode::OK, &json!({ "count": count })))
        }
        Endpoint::Related(name) | Endpoint::Relationship(name) => {
            let (raw, id) = path_id(route, descriptor)?;
            let relation = descriptor.relation(name).ok_or_else(|| {
                IrisError::internal(format!("'{}' has no relation '{name}'", descriptor.type_name()))
            })?;
            let target = declared
                .iter()
                .find(|d| d.type_name() == relation.target_type())
                .ok_or_else(|| {
                    IrisError::internal(format!(
                        "relation target '{}' is not declared",
                        relation.target_type()
                    ))
                })?;
            if !storage.exists(descriptor, &id).await? {
                return Err(IrisError::not_found_resource(descriptor.type_name(), raw));
            }
            let records = storage.fetch_related(descriptor, &id, relation, target).await?;
            let values: Vec<Value> = records.iter().map(|r| r.to_value()).collect();
            Ok(Response::json(StatusCode::OK, &Value::Array(values)))
        }
    }
}

fn attributes(body: &Bytes) -> IrisResult<Map<String, Value>> {
    match parse_json(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(IrisError::malformed("request body must be a JSON object")),
    }
}

/// Renders an error in the native envelope.
#[must_use]
pub fn error_response(error: &IrisError) -> Response {
    let status = error.status_code();
    if error.category() == ErrorCategory::Internal {
        tracing::warn!(error = %error, "native handler failed");
    }

    let mut envelope = Map::new();
    envelope.insert("statusCode".into(), json!(status.as_u16()));
    envelope.insert("name".into(), json!(error_name(error.category())));
    envelope.insert("message".into(), json!(error.message()));
    if let IrisError::Validation {
        resource_type,
        failures,
    } = error
    {
        let mut codes = Map::new();
        let mut messages = Map::new();
        for failure in failures {
            push_entry(&mut codes, &failure.field, &failure.code);
            push_entry(&mut messages, &failure.field, &failure.message);
        }
        envelope.insert(
            "details".into(),
            json!({ "context": resource_type, "codes": codes, "messages": messages }),
        );
    }

    Response::json(status, &json!({ "error": envelope }))
}

/// Native error for a path no route serves.
#[must_use]
pub fn route_not_found(method: &Method, path: &str) -> Response {
    error_response(&IrisError::not_found(format!(
        "There is no method to handle {method} {path}"
    )))
}

/// Native error for a known path with an unsupported method.
#[must_use]
pub fn method_not_allowed(method: &Method, path: &str) -> Response {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    Response::json(
        status,
        &json!({
            "error": {
                "statusCode": status.as_u16(),
                "name": "MethodNotAllowedError",
                "message": format!("{method} is not allowed on {path}"),
            }
        }),
    )
}

const fn error_name(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Malformed => "BadRequestError",
        ErrorCategory::Validation => "ValidationError",
        ErrorCategory::NotFound => "NotFoundError",
        ErrorCategory::Internal => "InternalServerError",
    }
}

fn push_entry(map: &mut Map<String, Value>, field: &str, value: &str) {
    let entry = map
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        items.push(Value::String(value.to_string()));
    }
}
