//! Error Translator.
//!
//! | Failure             | Status | Title                   | Pointer                   |
//! |---------------------|--------|-------------------------|---------------------------|
//! | `Validation`        | 422    | `ValidationError`       | `data/attributes/<field>` |
//! | `MalformedDocument` | 400    | `Bad Request`           | none                      |
//! | `NotFound`          | 404    | `Not Found`             | none                      |
//! | `Internal`          | 500    | `Internal Server Error` | none                      |

use http::StatusCode;
use iris_core::{Document, ErrorObject, ErrorSource, IrisError};

const VALIDATION_TITLE: &str = "ValidationError";
const POINTER_PREFIX: &str = "data/attributes/";

/// Translates a failure into its status and `errors` document.
pub fn translate(error: &IrisError) -> (StatusCode, Document) {
    (error.status_code(), Document::errors(error_objects(error)))
}

/// Error objects for a failure; never empty.
///
/// Validation failures yield one object per field failure, in reported
/// order. A validation failure without field entries still yields one.
pub fn error_objects(error: &IrisError) -> Vec<ErrorObject> {
    let status = error.status_code();
    match error {
        IrisError::Validation { failures, .. } if !failures.is_empty() => failures
            .iter()
            .map(|failure| ErrorObject {
                status: status.as_u16(),
                source: Some(ErrorSource {
                    pointer: format!("{POINTER_PREFIX}{}", failure.field),
                }),
                title: VALIDATION_TITLE.to_string(),
                code: failure.code.clone(),
                detail: failure.message.clone(),
            })
            .collect(),
        IrisError::Validation { .. } => vec![ErrorObject {
            status: status.as_u16(),
            source: None,
            title: VALIDATION_TITLE.to_string(),
            code: error.category().code().to_string(),
            detail: error.message(),
        }],
        _ => {
            if matches!(error, IrisError::Internal { .. }) {
                tracing::warn!(error = %error, "translating internal failure");
            }
            vec![ErrorObject {
                code: error.category().code().to_string(),
                detail: error.message(),
                ..status_error_object(status)
            }]
        }
    }
}

/// A bare error object for `status`, titled with its canonical reason.
///
/// Used for failures that never reached storage, such as unknown routes.
pub fn status_error_object(status: StatusCode) -> ErrorObject {
    let title = status.canonical_reason().unwrap_or("Error").to_string();
    ErrorObject {
        status: status.as_u16(),
        source: None,
        code: status_code_name(status).to_string(),
        detail: title.clone(),
        title,
    }
}

fn status_code_name(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "bad_request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not_found",
        405 => "method_not_allowed",
        406 => "not_acceptable",
        409 => "conflict",
        415 => "unsupported_media_type",
        422 => "unprocessable_entity",
        500 => "internal_error",
        503 => "service_unavailable",
        s if (400..500).contains(&s) => "client_error",
        _ => "server_error",
    }
}
