//! Error types for Iris.
//!
//! This module provides the [`IrisError`] type, the failure taxonomy shared by
//! the codec, the storage collaborator and the request pipeline.
//!
//! | Variant             | Category     | Status |
//! |---------------------|--------------|--------|
//! | `MalformedDocument` | `Malformed`  | 400    |
//! | `Validation`        | `Validation` | 422    |
//! | `NotFound`          | `NotFound`   | 404    |
//! | `Internal`          | `Internal`   | 500    |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`IrisError`].
pub type IrisResult<T> = Result<T, IrisError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Inbound document is structurally unusable.
    Malformed,
    /// Field-level rule violations reported by storage.
    Validation,
    /// Resource not found.
    NotFound,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Malformed => StatusCode::BAD_REQUEST,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable code used when no rule code applies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed_document",
            Self::Validation => "validation_failed",
            Self::NotFound => "not_found",
            Self::Internal => "internal_error",
        }
    }
}

/// Standard error type for Iris.
///
/// # Example
///
/// ```
/// use iris_core::{ErrorCategory, IrisError};
///
/// let error = IrisError::malformed("missing top-level `data`");
/// assert_eq!(error.category(), ErrorCategory::Malformed);
/// assert_eq!(error.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
pub enum IrisError {
    /// The inbound request document is missing required members.
    #[error("Malformed document: {message}")]
    MalformedDocument {
        /// Human-readable error message.
        message: String,
    },

    /// Storage-layer validation rejected one or more fields.
    #[error("Validation failed for {resource_type}")]
    Validation {
        /// Resource type being written.
        resource_type: String,
        /// Ordered field failures.
        #[source]
        failures: ValidationFailures,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The type of resource that was not found.
        resource_type: Option<String>,
        /// The identifier of the resource.
        resource_id: Option<String>,
    },

    /// Any other failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl IrisError {
    /// Creates a malformed-document error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Creates a validation error carrying ordered field failures.
    #[must_use]
    pub fn validation(resource_type: impl Into<String>, failures: ValidationFailures) -> Self {
        Self::Validation {
            resource_type: resource_type.into(),
            failures,
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource_type: None,
            resource_id: None,
        }
    }

    /// Creates a not found error with resource context.
    #[must_use]
    pub fn not_found_resource(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        Self::NotFound {
            message: format!("Unknown \"{resource_type}\" id \"{resource_id}\"."),
            resource_type: Some(resource_type),
            resource_id: Some(resource_id),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedDocument { .. } => ErrorCategory::Malformed,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the client-facing message, without the category prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MalformedDocument { message }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. } => message.clone(),
            Self::Validation { failures, .. } => failures.to_string(),
        }
    }

    /// Returns the field failures when this is a validation error.
    #[must_use]
    pub fn failures(&self) -> Option<&ValidationFailures> {
        match self {
            Self::Validation { failures, .. } => Some(failures),
            _ => None,
        }
    }
}

/// A single `{ field, code, message }` rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    /// Field that failed.
    pub field: String,
    /// Rule code, e.g. `presence`.
    pub code: String,
    /// Human-readable message, e.g. `can't be blank`.
    pub message: String,
}

impl FieldFailure {
    /// Creates a field failure.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Field failures in the order storage validated them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationFailures(Vec<FieldFailure>);

impl ValidationFailures {
    /// Creates an empty set of failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.push(FieldFailure::new(field, code, message));
    }

    /// Returns `true` if there are no failures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates failures in reported order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldFailure> {
        self.0.iter()
    }
}

impl std::fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("validation failed");
        }
        let details: Vec<String> = self
            .0
            .iter()
            .map(|failure| format!("`{}` {}", failure.field, failure.message))
            .collect();
        write!(f, "The instance is not valid. Details: {}.", details.join("; "))
    }
}

impl std::error::Error for ValidationFailures {}

impl FromIterator<FieldFailure> for ValidationFailures {
    fn from_iter<I: IntoIterator<Item = FieldFailure>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ValidationFailures {
    type Item = &'a FieldFailure;
    type IntoIter = std::slice::Iter<'a, FieldFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
