//! JSON:API media type constants.

/// The registered JSON:API media type, matched on `Accept` and `Content-Type`.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// `Content-Type` value stamped on every in-pipeline response.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json; charset=utf-8";

/// `Content-Type` of native JSON responses.
pub const NATIVE_JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
