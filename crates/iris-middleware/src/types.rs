//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use iris_core::{Document, NATIVE_JSON_CONTENT_TYPE};

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Response extension marking a body that already is a JSON:API document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonApiBody;

/// Response extension marking a native response that in-pipeline stages
/// must pass through unchanged.
///
/// Set on responses of endpoints the adapter left native, including every
/// endpoint of a type declared after the layer was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBody;

/// Response extension carrying the canonical URL of a newly created resource.
///
/// The finalizer copies it into `Location` on `201 Created` responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedResource {
    /// Canonical `self` URL of the new resource.
    pub location: String,
}

/// Extension trait for building responses without fallible builders.
pub trait ResponseExt {
    /// A JSON:API document response, tagged with [`JsonApiBody`].
    ///
    /// `Content-Type` is left for the finalizer.
    fn document(status: StatusCode, document: &Document) -> Response;

    /// A native JSON response.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;

    /// A response with no body.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn document(status: StatusCode, document: &Document) -> Response {
        let body = serde_json::to_vec(document).unwrap_or_default();
        let mut response = with_status(status, Bytes::from(body));
        response.extensions_mut().insert(JsonApiBody);
        response
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        let mut response = with_status(status, Bytes::from(body.to_string()));
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(NATIVE_JSON_CONTENT_TYPE),
        );
        response
    }

    fn empty(status: StatusCode) -> Response {
        with_status(status, Bytes::new())
    }
}

fn with_status(status: StatusCode, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}
