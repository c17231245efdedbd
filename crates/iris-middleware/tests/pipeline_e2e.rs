//! End-to-end pipeline integration tests.
//!
//! These tests drive the standard five-stage pipeline with stub handlers
//! and check the combined effect of negotiation, header finalization and
//! the error document guarantee.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use http::{Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use iris_core::{Document, Links, JSON_API_CONTENT_TYPE, JSON_API_MEDIA_TYPE};
use iris_middleware::stages::request_id::REQUEST_ID_HEADER;
use iris_middleware::{
    CreatedResource, MiddlewareContext, Pipeline, Request, Response, ResponseExt,
};
use serde_json::{json, Value};

fn make_request(method: &str, path: &str, json_api: bool) -> Request {
    let mut builder = HttpRequest::builder().method(method).uri(path);
    if json_api {
        builder = builder
            .header(ACCEPT, JSON_API_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE);
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn created_document() -> Response {
    let doc = Document::Collection {
        data: vec![],
        links: Links::to_self("http://127.0.0.1/api/posts"),
    };
    let mut response = Response::document(StatusCode::CREATED, &doc);
    response.extensions_mut().insert(CreatedResource {
        location: "http://127.0.0.1/api/posts/1".to_string(),
    });
    response
}

#[tokio::test]
async fn test_in_pipeline_creation_headers() {
    let pipeline = Pipeline::json_api(false);
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            make_request("POST", "/posts", true),
            |ctx, _req| {
                assert!(ctx.is_json_api());
                Box::pin(async { created_document() })
            },
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CONTENT_TYPE], JSON_API_CONTENT_TYPE);
    assert_eq!(response.headers()[LOCATION], "http://127.0.0.1/api/posts/1");
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_bypass_response_is_untouched() {
    let pipeline = Pipeline::json_api(false);
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            make_request("GET", "/posts/count", false),
            |ctx, _req| {
                assert!(!ctx.is_json_api());
                Box::pin(async { Response::json(StatusCode::OK, &json!({"count": 0})) })
            },
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert_eq!(response.headers().len(), 1);
    assert_eq!(body_json(response).await, json!({"count": 0}));
}

#[tokio::test]
async fn test_bypass_errors_keep_native_shape() {
    let pipeline = Pipeline::json_api(false);
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            make_request("GET", "/missing", false),
            |_ctx, _req| Box::pin(async { Response::empty(StatusCode::NOT_FOUND) }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().is_empty());
}

#[tokio::test]
async fn test_in_pipeline_failure_becomes_errors_document() {
    let pipeline = Pipeline::json_api(false);
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            make_request("GET", "/posts/count", true),
            |_ctx, _req| Box::pin(async { Response::empty(StatusCode::NOT_FOUND) }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[CONTENT_TYPE], JSON_API_CONTENT_TYPE);
    let body = body_json(response).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(body["errors"][0]["status"], 404);
}

#[tokio::test]
async fn test_no_content_in_pipeline() {
    let pipeline = Pipeline::json_api(false);
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            make_request("DELETE", "/posts/1", true),
            |_ctx, _req| Box::pin(async { Response::empty(StatusCode::NO_CONTENT) }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}
