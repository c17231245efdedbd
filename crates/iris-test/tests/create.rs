//! Creating resources through the JSON:API pipeline.

use std::sync::Arc;

use http::StatusCode;
use iris_core::ResourceDescriptor;
use iris_server::{install, App, JsonApiOptions};
use iris_test::{MemoryStorage, TestClient};
use serde_json::json;

const HOST: &str = "127.0.0.1:3000";

fn client(options: &JsonApiOptions) -> TestClient {
    let storage = MemoryStorage::new()
        .validates_presence_of("post", "title")
        .validates_presence_of("post", "content");
    let mut app = App::new(Arc::new(storage));
    app.model(
        ResourceDescriptor::builder("post")
            .field("title")
            .field("content")
            .build(),
    );
    install(&mut app, options).unwrap();
    TestClient::new(app).json_api().with_default_header("host", HOST)
}

#[tokio::test]
async fn test_created_resource_headers_and_document() {
    let client = client(&JsonApiOptions::default());
    let response = client
        .post("/posts")
        .json(&json!({
            "data": {
                "type": "posts",
                "attributes": {"title": "my post", "content": "my post content"}
            }
        }))
        .send()
        .await;

    response
        .assert_status(StatusCode::CREATED)
        .assert_json_api()
        .assert_header("location", "http://127.0.0.1:3000/api/posts/1");
    assert!(response.header_str("x-request-id").is_some_and(|id| !id.is_empty()));

    assert_eq!(
        response.json_value().unwrap(),
        json!({
            "data": {
                "type": "posts",
                "id": "1",
                "attributes": {"title": "my post", "content": "my post content"},
                "links": {"self": "http://127.0.0.1:3000/api/posts/1"}
            }
        })
    );
}

#[tokio::test]
async fn test_validation_failures_become_ordered_errors() {
    let client = client(&JsonApiOptions::default());
    let response = client
        .post("/posts")
        .json(&json!({"data": {"type": "posts", "attributes": {}}}))
        .send()
        .await;

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_api();
    let body = response.json_value().unwrap();
    assert!(body.get("data").is_none());

    let errors = response.errors();
    assert_eq!(errors.len(), 2);
    let pointers: Vec<_> = errors
        .iter()
        .map(|e| e.source.as_ref().map(|s| s.pointer.as_str()))
        .collect();
    assert_eq!(
        pointers,
        [Some("data/attributes/title"), Some("data/attributes/content")]
    );
    for error in &errors {
        assert_eq!(error.status, 422);
        assert_eq!(error.title, "ValidationError");
        assert_eq!(error.code, "presence");
        assert_eq!(error.detail, "can't be blank");
    }
}

#[tokio::test]
async fn test_missing_type_tolerated_by_default() {
    let client = client(&JsonApiOptions::default());
    client
        .post("/posts")
        .json(&json!({"data": {"attributes": {"title": "t", "content": "c"}}}))
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_json_pointer("/data/type", &json!("posts"));
}

#[tokio::test]
async fn test_missing_type_rejected_when_required() {
    let client = client(&JsonApiOptions::default().require_type(true));
    let response = client
        .post("/posts")
        .json(&json!({"data": {"attributes": {"title": "t", "content": "c"}}}))
        .send()
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_json_api()
        .assert_no_header("location");
    assert_eq!(response.errors().len(), 1);
    assert_eq!(response.errors()[0].status, 400);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let client = client(&JsonApiOptions::default());
    for body in ["", "not json", r#"{"data": [1, 2]}"#, r#"{"meta": {}}"#] {
        let response = client.post("/posts").body(body).send().await;
        response.assert_status(StatusCode::BAD_REQUEST).assert_json_api();
        assert_eq!(response.errors().len(), 1, "body {body:?}");
    }
}

#[tokio::test]
async fn test_rest_api_root_only_affects_links() {
    let client = client(&JsonApiOptions::default().rest_api_root("/"));
    let response = client
        .post("/posts")
        .json(&json!({"data": {"type": "posts", "attributes": {"title": "t", "content": "c"}}}))
        .send()
        .await;

    response
        .assert_status(StatusCode::CREATED)
        .assert_header("location", "http://127.0.0.1:3000/posts/1");
}

#[tokio::test]
async fn test_document_id_is_used_as_key() {
    let client = client(&JsonApiOptions::default());
    client
        .post("/posts")
        .json(&json!({
            "data": {"type": "posts", "id": "42", "attributes": {"title": "t", "content": "c"}}
        }))
        .send()
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header("location", "http://127.0.0.1:3000/api/posts/42")
        .assert_json_pointer("/data/id", &json!("42"));
}
