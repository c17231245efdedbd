//! Error document middleware.
//!
//! Every failed in-pipeline response must carry exactly one `errors`
//! document. Handlers that translate storage failures already produce one;
//! this stage covers the rest (unknown routes, removed endpoints, methods
//! the route table does not serve) by rewriting any 4xx/5xx response that
//! is tagged neither [`JsonApiBody`] nor [`NativeBody`].
//!
//! When the original body is a native error envelope
//! (`{"error": {"message": ...}}`) its message becomes the `detail`.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{JsonApiBody, NativeBody, Request, Response, ResponseExt};
use bytes::Bytes;
use http_body_util::BodyExt;
use iris_core::Document;

/// Middleware that converts untagged error responses into `errors` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorDocumentMiddleware;

impl ErrorDocumentMiddleware {
    /// Creates the error document stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn needs_rewrite(response: &Response) -> bool {
        let status = response.status();
        let extensions = response.extensions();
        (status.is_client_error() || status.is_server_error())
            && extensions.get::<JsonApiBody>().is_none()
            && extensions.get::<NativeBody>().is_none()
    }

    fn extract_message(body: &[u8]) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        value
            .pointer("/error/message")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
    }
}

impl Middleware for ErrorDocumentMiddleware {
    fn name(&self) -> &'static str {
        "error_document"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;
            if !ctx.is_json_api() || !Self::needs_rewrite(&response) {
                return response;
            }

            let status = response.status();
            let body: Bytes = match response.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let mut error = iris_codec::status_error_object(status);
            if let Some(message) = Self::extract_message(&body) {
                error.detail = message;
            }
            tracing::debug!(
                request_id = %ctx.request_id(),
                status = status.as_u16(),
                "rewrote error response as JSON:API document"
            );
            Response::document(status, &Document::errors(vec![error]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use iris_core::PipelineMode;
    use serde_json::json;

    async fn run(mode: PipelineMode, response: Response) -> Response {
        let mut ctx = MiddlewareContext::new();
        ctx.set_mode(mode);
        let request: Request = HttpRequest::builder()
            .uri("/nope")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let next = Next::handler(move |_ctx, _req| Box::pin(async move { response }));
        ErrorDocumentMiddleware::new()
            .process(&mut ctx, request, next)
            .await
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rewrites_plain_not_found() {
        let response = run(PipelineMode::InPipeline, Response::empty(StatusCode::NOT_FOUND)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<JsonApiBody>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["status"], 404);
        assert_eq!(body["errors"][0]["title"], "Not Found");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_keeps_native_message_as_detail() {
        let native = Response::json(
            StatusCode::NOT_FOUND,
            &json!({"error": {"statusCode": 404, "message": "Unknown \"post\" id \"9\"."}}),
        );
        let body = body_json(run(PipelineMode::InPipeline, native).await).await;
        assert_eq!(body["errors"][0]["detail"], "Unknown \"post\" id \"9\".");
    }

    #[tokio::test]
    async fn test_tagged_documents_pass_through() {
        let doc = Document::errors(vec![iris_codec::status_error_object(StatusCode::CONFLICT)]);
        let response = run(
            PipelineMode::InPipeline,
            Response::document(StatusCode::UNPROCESSABLE_ENTITY, &doc),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["status"], 409);
    }

    #[tokio::test]
    async fn test_native_body_keeps_native_envelope() {
        let envelope = json!({
            "error": {
                "statusCode": 422,
                "name": "ValidationError",
                "details": {"codes": {"label": ["presence"]}}
            }
        });
        let mut native = Response::json(StatusCode::UNPROCESSABLE_ENTITY, &envelope);
        native.extensions_mut().insert(NativeBody);

        let response = run(PipelineMode::InPipeline, native).await;
        assert!(response.extensions().get::<JsonApiBody>().is_none());
        assert_eq!(body_json(response).await, envelope);
    }

    #[tokio::test]
    async fn test_bypass_and_success_untouched() {
        let response = run(PipelineMode::Bypass, Response::empty(StatusCode::NOT_FOUND)).await;
        assert!(response.extensions().get::<JsonApiBody>().is_none());

        let response = run(PipelineMode::InPipeline, Response::empty(StatusCode::OK)).await;
        assert!(response.extensions().get::<JsonApiBody>().is_none());
    }
}
