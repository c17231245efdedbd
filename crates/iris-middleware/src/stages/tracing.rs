//! Tracing middleware.
//!
//! Opens a `request` span for every request and emits one completion event
//! with status and latency. Counts and durations are recorded through the
//! `metrics` facade, labelled by pipeline mode.
//!
//! ## Span Fields
//!
//! - `request_id` - id assigned by the request id stage
//! - `method`, `path` - from the request line
//! - `mode` - `json_api` or `bypass`, filled in after negotiation

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use tracing::Instrument;

/// Middleware that scopes the rest of the pipeline in a request span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    /// Creates the tracing stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for TracingMiddleware {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let span = tracing::info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %request.method(),
            path = %request.uri().path(),
            mode = ctx.mode().as_str(),
        );

        Box::pin(
            async move {
                let response = next.run(ctx, request).await;

                let mode = ctx.mode();
                let status = response.status();
                let elapsed = ctx.elapsed();
                iris_telemetry::metrics::record_request(mode.as_str(), status.as_u16(), elapsed);

                if status.is_server_error() {
                    tracing::warn!(
                        status = status.as_u16(),
                        duration_ms = elapsed.as_secs_f64() * 1000.0,
                        "request failed"
                    );
                } else {
                    tracing::info!(
                        status = status.as_u16(),
                        duration_ms = elapsed.as_secs_f64() * 1000.0,
                        "request completed"
                    );
                }
                response
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    #[tokio::test]
    async fn test_passes_response_through() {
        let middleware = TracingMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let request: Request = HttpRequest::builder()
            .method("DELETE")
            .uri("/posts/1")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Response::empty(StatusCode::INTERNAL_SERVER_ERROR) })
        });
        let response = middleware.process(&mut ctx, request, next).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().is_empty());
        assert_eq!(middleware.name(), "tracing");
    }
}
