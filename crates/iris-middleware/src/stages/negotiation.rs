//! Negotiation Gate.
//!
//! Decides once per request whether it enters the JSON:API pipeline. The
//! decision is a pure function of the `Accept` and `Content-Type` headers
//! and is recorded in the [`MiddlewareContext`]; the request itself is
//! never modified.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use http::HeaderMap;
use iris_core::{PipelineMode, JSON_API_MEDIA_TYPE};
use mime::Mime;

/// Returns `true` when either header declares `application/vnd.api+json`.
///
/// Parameters are ignored; absent or unparseable values count as not
/// declaring it.
///
/// # Example
///
/// ```
/// use http::header::{HeaderMap, HeaderValue, ACCEPT};
/// use iris_middleware::stages::negotiation::is_json_api;
///
/// let mut headers = HeaderMap::new();
/// assert!(!is_json_api(&headers));
///
/// headers.insert(ACCEPT, HeaderValue::from_static("text/html, application/vnd.api+json"));
/// assert!(is_json_api(&headers));
/// ```
pub fn is_json_api(headers: &HeaderMap) -> bool {
    declares_json_api(headers, &CONTENT_TYPE) || declares_json_api(headers, &ACCEPT)
}

fn declares_json_api(headers: &HeaderMap, name: &HeaderName) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|entry| entry.trim().parse::<Mime>().ok())
        .any(|mime| mime.essence_str().eq_ignore_ascii_case(JSON_API_MEDIA_TYPE))
}

/// Middleware that records the negotiation outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiationMiddleware;

impl NegotiationMiddleware {
    /// Creates the negotiation stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for NegotiationMiddleware {
    fn name(&self) -> &'static str {
        "negotiation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mode = PipelineMode::from_negotiated(is_json_api(request.headers()));
            ctx.set_mode(mode);
            tracing::debug!(
                request_id = %ctx.request_id(),
                mode = mode.as_str(),
                "negotiated request mode"
            );
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{HeaderValue, Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    fn headers(pairs: &[(HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_content_type_enters_pipeline() {
        assert!(is_json_api(&headers(&[(CONTENT_TYPE, "application/vnd.api+json")])));
        assert!(is_json_api(&headers(&[(
            CONTENT_TYPE,
            "application/vnd.api+json; charset=utf-8"
        )])));
    }

    #[test]
    fn test_accept_enters_pipeline() {
        assert!(is_json_api(&headers(&[(ACCEPT, "application/vnd.api+json")])));
        assert!(is_json_api(&headers(&[
            (ACCEPT, "text/html"),
            (ACCEPT, "Application/Vnd.Api+Json"),
        ])));
    }

    #[test]
    fn test_other_media_types_bypass() {
        assert!(!is_json_api(&HeaderMap::new()));
        assert!(!is_json_api(&headers(&[(CONTENT_TYPE, "application/json")])));
        assert!(!is_json_api(&headers(&[(ACCEPT, "*/*")])));
        assert!(!is_json_api(&headers(&[(ACCEPT, "not a mime;;")])));
    }

    #[tokio::test]
    async fn test_sets_mode_without_touching_request() {
        let middleware = NegotiationMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let request: Request = HttpRequest::builder()
            .uri("/posts")
            .header(ACCEPT, "application/vnd.api+json")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let next = Next::handler(|ctx, req| {
            assert!(ctx.is_json_api());
            assert_eq!(req.headers().len(), 1);
            Box::pin(async { Response::empty(StatusCode::OK) })
        });
        let response = middleware.process(&mut ctx, request, next).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.mode(), PipelineMode::InPipeline);
    }
}
