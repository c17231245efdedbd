//! Response Finalizer.
//!
//! Runs only for in-pipeline requests. Sets
//! `Content-Type: application/vnd.api+json; charset=utf-8` on every response
//! that carries a body, and `Location` on `201 Created` responses whose
//! handler attached a [`CreatedResource`]. Responses tagged [`NativeBody`]
//! keep their native headers.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{CreatedResource, NativeBody, Request, Response};
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, StatusCode};
use iris_core::JSON_API_CONTENT_TYPE;

/// Middleware that stamps JSON:API response headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizerMiddleware;

impl FinalizerMiddleware {
    /// Creates the finalizer stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn finalize(response: &mut Response) {
        let status = response.status();
        if status != StatusCode::NO_CONTENT && status != StatusCode::NOT_MODIFIED {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API_CONTENT_TYPE));
        }

        if status != StatusCode::CREATED {
            return;
        }
        let location = response
            .extensions()
            .get::<CreatedResource>()
            .and_then(|created| HeaderValue::from_str(&created.location).ok());
        match location {
            Some(value) => {
                response.headers_mut().insert(LOCATION, value);
            }
            None => tracing::debug!("created response carries no resource location"),
        }
    }
}

impl Middleware for FinalizerMiddleware {
    fn name(&self) -> &'static str {
        "finalizer"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            if ctx.is_json_api() && response.extensions().get::<NativeBody>().is_none() {
                Self::finalize(&mut response);
            }
            response
        })
    }
}
