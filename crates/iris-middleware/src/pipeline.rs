//! Fixed-order request pipeline.
//!
//! ## Pipeline Stages
//!
//! 1. **Request ID** - Assign a UUID v7 request id
//! 2. **Negotiation** - Decide `InPipeline` vs `Bypass` from media types
//! 3. **Tracing** - Request span, completion log and metrics
//! 4. **Finalizer** - `Content-Type` and `Location` (post-handler)
//! 5. **Error Document** - Guarantee an `errors` body on failures (post-handler)
//!
//! Post-handler stages see the response in reverse order: the error
//! document stage runs first, so the finalizer always stamps headers on
//! the body the client will receive.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{
    ErrorDocumentMiddleware, FinalizerMiddleware, NegotiationMiddleware, RequestIdMiddleware,
    TracingMiddleware,
};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The fixed-order middleware pipeline.
///
/// # Example
///
/// ```
/// use iris_middleware::pipeline::{Pipeline, Stage};
///
/// let pipeline = Pipeline::json_api(false);
/// let expected: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
/// assert_eq!(pipeline.stage_names(), expected);
/// ```
pub struct Pipeline {
    pre_handler_stages: Vec<BoxedMiddleware>,
    post_handler_stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The standard five-stage JSON:API pipeline.
    ///
    /// `trust_incoming_request_ids` lets a valid `X-Request-ID` from the
    /// client replace the generated one.
    #[must_use]
    pub fn json_api(trust_incoming_request_ids: bool) -> Self {
        let request_id = if trust_incoming_request_ids {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };
        Self::builder()
            .add_pre_handler_stage(request_id)
            .add_pre_handler_stage(NegotiationMiddleware::new())
            .add_pre_handler_stage(TracingMiddleware::new())
            .add_post_handler_stage(FinalizerMiddleware::new())
            .add_post_handler_stage(ErrorDocumentMiddleware::new())
            .build()
    }

    /// Processes a request through the entire pipeline.
    ///
    /// The handler reads the negotiated mode from the context before
    /// building its future.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);

        for middleware in self.post_handler_stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        for middleware in self.pre_handler_stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pre_handler_stages
            .iter()
            .chain(&self.post_handler_stages)
            .map(|mw| mw.name())
            .collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.pre_handler_stages.len() + self.post_handler_stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    pre_handler_stages: Vec<BoxedMiddleware>,
    post_handler_stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pre_handler_stages: Vec::new(),
            post_handler_stages: Vec::new(),
        }
    }

    /// Adds a pre-handler middleware stage.
    #[must_use]
    pub fn add_pre_handler_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.pre_handler_stages.push(Arc::new(middleware));
        self
    }

    /// Adds a post-handler middleware stage.
    ///
    /// Later stages sit closer to the handler and see the response first.
    #[must_use]
    pub fn add_post_handler_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.post_handler_stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            pre_handler_stages: self.pre_handler_stages,
            post_handler_stages: self.post_handler_stages,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware stage marker for the fixed ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Request ID generation
    RequestId = 1,
    /// Stage 2: Media-type negotiation
    Negotiation = 2,
    /// Stage 3: Request span and metrics
    Tracing = 3,
    /// --- Handler invocation ---
    /// Stage 4: Header finalization
    Finalizer = 4,
    /// Stage 5: Error document guarantee
    ErrorDocument = 5,
}

impl Stage {
    /// Returns true if this is a pre-handler stage.
    #[must_use]
    pub const fn is_pre_handler(self) -> bool {
        (self as u8) <= 3
    }

    /// Returns true if this is a post-handler stage.
    #[must_use]
    pub const fn is_post_handler(self) -> bool {
        (self as u8) >= 4
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::Negotiation => "negotiation",
            Self::Tracing => "tracing",
            Self::Finalizer => "finalizer",
            Self::ErrorDocument => "error_document",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::RequestId,
            Self::Negotiation,
            Self::Tracing,
            Self::Finalizer,
            Self::ErrorDocument,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use std::sync::Mutex;

    struct OrderTrackingMiddleware {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            let order = self.order.clone();
            let name = self.name;

            Box::pin(async move {
                order.lock().unwrap().push(format!("{name}:before"));
                let response = next.run(ctx, request).await;
                order.lock().unwrap().push(format!("{name}:after"));
                response
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let stage = |name| OrderTrackingMiddleware {
            name,
            order: order.clone(),
        };

        let pipeline = Pipeline::builder()
            .add_pre_handler_stage(stage("first"))
            .add_pre_handler_stage(stage("second"))
            .add_post_handler_stage(stage("outer_post"))
            .add_post_handler_stage(stage("inner_post"))
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::empty(StatusCode::OK) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "first:before",
                "second:before",
                "outer_post:before",
                "inner_post:before",
                "inner_post:after",
                "outer_post:after",
                "second:after",
                "first:after",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::empty(StatusCode::NO_CONTENT) })
            })
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_json_api_pipeline_stages() {
        let pipeline = Pipeline::json_api(false);
        assert_eq!(pipeline.stage_count(), 5);
        assert_eq!(
            pipeline.stage_names(),
            vec!["request_id", "negotiation", "tracing", "finalizer", "error_document"]
        );
    }

    #[test]
    fn test_stage_categories() {
        assert!(Stage::RequestId < Stage::Negotiation);
        assert!(Stage::Negotiation < Stage::Tracing);
        assert!(Stage::Finalizer < Stage::ErrorDocument);

        let pre: Vec<_> = Stage::all().into_iter().filter(|s| s.is_pre_handler()).collect();
        assert_eq!(pre, [Stage::RequestId, Stage::Negotiation, Stage::Tracing]);
        assert!(Stage::Finalizer.is_post_handler());
        assert!(Stage::ErrorDocument.is_post_handler());
    }
}
