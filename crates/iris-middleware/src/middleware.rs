//! Core middleware trait and types.
//!
//! Every pipeline stage implements [`Middleware`]. A stage receives the
//! mutable per-request context, the request, and a [`Next`] continuation.
//! Work done before `next.run` sees the request; work done after it sees
//! the response.

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// # Invariants
///
/// - Middleware MUST call `next.run()` exactly once (unless short-circuiting)
/// - Middleware MUST NOT touch requests or responses whose context is in
///   [`PipelineMode::Bypass`], except to observe them
///
/// [`PipelineMode::Bypass`]: iris_core::PipelineMode::Bypass
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this middleware stage.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Callback to invoke the next middleware in the chain.
///
/// Consumed by [`Next::run`], so it can only be called once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(
        Box<
            dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response>
                + Send
                + 'a,
        >,
    ),
}

impl<'a> Next<'a> {
    /// Creates a new `Next` that will invoke the given middleware.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or handler in the chain.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{HeaderValue, Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    const VISIT: &str = "x-visit";

    struct VisitMiddleware {
        name: &'static str,
    }

    impl Middleware for VisitMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            let mut request = request;
            request
                .headers_mut()
                .append(VISIT, HeaderValue::from_static(self.name));
            Box::pin(async move { next.run(ctx, request).await })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_next_handler() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Response::empty(StatusCode::OK) })
        });

        let response = next.run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_chain_order() {
        let first = VisitMiddleware { name: "first" };
        let second = VisitMiddleware { name: "second" };

        let mut ctx = MiddlewareContext::new();
        let handler = Next::handler(|_ctx, req: Request| {
            let visits: Vec<String> = req
                .headers()
                .get_all(VISIT)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(ToString::to_string)
                .collect();
            Box::pin(async move {
                let mut response = Response::empty(StatusCode::ACCEPTED);
                if let Ok(value) = HeaderValue::from_str(&visits.join(",")) {
                    response.headers_mut().insert(VISIT, value);
                }
                response
            })
        });
        let next = Next::new(&first, Next::new(&second, handler));

        let response = next.run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[VISIT], "first,second");
        assert_eq!(first.name(), "first");
    }
}
