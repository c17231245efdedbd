//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! the request id, the negotiated [`PipelineMode`] and timing. It never
//! outlives the request it was created for.

use iris_core::{PipelineMode, RequestId};
use std::time::Instant;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use iris_core::PipelineMode;
/// use iris_middleware::context::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// assert_eq!(ctx.mode(), PipelineMode::Bypass);
///
/// ctx.set_mode(PipelineMode::InPipeline);
/// assert!(ctx.is_json_api());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    mode: PipelineMode,
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            mode: PipelineMode::Bypass,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    ///
    /// This should only be called by the RequestId middleware.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the negotiated mode; `Bypass` until negotiation runs.
    #[must_use]
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Records the negotiation outcome.
    ///
    /// This should only be called by the Negotiation middleware.
    pub fn set_mode(&mut self, mode: PipelineMode) {
        self.mode = mode;
    }

    /// Shorthand for `mode().is_in_pipeline()`.
    #[must_use]
    pub fn is_json_api(&self) -> bool {
        self.mode.is_in_pipeline()
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_defaults() {
        let ctx = MiddlewareContext::new();
        assert_eq!(ctx.mode(), PipelineMode::Bypass);
        assert!(!ctx.is_json_api());
        assert!(ctx.elapsed() >= std::time::Duration::ZERO);
    }

    #[test]
    fn test_with_request_id() {
        let id = RequestId::new();
        let mut ctx = MiddlewareContext::with_request_id(id);
        assert_eq!(ctx.request_id(), id);

        let other = RequestId::new();
        ctx.set_request_id(other);
        assert_eq!(ctx.request_id(), other);
    }

    #[test]
    fn test_mode_round_trip() {
        let mut ctx = MiddlewareContext::default();
        ctx.set_mode(PipelineMode::InPipeline);
        assert_eq!(ctx.mode(), PipelineMode::InPipeline);
        assert!(ctx.is_json_api());
    }
}
