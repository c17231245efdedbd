//! The host application.
//!
//! An [`App`] owns the storage collaborator, the declared resource types and
//! their native route table. Until [`install`](crate::install) runs, every
//! request is served natively. Afterwards requests go through the JSON:API
//! pipeline, which negotiates each one and picks the route table to use.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use http_body_util::BodyExt;
use iris_config::ServerConfig;
use iris_core::{PipelineMode, ResourceDescriptor, Storage};
use iris_middleware::stages::TracingMiddleware;
use iris_middleware::{MiddlewareContext, NativeBody, Pipeline, Request, Response};

use crate::handlers::json_api::{self, JsonApiRequest};
use crate::handlers::native;
use crate::install::JsonApiState;
use crate::routes::{Dispatch, RouteLookup, RouteTable};

/// A REST resource server.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use iris_core::ResourceDescriptor;
/// use iris_server::App;
///
/// let mut app = App::new(Arc::new(MyStorage::default()));
/// app.model(ResourceDescriptor::builder("post").field("title").build());
/// let response = app.handle(request).await;
/// ```
pub struct App {
    storage: Arc<dyn Storage>,
    declared: Vec<Arc<ResourceDescriptor>>,
    native: Arc<RouteTable>,
    json_api: Option<Arc<JsonApiState>>,
    pipeline: Pipeline,
    mount_path: String,
    trust_request_ids: bool,
}

impl App {
    /// Creates an app with no resource types, mounted at `/`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            declared: Vec::new(),
            native: Arc::new(RouteTable::new()),
            json_api: None,
            pipeline: native_pipeline(),
            mount_path: String::new(),
            trust_request_ids: false,
        }
    }

    /// Creates an app using the server section of the configuration.
    pub fn from_config(storage: Arc<dyn Storage>, config: &ServerConfig) -> Self {
        Self::new(storage)
            .with_mount_path(&config.mount_path)
            .with_trusted_request_ids(config.trust_request_ids)
    }

    /// Serves every route under `mount_path`.
    #[must_use]
    pub fn with_mount_path(mut self, mount_path: &str) -> Self {
        self.mount_path = mount_path.trim_end_matches('/').to_string();
        self
    }

    /// Lets clients supply their own `X-Request-ID` once JSON:API is installed.
    #[must_use]
    pub fn with_trusted_request_ids(mut self, trust: bool) -> Self {
        self.trust_request_ids = trust;
        self
    }

    /// Declares a resource type and registers its native endpoints.
    ///
    /// Declaring a type name twice replaces the earlier declaration.
    pub fn model(&mut self, descriptor: ResourceDescriptor) -> &mut Self {
        let descriptor = Arc::new(descriptor);
        match self
            .declared
            .iter_mut()
            .find(|d| d.type_name() == descriptor.type_name())
        {
            Some(existing) => *existing = descriptor,
            None => self.declared.push(descriptor),
        }

        let mut table = RouteTable::new();
        for descriptor in &self.declared {
            table.add_resource(descriptor);
        }
        self.native = Arc::new(table);
        self
    }

    /// Declared resource types, in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &Arc<ResourceDescriptor>> {
        self.declared.iter()
    }

    /// The native route table.
    #[must_use]
    pub fn native_routes(&self) -> &RouteTable {
        &self.native
    }

    /// Installed JSON:API state, if any.
    #[must_use]
    pub fn json_api(&self) -> Option<&Arc<JsonApiState>> {
        self.json_api.as_ref()
    }

    /// The mount path, without a trailing slash.
    #[must_use]
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub(crate) fn enable_json_api(&mut self, state: Arc<JsonApiState>) {
        self.json_api = Some(state);
        self.pipeline = Pipeline::json_api(self.trust_request_ids);
    }

    /// Handles one buffered request.
    pub async fn handle(&self, request: Request) -> Response {
        let dispatcher = Dispatcher {
            storage: Arc::clone(&self.storage),
            declared: self.declared.clone(),
            native: Arc::clone(&self.native),
            json_api: self.json_api.clone(),
            mount_path: self.mount_path.clone(),
        };
        self.pipeline
            .process(MiddlewareContext::new(), request, move |ctx, request| {
                let mode = ctx.mode();
                Box::pin(async move { dispatcher.dispatch(mode, request).await })
            })
            .await
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field(
                "models",
                &self.declared.iter().map(|d| d.type_name()).collect::<Vec<_>>(),
            )
            .field("mount_path", &self.mount_path)
            .field("json_api", &self.json_api.is_some())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

fn native_pipeline() -> Pipeline {
    Pipeline::builder()
        .add_pre_handler_stage(TracingMiddleware::new())
        .build()
}

/// Owned snapshot of what one request needs.
struct Dispatcher {
    storage: Arc<dyn Storage>,
    declared: Vec<Arc<ResourceDescriptor>>,
    native: Arc<RouteTable>,
    json_api: Option<Arc<JsonApiState>>,
    mount_path: String,
}

impl Dispatcher {
    async fn dispatch(self, mode: PipelineMode, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let body: Bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        let method = &parts.method;
        let full_path = parts.uri.path();

        let Some(path) = strip_mount(full_path, &self.mount_path) else {
            return native::route_not_found(method, full_path);
        };

        if let (PipelineMode::InPipeline, Some(state)) = (mode, &self.json_api) {
            match state.routes.lookup(method, path) {
                RouteLookup::Matched(route) => {
                    return match route.route().dispatch() {
                        Dispatch::JsonApi { .. } => {
                            json_api::handle(JsonApiRequest {
                                storage: self.storage.as_ref(),
                                models: &state.models,
                                options: &state.options,
                                route: &route,
                                parts: &parts,
                                body: &body,
                            })
                            .await
                        }
                        Dispatch::Native => {
                            let response =
                                native::handle(self.storage.as_ref(), &self.declared, &route, method, &body)
                                    .await;
                            passthrough(response)
                        }
                    };
                }
                lookup => {
                    // Types declared after install were never adapted.
                    if !self.declared_after_install(state, method, path) {
                        return miss(&lookup, method, full_path);
                    }
                }
            }
        }

        match self.native.lookup(method, path) {
            RouteLookup::Matched(route) => {
                let response =
                    native::handle(self.storage.as_ref(), &self.declared, &route, method, &body).await;
                passthrough(response)
            }
            lookup => miss(&lookup, method, full_path),
        }
    }

    fn declared_after_install(&self, state: &JsonApiState, method: &Method, path: &str) -> bool {
        match self.native.lookup(method, path) {
            RouteLookup::Matched(route) => state
                .models
                .descriptor_for(route.route().resource().type_name())
                .is_none(),
            _ => false,
        }
    }
}

/// Tags a response of a matched native endpoint so in-pipeline stages leave it alone.
fn passthrough(mut response: Response) -> Response {
    response.extensions_mut().insert(NativeBody);
    response
}

fn miss(lookup: &RouteLookup, method: &Method, path: &str) -> Response {
    match lookup {
        RouteLookup::MethodNotAllowed => native::method_not_allowed(method, path),
        _ => native::route_not_found(method, path),
    }
}

/// Path relative to the mount point; `None` outside it.
fn strip_mount<'p>(path: &'p str, mount_path: &str) -> Option<&'p str> {
    if mount_path.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(mount_path)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
