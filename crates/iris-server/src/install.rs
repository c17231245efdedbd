//! Installing the JSON:API layer on an [`App`].

use std::sync::Arc;

use iris_config::JsonApiConfig;
use iris_core::ModelRegistry;

use crate::adapter::AdapterRegistry;
use crate::app::App;
use crate::routes::RouteTable;
use crate::server::ServerError;

/// Default base path of canonical resource URLs.
pub const DEFAULT_REST_API_ROOT: &str = "/api";

/// Options recognized by [`install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonApiOptions {
    /// Base path used when building canonical URLs. Routing is unaffected.
    pub rest_api_root: String,
    /// Reject inbound documents without `data.type`.
    pub require_type: bool,
}

impl Default for JsonApiOptions {
    fn default() -> Self {
        Self {
            rest_api_root: DEFAULT_REST_API_ROOT.to_string(),
            require_type: false,
        }
    }
}

impl JsonApiOptions {
    /// Sets the REST root.
    #[must_use]
    pub fn rest_api_root(mut self, root: impl Into<String>) -> Self {
        self.rest_api_root = root.into();
        self
    }

    /// Sets whether `data.type` is mandatory.
    #[must_use]
    pub fn require_type(mut self, require: bool) -> Self {
        self.require_type = require;
        self
    }
}

impl From<&JsonApiConfig> for JsonApiOptions {
    fn from(config: &JsonApiConfig) -> Self {
        Self {
            rest_api_root: config.rest_api_root.clone(),
            require_type: config.require_type,
        }
    }
}

/// Everything in-pipeline dispatch reads. Frozen at install time.
#[derive(Debug)]
pub struct JsonApiState {
    pub(crate) models: ModelRegistry,
    pub(crate) adapter: AdapterRegistry,
    pub(crate) routes: RouteTable,
    pub(crate) options: JsonApiOptions,
}

impl JsonApiState {
    /// The model snapshot taken at install time.
    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// The adapter rules in effect.
    #[must_use]
    pub fn adapter(&self) -> &AdapterRegistry {
        &self.adapter
    }

    /// The in-pipeline route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Options given to [`install`].
    #[must_use]
    pub fn options(&self) -> &JsonApiOptions {
        &self.options
    }
}

/// Installs the JSON:API layer with the default adapter rules.
///
/// Snapshots the models `app` has declared so far, builds the in-pipeline
/// route table, and enables negotiation for every later request. Models
/// declared afterwards are served natively in both modes.
///
/// # Errors
///
/// Returns [`ServerError::Registry`] when the declared models do not form a
/// valid registry (duplicate names, unknown relation targets).
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use iris_core::ResourceDescriptor;
/// use iris_server::{install, App, JsonApiOptions};
/// use iris_test::MemoryStorage;
///
/// let mut app = App::new(Arc::new(MemoryStorage::new()));
/// app.model(ResourceDescriptor::builder("post").field("title").build());
/// install(&mut app, &JsonApiOptions::default()).unwrap();
/// assert!(app.json_api().is_some());
/// ```
pub fn install(app: &mut App, options: &JsonApiOptions) -> Result<(), ServerError> {
    let models = snapshot(app)?;
    let adapter = AdapterRegistry::from_registry(&models);
    install_with(app, models, adapter, options)
}

/// Installs with a caller-supplied adapter registry.
///
/// # Errors
///
/// Returns [`ServerError::Registry`] when the declared models do not form a
/// valid registry.
pub fn install_with_adapter(
    app: &mut App,
    adapter: AdapterRegistry,
    options: &JsonApiOptions,
) -> Result<(), ServerError> {
    let models = snapshot(app)?;
    install_with(app, models, adapter, options)
}

fn snapshot(app: &App) -> Result<ModelRegistry, ServerError> {
    let models = ModelRegistry::builder()
        .extend(app.models().map(|descriptor| descriptor.as_ref().clone()))
        .build()?;
    Ok(models)
}

fn install_with(
    app: &mut App,
    models: ModelRegistry,
    adapter: AdapterRegistry,
    options: &JsonApiOptions,
) -> Result<(), ServerError> {
    let routes = adapter.adapt(app.native_routes(), &models);
    tracing::info!(
        resources = models.len(),
        routes = routes.len(),
        rest_api_root = %options.rest_api_root,
        "JSON:API layer installed"
    );
    app.enable_json_api(Arc::new(JsonApiState {
        models,
        adapter,
        routes,
        options: options.clone(),
    }));
    Ok(())
}
