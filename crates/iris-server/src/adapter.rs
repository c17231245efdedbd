//! Endpoint adapter.
//!
//! Decides, per resource type, what happens to each native endpoint when a
//! request is in the JSON:API pipeline. Each type has an ordered list of
//! [`AdapterRule`]s; the first rule whose predicate matches an endpoint
//! picks its [`Transform`]. Endpoints no rule matches are served natively.
//!
//! The adapter never touches the native route table. [`AdapterRegistry::adapt`]
//! produces a second table used only for in-pipeline requests, in which
//! removed endpoints answer `NotFound`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use iris_core::{ModelRegistry, RelationKind};

use crate::routes::{Dispatch, Endpoint, Route, RouteTable, ID_PARAM};

/// Predicate over an endpoint and its HTTP method.
pub type EndpointPredicate = Arc<dyn Fn(&Endpoint, &Method) -> bool + Send + Sync>;

/// What the adapter does with a matched endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Not exposed in pipeline.
    Remove,
    /// Served through the document serializer.
    Wrap {
        /// Also route the request body through the deserializer.
        inbound: bool,
    },
}

impl Transform {
    /// Outbound-only wrapping.
    pub const OUTBOUND: Self = Self::Wrap { inbound: false };
    /// Inbound deserialization plus outbound serialization.
    pub const INBOUND_OUTBOUND: Self = Self::Wrap { inbound: true };
}

/// One `{predicate, transform}` entry.
#[derive(Clone)]
pub struct AdapterRule {
    name: &'static str,
    predicate: EndpointPredicate,
    transform: Transform,
}

impl AdapterRule {
    /// Creates a rule.
    pub fn new<F>(name: &'static str, predicate: F, transform: Transform) -> Self
    where
        F: Fn(&Endpoint, &Method) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(predicate),
            transform,
        }
    }

    /// Rule name, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the transform applied on match.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Checks the predicate.
    #[must_use]
    pub fn matches(&self, endpoint: &Endpoint, method: &Method) -> bool {
        (self.predicate)(endpoint, method)
    }
}

impl fmt::Debug for AdapterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRule")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

/// Rules applied to every type unless overridden.
#[must_use]
pub fn default_rules() -> Vec<AdapterRule> {
    vec![
        AdapterRule::new(
            "remove-scalar-results",
            |endpoint, _| matches!(endpoint, Endpoint::Count | Endpoint::Exists),
            Transform::Remove,
        ),
        AdapterRule::new(
            "wrap-writes",
            |endpoint, _| matches!(endpoint, Endpoint::Create | Endpoint::Update),
            Transform::INBOUND_OUTBOUND,
        ),
        AdapterRule::new(
            "wrap-reads",
            |endpoint, _| {
                matches!(
                    endpoint,
                    Endpoint::Find
                        | Endpoint::FindById
                        | Endpoint::Related(_)
                        | Endpoint::Relationship(_)
                        | Endpoint::Destroy
                )
            },
            Transform::OUTBOUND,
        ),
    ]
}

/// Per-type adapter rules, built once at install time.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    rules: HashMap<String, Vec<AdapterRule>>,
}

impl AdapterRegistry {
    /// Creates an empty registry; every endpoint passes through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers [`default_rules`] for every type in the snapshot.
    #[must_use]
    pub fn from_registry(models: &ModelRegistry) -> Self {
        let mut registry = Self::new();
        for descriptor in models.iter() {
            registry.set_rules(descriptor.type_name(), default_rules());
        }
        registry
    }

    /// Replaces the rules of one type.
    pub fn set_rules(&mut self, type_name: impl Into<String>, rules: Vec<AdapterRule>) {
        self.rules.insert(type_name.into(), rules);
    }

    /// Puts a rule ahead of the existing rules of one type.
    pub fn prepend_rule(&mut self, type_name: &str, rule: AdapterRule) {
        self.rules.entry(type_name.to_string()).or_default().insert(0, rule);
    }

    /// Returns `true` if the type has rules.
    #[must_use]
    pub fn is_adapted(&self, type_name: &str) -> bool {
        self.rules.contains_key(type_name)
    }

    /// The transform for one endpoint; `None` means serve natively.
    #[must_use]
    pub fn transform_for(
        &self,
        type_name: &str,
        endpoint: &Endpoint,
        method: &Method,
    ) -> Option<Transform> {
        self.rules
            .get(type_name)?
            .iter()
            .find(|rule| rule.matches(endpoint, method))
            .map(AdapterRule::transform)
    }

    /// Builds the in-pipeline route table from the native one.
    ///
    /// Every to-many relation of an adapted type also gets a
    /// `/relationships/{relation}` route.
    #[must_use]
    pub fn adapt(&self, native: &RouteTable, models: &ModelRegistry) -> RouteTable {
        let mut adapted = RouteTable::new();

        for route in native.routes() {
            let type_name = route.resource().type_name();
            match self.transform_for(type_name, route.endpoint(), route.method()) {
                Some(Transform::Remove) => {
                    tracing::debug!(
                        resource = type_name,
                        method = %route.method(),
                        path = route.pattern(),
                        "endpoint removed in pipeline"
                    );
                    adapted.push(route.as_removed());
                }
                Some(Transform::Wrap { inbound }) => {
                    adapted.push(route.with_dispatch(Dispatch::JsonApi { inbound }));
                }
                None => adapted.push(route.clone()),
            }
        }

        for descriptor in models.iter() {
            let relationship = Endpoint::Relationship(String::new());
            let Some(Transform::Wrap { .. }) =
                self.transform_for(descriptor.type_name(), &relationship, &Method::GET)
            else {
                continue;
            };
            for relation in descriptor.relations() {
                if relation.kind() != RelationKind::ToMany {
                    continue;
                }
                let pattern = format!(
                    "/{}/{{{ID_PARAM}}}/relationships/{}",
                    descriptor.plural_name(),
                    relation.name()
                );
                adapted.push(Route::new(
                    Method::GET,
                    &pattern,
                    Arc::clone(descriptor),
                    Endpoint::Relationship(relation.name().to_string()),
                    Dispatch::JsonApi { inbound: false },
                ));
            }
        }

        adapted
    }
}
