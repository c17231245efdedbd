//! Route tables and path matching.
//!
//! A [`RouteTable`] maps `(method, path)` to an [`Endpoint`] of one
//! resource type. Paths are relative to the host's mount path and use
//! `{param}` placeholders. Routes are checked in insertion order; the
//! first match wins, so literal routes such as `/{plural}/count` must be
//! added before `/{plural}/{id}`.
//!
//! A removed route keeps its place in the table and answers `NotFound`, so
//! its path never falls through to a later pattern.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use iris_core::ResourceDescriptor;

/// Name of the id path parameter.
pub const ID_PARAM: &str = "id";

/// The operation a route performs on its resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /{plural}`
    Create,
    /// `GET /{plural}`
    Find,
    /// `GET /{plural}/count`
    Count,
    /// `GET /{plural}/{id}`
    FindById,
    /// `GET|HEAD /{plural}/{id}/exists`, `HEAD /{plural}/{id}`
    Exists,
    /// `PUT|PATCH /{plural}/{id}`
    Update,
    /// `DELETE /{plural}/{id}`
    Destroy,
    /// `GET /{plural}/{id}/{relation}`
    Related(String),
    /// `GET /{plural}/{id}/relationships/{relation}`
    Relationship(String),
}

impl Endpoint {
    /// Short operation name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Find => "find",
            Self::Count => "count",
            Self::FindById => "findById",
            Self::Exists => "exists",
            Self::Update => "update",
            Self::Destroy => "destroy",
            Self::Related(_) => "related",
            Self::Relationship(_) => "relationship",
        }
    }

    /// Relation name for relation endpoints.
    #[must_use]
    pub fn relation(&self) -> Option<&str> {
        match self {
            Self::Related(name) | Self::Relationship(name) => Some(name),
            _ => None,
        }
    }
}

/// How a matched route is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The host's own handler and response shape.
    Native,
    /// Wrapped so the response is a JSON:API document.
    JsonApi {
        /// Route the request body through the document deserializer.
        inbound: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    pattern: String,
    resource: Arc<ResourceDescriptor>,
    endpoint: Endpoint,
    dispatch: Dispatch,
    removed: bool,
}

impl Route {
    /// Creates a route from a `{param}` path pattern.
    pub fn new(
        method: Method,
        pattern: &str,
        resource: Arc<ResourceDescriptor>,
        endpoint: Endpoint,
        dispatch: Dispatch,
    ) -> Self {
        Self {
            method,
            segments: parse_segments(pattern),
            pattern: pattern.to_string(),
            resource,
            endpoint,
            dispatch,
            removed: false,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the original path pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the resource type this route acts on.
    #[must_use]
    pub fn resource(&self) -> &Arc<ResourceDescriptor> {
        &self.resource
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns how the route is served.
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Copy of this route served differently.
    #[must_use]
    pub fn with_dispatch(&self, dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            ..self.clone()
        }
    }

    /// Copy of this route that answers `NotFound` when matched.
    #[must_use]
    pub fn as_removed(&self) -> Self {
        Self {
            removed: true,
            ..self.clone()
        }
    }

    /// Returns `true` for a removed route.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    fn match_path(&self, path_segments: &[&str]) -> Option<HashMap<String, String>> {
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(params)
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Param(name.to_string()),
            None => PathSegment::Literal(s.to_string()),
        })
        .collect()
}

/// A matched route with extracted path parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Route,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the matched route.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the raw `{id}` parameter.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.param(ID_PARAM)
    }
}

/// Result of a route lookup.
#[derive(Debug, Clone)]
pub enum RouteLookup {
    /// A route matched method and path.
    Matched(RouteMatch),
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// Nothing matched the path.
    NotFound,
}

/// An ordered list of routes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::Method;
/// use iris_core::ResourceDescriptor;
/// use iris_server::routes::{Dispatch, Endpoint, RouteLookup, RouteTable};
///
/// let posts = Arc::new(ResourceDescriptor::builder("post").build());
/// let mut table = RouteTable::new();
/// table.add(Method::GET, "/posts/{id}", posts, Endpoint::FindById, Dispatch::Native);
///
/// match table.lookup(&Method::GET, "/posts/42") {
///     RouteLookup::Matched(m) => assert_eq!(m.id(), Some("42")),
///     other => panic!("unexpected {other:?}"),
/// }
/// assert!(matches!(table.lookup(&Method::DELETE, "/posts/42"), RouteLookup::MethodNotAllowed));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// The native REST surface of one resource type.
    #[must_use]
    pub fn for_resource(resource: &Arc<ResourceDescriptor>) -> Self {
        let mut table = Self::new();
        table.add_resource(resource);
        table
    }

    /// Appends the native REST surface of one resource type.
    pub fn add_resource(&mut self, resource: &Arc<ResourceDescriptor>) {
        let plural = resource.plural_name();
        let collection = format!("/{plural}");
        let count = format!("/{plural}/count");
        let item = format!("/{plural}/{{{ID_PARAM}}}");
        let exists = format!("{item}/exists");

        let native = Dispatch::Native;
        self.add(Method::POST, &collection, Arc::clone(resource), Endpoint::Create, native);
        self.add(Method::GET, &collection, Arc::clone(resource), Endpoint::Find, native);
        self.add(Method::GET, &count, Arc::clone(resource), Endpoint::Count, native);
        self.add(Method::GET, &exists, Arc::clone(resource), Endpoint::Exists, native);
        self.add(Method::HEAD, &exists, Arc::clone(resource), Endpoint::Exists, native);
        self.add(Method::HEAD, &item, Arc::clone(resource), Endpoint::Exists, native);
        self.add(Method::GET, &item, Arc::clone(resource), Endpoint::FindById, native);
        self.add(Method::PUT, &item, Arc::clone(resource), Endpoint::Update, native);
        self.add(Method::PATCH, &item, Arc::clone(resource), Endpoint::Update, native);
        self.add(Method::DELETE, &item, Arc::clone(resource), Endpoint::Destroy, native);
        for relation in resource.relations() {
            let related = format!("{item}/{}", relation.name());
            let endpoint = Endpoint::Related(relation.name().to_string());
            self.add(Method::GET, &related, Arc::clone(resource), endpoint, native);
        }
    }

    /// Appends one route.
    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        resource: Arc<ResourceDescriptor>,
        endpoint: Endpoint,
        dispatch: Dispatch,
    ) {
        self.push(Route::new(method, pattern, resource, endpoint, dispatch));
    }

    /// Appends a prepared route.
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Returns the served routes in match order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|route| !route.removed)
    }

    /// Returns the number of served routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes().count()
    }

    /// Returns `true` if the table serves no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes().next().is_none()
    }

    /// Matches a request path, relative to the mount path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut path_known = false;

        for route in &self.routes {
            let Some(params) = route.match_path(&segments) else {
                continue;
            };
            if route.method == *method {
                if route.removed {
                    return RouteLookup::NotFound;
                }
                return RouteLookup::Matched(RouteMatch {
                    route: route.clone(),
                    params,
                });
            }
            path_known |= !route.removed;
        }

        if path_known {
            RouteLookup::MethodNotAllowed
        } else {
            RouteLookup::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> Arc<ResourceDescriptor> {
        Arc::new(
            ResourceDescriptor::builder("post")
                .field("title")
                .has_many("comments", "comment")
                .build(),
        )
    }

    fn matched(table: &RouteTable, method: Method, path: &str) -> RouteMatch {
        match table.lookup(&method, path) {
            RouteLookup::Matched(m) => m,
            other => panic!("{method} {path}: {other:?}"),
        }
    }

    #[test]
    fn test_native_surface() {
        let table = RouteTable::for_resource(&posts());
        assert_eq!(table.len(), 11);

        assert_eq!(matched(&table, Method::POST, "/posts").route().endpoint(), &Endpoint::Create);
        assert_eq!(matched(&table, Method::GET, "/posts").route().endpoint(), &Endpoint::Find);
        assert_eq!(matched(&table, Method::GET, "/posts/count").route().endpoint(), &Endpoint::Count);
        assert_eq!(
            matched(&table, Method::HEAD, "/posts/3").route().endpoint(),
            &Endpoint::Exists
        );
        assert_eq!(
            matched(&table, Method::PATCH, "/posts/3").route().endpoint(),
            &Endpoint::Update
        );

        let related = matched(&table, Method::GET, "/posts/1/comments");
        assert_eq!(related.route().endpoint().relation(), Some("comments"));
        assert_eq!(related.id(), Some("1"));
    }

    #[test]
    fn test_literal_count_wins_over_id() {
        let table = RouteTable::for_resource(&posts());
        let m = matched(&table, Method::GET, "/posts/count");
        assert_eq!(m.route().endpoint(), &Endpoint::Count);
        assert_eq!(m.id(), None);
    }

    #[test]
    fn test_not_found_vs_method_not_allowed() {
        let table = RouteTable::for_resource(&posts());
        assert!(matches!(table.lookup(&Method::GET, "/authors"), RouteLookup::NotFound));
        assert!(matches!(table.lookup(&Method::GET, "/posts/1/2/3/4"), RouteLookup::NotFound));
        assert!(matches!(
            table.lookup(&Method::DELETE, "/posts"),
            RouteLookup::MethodNotAllowed
        ));
    }

    #[test]
    fn test_trailing_slash_and_relative_paths() {
        let table = RouteTable::for_resource(&posts());
        assert_eq!(matched(&table, Method::GET, "/posts/").route().endpoint(), &Endpoint::Find);
        assert_eq!(matched(&table, Method::GET, "posts").route().endpoint(), &Endpoint::Find);
    }

    #[test]
    fn test_with_dispatch() {
        let route = Route::new(Method::POST, "/posts", posts(), Endpoint::Create, Dispatch::Native);
        let wrapped = route.with_dispatch(Dispatch::JsonApi { inbound: true });
        assert_eq!(wrapped.dispatch(), Dispatch::JsonApi { inbound: true });
        assert_eq!(wrapped.pattern(), "/posts");
        assert_eq!(route.dispatch(), Dispatch::Native);
    }

    #[test]
    fn test_removed_route_shadows_later_patterns() {
        let posts = posts();
        let mut table = RouteTable::new();
        let native = Dispatch::Native;
        let count = Route::new(Method::GET, "/posts/count", Arc::clone(&posts), Endpoint::Count, native);
        table.push(count.as_removed());
        table.add(Method::GET, "/posts/{id}", Arc::clone(&posts), Endpoint::FindById, native);
        table.add(Method::PUT, "/posts/{id}", posts, Endpoint::Update, native);

        assert_eq!(table.len(), 2);
        assert!(table.routes().all(|route| !route.is_removed()));
        assert!(matches!(table.lookup(&Method::GET, "/posts/count"), RouteLookup::NotFound));
        assert_eq!(matched(&table, Method::GET, "/posts/7").id(), Some("7"));
        assert!(matches!(
            table.lookup(&Method::DELETE, "/posts/count"),
            RouteLookup::MethodNotAllowed
        ));
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            parse_segments("/posts/{id}/comments"),
            vec![
                PathSegment::Literal("posts".into()),
                PathSegment::Param("id".into()),
                PathSegment::Literal("comments".into()),
            ]
        );
        assert!(parse_segments("/").is_empty());
    }
}
