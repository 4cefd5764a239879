//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Own the route tree
//! - Hand out registration handles for attaching method handlers
//! - Turn a request into a dispatch, an OPTIONS answer or a 404
//!
//! # Design Decisions
//! - Registration needs `&mut Router`, serving only `&Router`: the tree is
//!   frozen by the time it is shared
//! - An unregistered method on a known path is a 404, exactly like an
//!   unknown path; only OPTIONS is answered with the allowed methods
//! - Path variables reach handlers through the request extensions

use std::fmt;
use std::future;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;

use crate::http::handler::{boxed, BoxHandler, Handler, HandlerFuture};
use crate::http::middleware::AccessControl;
use crate::http::request::PathVars;
use crate::http::response::{no_content, not_found};
use crate::observability::metrics::{self, Outcome};
use crate::routing::error::RouteError;
use crate::routing::node::{NodeId, RouteTree};
use crate::routing::render::render;
use crate::routing::segment::SEPARATOR;
use crate::routing::service::MuxService;

const RULE_WIDTH: usize = 75;

/// What the router decided for a method and path.
pub enum Resolution<'a> {
    /// A handler is registered for the method at the matched node.
    Dispatch {
        handler: &'a BoxHandler,
        vars: PathVars,
    },
    /// OPTIONS on a node without an OPTIONS handler; lists the node's methods.
    Options { methods: Vec<&'a str> },
    /// No node, or no handler for a non-OPTIONS method.
    NotFound,
}

impl Resolution<'_> {
    pub fn outcome(&self) -> Outcome {
        match self {
            Resolution::Dispatch { .. } => Outcome::Dispatched,
            Resolution::Options { .. } => Outcome::Options,
            Resolution::NotFound => Outcome::NotFound,
        }
    }
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Dispatch { vars, .. } => f.debug_struct("Dispatch").field("vars", vars).finish(),
            Resolution::Options { methods } => f.debug_struct("Options").field("methods", methods).finish(),
            Resolution::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Path router backed by a route tree.
#[derive(Clone, Default)]
pub struct Router {
    tree: Option<RouteTree>,
    access_control: AccessControl,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `policy` for the CORS headers of synthesized OPTIONS responses.
    pub fn with_access_control(mut self, policy: AccessControl) -> Self {
        self.access_control = policy;
        self
    }

    pub fn access_control(&self) -> &AccessControl {
        &self.access_control
    }

    /// The route tree, once anything has been registered.
    pub fn tree(&self) -> Option<&RouteTree> {
        self.tree.as_ref()
    }

    /// Register `path` and return a handle for attaching handlers to it.
    ///
    /// A leading `/` is optional. Conflicts with already registered routes
    /// are returned as errors and should abort startup.
    pub fn route(&mut self, path: &str) -> Result<Route<'_>, RouteError> {
        let tree = self.tree.get_or_insert_with(RouteTree::new);
        let relative = path.strip_prefix(SEPARATOR).unwrap_or(path);
        let node = tree.register(NodeId::ROOT, relative)?;
        Ok(Route { tree, node })
    }

    /// Decide what to do with `method` on `path` without dispatching.
    pub fn resolve(&self, method: &str, path: &str) -> Resolution<'_> {
        let Some(tree) = &self.tree else {
            return Resolution::NotFound;
        };
        let relative = path.strip_prefix(SEPARATOR).unwrap_or(path);
        let Some(found) = tree.find(relative) else {
            return Resolution::NotFound;
        };

        match found.node.handler(method) {
            Some(handler) => Resolution::Dispatch {
                handler,
                vars: found.vars,
            },
            None if method == Method::OPTIONS.as_str() => Resolution::Options {
                methods: found.node.methods(),
            },
            None => Resolution::NotFound,
        }
    }

    /// Route a request and run the matching handler.
    ///
    /// The path is percent-decoded before matching, so `%2F` inside a
    /// segment acts as a separator.
    pub fn serve(&self, mut req: Request<Body>) -> HandlerFuture {
        let method = req.method().as_str().to_owned();
        let path = decode_path(req.uri().path());
        let resolution = self.resolve(&method, &path);
        metrics::record_request(&method, resolution.outcome());

        match resolution {
            Resolution::Dispatch { handler, vars } => {
                tracing::debug!(method = %method, path = %path, vars = ?vars, "Dispatching request");
                req.extensions_mut().insert(vars);
                handler.call(req)
            }
            Resolution::Options { methods } => {
                tracing::debug!(method = %method, path = %path, allow = ?methods, "Answering OPTIONS");
                Box::pin(future::ready(self.options_response(&methods)))
            }
            Resolution::NotFound => {
                tracing::debug!(method = %method, path = %path, "No route matched");
                Box::pin(future::ready(not_found()))
            }
        }
    }

    fn options_response(&self, methods: &[&str]) -> Response {
        let mut policy = self.access_control.clone();
        policy.allow_methods = methods.iter().map(|m| m.to_string()).collect();
        policy.allow_methods.push(Method::OPTIONS.to_string());

        let mut res = no_content();
        policy.apply(res.headers_mut());
        res
    }

    /// Freeze the router into a cloneable `tower::Service`.
    pub fn into_service(self) -> MuxService {
        MuxService::new(self)
    }
}

/// Percent-decode a request path; invalid UTF-8 is replaced, not rejected.
pub fn decode_path(path: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        f.write_str(&render(self.tree.as_ref().map(RouteTree::root)))?;
        writeln!(f, "{rule}")
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.tree.as_ref().map_or(0, RouteTree::len))
            .field("access_control", &self.access_control)
            .finish()
    }
}

/// Registration handle for one path.
pub struct Route<'a> {
    tree: &'a mut RouteTree,
    node: NodeId,
}

impl fmt::Debug for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("node", &self.node).finish()
    }
}

impl Route<'_> {
    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn full_path(&self) -> String {
        self.tree.node(self.node).full_path()
    }

    /// Methods registered so far, sorted.
    pub fn methods(&self) -> Vec<String> {
        self.tree
            .node(self.node)
            .methods()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Attach an already boxed handler; registering a method again replaces it.
    pub fn set_handler(&mut self, method: impl Into<String>, handler: BoxHandler) -> &mut Self {
        let method = method.into();
        tracing::debug!(method = %method, path = %self.full_path(), "Route registered");
        self.tree.set_handler(self.node, method, handler);
        self
    }

    pub fn handle<H: Handler>(&mut self, method: impl Into<String>, handler: H) -> &mut Self {
        self.set_handler(method, boxed(handler))
    }

    pub fn get<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::GET.as_str(), handler)
    }

    pub fn post<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::POST.as_str(), handler)
    }

    pub fn put<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::PUT.as_str(), handler)
    }

    pub fn patch<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::PATCH.as_str(), handler)
    }

    pub fn delete<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::DELETE.as_str(), handler)
    }

    pub fn head<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::HEAD.as_str(), handler)
    }

    pub fn options<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handle(Method::OPTIONS.as_str(), handler)
    }

    /// Swap this node's handlers and subtree for those of `subtree`.
    pub fn replace(&mut self, subtree: &RouteTree) -> Result<(), RouteError> {
        self.tree.replace(self.node, subtree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn handler(body: &'static str) -> BoxHandler {
        boxed(move |_req: Request<Body>| async move { body })
    }

    #[test]
    fn test_empty_router() {
        let router = Router::new();
        assert!(router.tree().is_none());
        assert!(matches!(router.resolve("GET", "/"), Resolution::NotFound));

        let rule = "-".repeat(75);
        assert_eq!(router.to_string(), format!("{rule}\n{rule}\n"));
    }

    #[test]
    fn test_resolve_dispatch() {
        let mut router = Router::new();
        let show = handler("show");
        router.route("/items/:id").unwrap().set_handler("GET", show.clone());

        match router.resolve("GET", "/items/42") {
            Resolution::Dispatch { handler, vars } => {
                assert!(Arc::ptr_eq(handler, &show));
                assert_eq!(vars.get("id"), Some("42"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_resolve_unregistered_method() {
        let mut router = Router::new();
        router.route("/items").unwrap().get(|_req: Request<Body>| async { "list" });

        assert!(matches!(router.resolve("POST", "/items"), Resolution::NotFound));
        match router.resolve("OPTIONS", "/items") {
            Resolution::Options { methods } => assert_eq!(methods, vec!["GET"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_registered_options_handler_wins() {
        let mut router = Router::new();
        router
            .route("/items")
            .unwrap()
            .options(|_req: Request<Body>| async { "custom" });
        assert!(matches!(
            router.resolve("OPTIONS", "/items"),
            Resolution::Dispatch { .. }
        ));
    }

    #[test]
    fn test_route_without_leading_separator() {
        let mut router = Router::new();
        let a = router.route("items").unwrap().id();
        let b = router.route("/items").unwrap().id();
        assert_eq!(a, b);
    }

    #[test]
    fn test_route_conflict() {
        let mut router = Router::new();
        router.route("/items/:id").unwrap();
        let err = router.route("/items/:slug").unwrap_err();
        assert!(matches!(err, RouteError::ComplexConflict { .. }));
    }

    #[test]
    fn test_route_handle_methods() {
        let mut router = Router::new();
        let mut route = router.route("/things").unwrap();
        route
            .get(|_req: Request<Body>| async { "" })
            .post(|_req: Request<Body>| async { "" })
            .delete(|_req: Request<Body>| async { "" })
            .handle("PURGE", |_req: Request<Body>| async { "" });
        assert_eq!(route.methods(), vec!["DELETE", "GET", "POST", "PURGE"]);
        assert_eq!(route.full_path(), "/things");
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/items/a%20b"), "/items/a b");
        assert_eq!(decode_path("/caf%C3%A9"), "/café");
        assert_eq!(decode_path("/x%2Fy"), "/x/y");
        assert_eq!(decode_path("/100%"), "/100%");
        assert_eq!(decode_path("/plain"), "/plain");
    }

    #[test]
    fn test_display_renders_tree() {
        let mut router = Router::new();
        router.route("/a").unwrap().get(|_req: Request<Body>| async { "" });
        let rule = "-".repeat(75);
        assert_eq!(
            router.to_string(),
            format!("{rule}\n/ [Static]\n└──a [Static] (GET)\n{rule}\n")
        );
    }
}
