//! End-to-end routing behavior through `Router` and `MuxService`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use pathmux::http::middleware::{cors, no_cache, AccessControl};
use pathmux::routing::Resolution;
use pathmux::{boxed, Chain, RequestVarsExt, RouteError, RouteTree, Router};

mod common;
use common::{body_text, request};

fn echo_var(name: &'static str) -> impl Fn(Request<Body>) -> std::future::Ready<String> + Send + Sync + 'static {
    move |req: Request<Body>| std::future::ready(req.path_var(name).unwrap_or("<none>").to_string())
}

fn sample_router() -> Router {
    let mut router = Router::new();
    router.route("/").unwrap().get(|_req: Request<Body>| async { "root" });
    router
        .route("/items")
        .unwrap()
        .get(|_req: Request<Body>| async { "list" })
        .post(|_req: Request<Body>| async { (StatusCode::CREATED, "created") });
    router
        .route("/items/new")
        .unwrap()
        .get(|_req: Request<Body>| async { "new form" });
    router.route("/items/:id").unwrap().get(echo_var("id"));
    router.route("/items/:id/tags").unwrap().get(echo_var("id"));
    router.route("/files/*path").unwrap().get(echo_var("path"));
    router
}

#[tokio::test]
async fn test_root_route() {
    let res = sample_router().into_service().oneshot(request("GET", "/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "root");
}

#[tokio::test]
async fn test_static_beats_parameter() {
    let service = sample_router().into_service();

    let res = service.clone().oneshot(request("GET", "/items/new")).await.unwrap();
    assert_eq!(body_text(res).await, "new form");

    let res = service.oneshot(request("GET", "/items/42")).await.unwrap();
    assert_eq!(body_text(res).await, "42");
}

#[tokio::test]
async fn test_parameter_in_middle_of_path() {
    let res = sample_router()
        .into_service()
        .oneshot(request("GET", "/items/7/tags"))
        .await
        .unwrap();
    assert_eq!(body_text(res).await, "7");
}

#[tokio::test]
async fn test_catch_all_takes_remaining_path() {
    let res = sample_router()
        .into_service()
        .oneshot(request("GET", "/files/css/site/main.css"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "css/site/main.css");
}

#[tokio::test]
async fn test_no_backtracking_after_static_match() {
    // "new" wins as the static child; it has no "tags" child and the
    // parameter sibling is never retried.
    let res = sample_router()
        .into_service()
        .oneshot(request("GET", "/items/new/tags"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let res = sample_router()
        .into_service()
        .oneshot(request("GET", "/nowhere"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(body_text(res).await, "404 page not found\n");
}

#[tokio::test]
async fn test_unregistered_method_is_404() {
    let res = sample_router()
        .into_service()
        .oneshot(request("DELETE", "/items"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_intermediate_node_without_handlers_is_404() {
    let mut router = Router::new();
    router.route("/a/b").unwrap().get(|_req: Request<Body>| async { "b" });

    let res = router.into_service().oneshot(request("GET", "/a")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_options_lists_methods() {
    let res = sample_router()
        .into_service()
        .oneshot(request("OPTIONS", "/items"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, OPTIONS"
    );
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[header::ACCESS_CONTROL_MAX_AGE], "600");
}

#[tokio::test]
async fn test_options_uses_router_policy() {
    let policy = AccessControl {
        allow_origin: "https://app.example".into(),
        max_age: 0,
        ..AccessControl::default()
    };
    let mut router = Router::new().with_access_control(policy);
    router.route("/x").unwrap().put(|_req: Request<Body>| async { "" });

    let res = router.into_service().oneshot(request("OPTIONS", "/x")).await.unwrap();
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "PUT, OPTIONS");
    assert!(res.headers().get(header::ACCESS_CONTROL_MAX_AGE).is_none());
}

#[tokio::test]
async fn test_options_on_unknown_path_is_404() {
    let res = sample_router()
        .into_service()
        .oneshot(request("OPTIONS", "/nowhere"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registration_is_idempotent() {
    let mut router = Router::new();
    let first = boxed(|_req: Request<Body>| async { "first" });
    let a = router.route("/items/:id").unwrap().id();
    router.route("/items/:id").unwrap().set_handler("GET", first.clone());
    let nodes = router.tree().unwrap().len();

    let b = router.route("/items/:id").unwrap().id();
    router.route("/items/:id").unwrap().set_handler("GET", first.clone());
    assert_eq!(a, b);
    assert_eq!(router.tree().unwrap().len(), nodes);

    match router.resolve("GET", "/items/1") {
        Resolution::Dispatch { handler, vars } => {
            assert!(Arc::ptr_eq(handler, &first));
            assert_eq!(vars.get("id"), Some("1"));
            assert_eq!(vars.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }

    let res = router.into_service().oneshot(request("GET", "/items/1")).await.unwrap();
    assert_eq!(body_text(res).await, "first");
}

#[tokio::test]
async fn test_percent_encoded_paths() {
    let mut router = Router::new();
    router.route("/items/:id").unwrap().get(echo_var("id"));
    router.route("/café").unwrap().get(|_req: Request<Body>| async { "coffee" });
    let service = router.into_service();

    let res = service.clone().oneshot(request("GET", "/items/a%20b")).await.unwrap();
    assert_eq!(body_text(res).await, "a b");

    let res = service.clone().oneshot(request("GET", "/caf%C3%A9")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "coffee");

    // an encoded separator splits the segment like a literal one
    let res = service.oneshot(request("GET", "/items/x%2Fy")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_conflicting_parameter_names() {
    let mut router = Router::new();
    router.route("/items/:id").unwrap();
    assert_eq!(
        router.route("/items/:name").unwrap_err(),
        RouteError::ComplexConflict {
            parent: "/items/".into(),
            existing: ":id".into(),
            segment: ":name".into(),
        }
    );
}

#[test]
fn test_nothing_beneath_catch_all() {
    let mut router = Router::new();
    router.route("/files/*path").unwrap();
    let err = router.route("/files/*path/more").unwrap_err();
    assert!(matches!(err, RouteError::BeneathCatchAll { .. }));
}

#[tokio::test]
async fn test_replace_subtree() {
    let mut router = Router::new();
    router.route("/api/v1").unwrap().get(|_req: Request<Body>| async { "old" });

    let mut subtree = RouteTree::with_root("api");
    let v2 = subtree.register(pathmux::routing::NodeId::ROOT, "/v2").unwrap();
    subtree.set_handler(v2, "GET", boxed(|_req: Request<Body>| async { "new" }));

    router.route("/api").unwrap().replace(&subtree).unwrap();
    let service = router.into_service();

    let res = service.clone().oneshot(request("GET", "/api/v1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = service.oneshot(request("GET", "/api/v2")).await.unwrap();
    assert_eq!(body_text(res).await, "new");
}

#[tokio::test]
async fn test_decorated_handlers() {
    let chain = Chain::new([no_cache(), cors(AccessControl::default())]);
    let mut router = Router::new();
    router.route("/d").unwrap().set_handler(
        "GET",
        chain.then(|_req: Request<Body>| async { "decorated" }),
    );

    let req = Request::builder()
        .uri("/d")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let res = router.into_service().oneshot(req).await.unwrap();
    assert_eq!(res.headers()[header::CACHE_CONTROL], "private, max-age=0");
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body_text(res).await, "decorated");
}

#[test]
fn test_display_lists_routes() {
    let text = sample_router().to_string();
    assert!(text.contains("items [Static] (GET, POST)"));
    assert!(text.contains(":id [Parameter] (GET)"));
    assert!(text.contains("*path [CatchAll] (GET)"));
}
