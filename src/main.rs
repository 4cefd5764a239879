//! pathmux demo server
//!
//! Serves a small in-memory item store through the route tree.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum (limits, timeout, request ID, trace)
//!                         │
//!                         ▼
//!                     MuxService ──▶ Router ──▶ RouteTree::find
//!                                                   │
//!                                                   ▼
//!                     decorator chain (log, timing, no-cache, CORS)
//!                                                   │
//!     Client Response                               ▼
//!     ◀────────────────────────────────────────── handler
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use pathmux::config::{load_config, MuxConfig};
use pathmux::http::middleware::{cors, log_requests, long_polling, no_cache, server_timing, SignalFn};
use pathmux::lifecycle::{shutdown_signal, Shutdown};
use pathmux::observability::{logging, metrics};
use pathmux::{Chain, HttpServer, RequestVarsExt, RouteError, Router};

#[derive(Parser, Debug)]
#[command(name = "pathmux", version, about = "Route tree HTTP server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the route tree and exit.
    #[arg(long)]
    print_routes: bool,
}

type Store = Arc<RwLock<BTreeMap<u64, String>>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MuxConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("pathmux v{} starting", env!("CARGO_PKG_VERSION"));

    let router = build_router(&config)?;
    if cli.print_routes {
        print!("{router}");
        return Ok(());
    }
    tracing::info!("\n{}", router);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(config: &MuxConfig) -> Result<Router, RouteError> {
    let chain = Chain::new([
        log_requests(),
        server_timing(),
        no_cache(),
        cors(config.cors.clone()),
    ]);
    let (long_poll, signal) = long_polling();
    let items_chain = chain.append(long_poll);
    let store: Store = Arc::default();
    let mut router = Router::new().with_access_control(config.cors.clone());

    router.route("/")?.set_handler(
        "GET",
        chain.then(|_req: Request<Body>| async {
            Json(json!({ "service": "pathmux", "version": env!("CARGO_PKG_VERSION") }))
        }),
    );

    router
        .route("/health")?
        .set_handler("GET", chain.then(|_req: Request<Body>| async { "ok" }));

    let list = store.clone();
    let create = store.clone();
    let create_signal = signal.clone();
    router
        .route("/items")?
        .set_handler(
            "GET",
            items_chain.then(move |_req: Request<Body>| {
                let store = list.clone();
                async move { Json(json!(*store.read().await)) }
            }),
        )
        .set_handler(
            "POST",
            chain.then(move |req: Request<Body>| {
                let store = create.clone();
                let signal = create_signal.clone();
                async move {
                    let res = create_item(store, req).await;
                    notify_change(&signal, &res);
                    res
                }
            }),
        );

    router.route("/items/new")?.set_handler(
        "GET",
        chain.then(|_req: Request<Body>| async {
            Json(json!({ "name": "", "hint": "POST a name to /items" }))
        }),
    );

    let show = store.clone();
    let update = store.clone();
    let remove = store;
    let update_signal = signal.clone();
    let remove_signal = signal;
    router
        .route("/items/:id")?
        .set_handler(
            "GET",
            items_chain.then(move |req: Request<Body>| {
                let store = show.clone();
                async move {
                    let Some(id) = item_id(&req) else {
                        return StatusCode::NOT_FOUND.into_response();
                    };
                    match store.read().await.get(&id) {
                        Some(name) => Json(json!({ "id": id, "name": name })).into_response(),
                        None => StatusCode::NOT_FOUND.into_response(),
                    }
                }
            }),
        )
        .set_handler(
            "PUT",
            chain.then(move |req: Request<Body>| {
                let store = update.clone();
                let signal = update_signal.clone();
                async move {
                    let Some(id) = item_id(&req) else {
                        return StatusCode::NOT_FOUND.into_response();
                    };
                    match read_name(req).await {
                        Ok(name) => {
                            store.write().await.insert(id, name);
                            signal("/items");
                            StatusCode::NO_CONTENT.into_response()
                        }
                        Err(res) => res,
                    }
                }
            }),
        )
        .set_handler(
            "DELETE",
            chain.then(move |req: Request<Body>| {
                let store = remove.clone();
                let signal = remove_signal.clone();
                async move {
                    let removed = match item_id(&req) {
                        Some(id) => store.write().await.remove(&id).is_some(),
                        None => false,
                    };
                    if removed {
                        signal("/items");
                        StatusCode::NO_CONTENT
                    } else {
                        StatusCode::NOT_FOUND
                    }
                }
            }),
        );

    router.route("/files/*path")?.set_handler(
        "GET",
        chain.then(|req: Request<Body>| async move {
            let path = req.path_var("path").unwrap_or_default().to_string();
            Json(json!({ "path": path }))
        }),
    );

    Ok(router)
}

/// Wake long-poll waiters on `/items` after a successful write.
fn notify_change(signal: &SignalFn, res: &Response) {
    if res.status().is_success() {
        signal("/items");
    }
}

fn item_id(req: &Request<Body>) -> Option<u64> {
    req.path_var("id")?.parse().ok()
}

async fn read_name(req: Request<Body>) -> Result<String, Response> {
    let bytes = axum::body::to_bytes(req.into_body(), 64 * 1024)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE.into_response())?;
    let name = String::from_utf8(bytes.to_vec())
        .map_err(|_| StatusCode::BAD_REQUEST.into_response())?;
    let name = name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "empty name").into_response());
    }
    Ok(name.to_string())
}

/// Id after the highest one in use, if there is one.
fn next_id(items: &BTreeMap<u64, String>) -> Option<u64> {
    match items.keys().next_back() {
        Some(last) => last.checked_add(1),
        None => Some(1),
    }
}

async fn create_item(store: Store, req: Request<Body>) -> Response {
    let name = match read_name(req).await {
        Ok(name) => name,
        Err(res) => return res,
    };

    let mut items = store.write().await;
    let Some(id) = next_id(&items) else {
        return (StatusCode::INSUFFICIENT_STORAGE, "item ids exhausted").into_response();
    };
    items.insert(id, name.clone());

    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("/items/{id}"))],
        Json(json!({ "id": id, "name": name })),
    )
        .into_response()
}
