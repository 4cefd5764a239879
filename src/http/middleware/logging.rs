//! Request logging decorators.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;

use crate::http::handler::{boxed, BoxHandler};
use crate::http::middleware::{decorator, Decorator};
use crate::observability::metrics;

/// Log every request once its handler has produced a response.
pub fn log_requests() -> Decorator {
    decorator(|next: BoxHandler| {
        boxed(move |req: Request<Body>| {
            let next = next.clone();
            let remote = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_else(|| "-".to_string());
            let method = req.method().clone();
            let uri = req.uri().clone();
            async move {
                let start = Instant::now();
                let res = next.call(req).await;
                let status = res.status().as_u16();
                tracing::info!(
                    remote = %remote,
                    method = %method,
                    uri = %uri,
                    status,
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Request served"
                );
                metrics::record_duration(method.as_str(), status, start);
                res
            }
        })
    })
}

/// Dump the request line and headers at debug level before dispatch.
pub fn dump_request() -> Decorator {
    decorator(|next: BoxHandler| {
        boxed(move |req: Request<Body>| {
            tracing::debug!(
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
                headers = ?req.headers(),
                "Request dump"
            );
            next.call(req)
        })
    })
}
