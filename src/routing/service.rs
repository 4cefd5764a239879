//! `tower::Service` front for a [`Router`].
//!
//! The router sits behind an `ArcSwap` so a whole new route table can be
//! published while requests are in flight. Requests already dispatched keep
//! the table they started with.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::Service;

use crate::http::handler::HandlerFuture;
use crate::routing::router::Router;

/// Cloneable service dispatching through the current router.
#[derive(Clone)]
pub struct MuxService {
    current: Arc<ArcSwap<Router>>,
}

impl MuxService {
    pub fn new(router: Router) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(router)),
        }
    }

    /// Snapshot of the router currently serving requests.
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Publish a new router. Every clone of this service sees it.
    pub fn replace(&self, router: Router) {
        tracing::info!("Route table replaced\n{}", router);
        self.current.store(Arc::new(router));
    }

    pub fn serve(&self, req: Request<Body>) -> HandlerFuture {
        self.current.load().serve(req)
    }
}

impl std::fmt::Debug for MuxService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuxService")
            .field("router", &*self.current.load())
            .finish()
    }
}

impl Service<Request<Body>> for MuxService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let fut = self.serve(req);
        Box::pin(async move { Ok(fut.await) })
    }
}
