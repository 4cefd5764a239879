//! Handler contract shared by the router and the middleware decorators.
//!
//! Any `Fn(Request<Body>) -> impl Future<Output = impl IntoResponse>` is a
//! [`Handler`]. Handlers are stored type-erased as [`BoxHandler`].

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

/// Future returned by every handler.
pub type HandlerFuture = BoxFuture<'static, Response>;

/// Something that turns a request into a response.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request<Body>) -> HandlerFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request<Body>) -> HandlerFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Erase a handler's type.
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}
