//! Handler decorators.
//!
//! # Data Flow
//! ```text
//! Chain [d1, d2, d3].then(handler)
//!     → d1(d2(d3(handler)))
//!     → request enters d1 first, handler last
//! ```
//!
//! # Design Decisions
//! - A decorator is any `Fn(BoxHandler) -> BoxHandler`
//! - Chains are values: appending returns a new chain
//! - Decorators never see the route tree

use std::sync::Arc;

use crate::http::handler::{boxed, BoxHandler, Handler};

pub mod cors;
pub mod logging;
pub mod longpoll;
pub mod nocache;
pub mod timing;

pub use cors::{cors, AccessControl};
pub use logging::{dump_request, log_requests};
pub use longpoll::{long_polling, SignalFn};
pub use nocache::no_cache;
pub use timing::{server_timing, ServerTiming};

/// Wraps a handler, producing a handler.
pub type Decorator = Arc<dyn Fn(BoxHandler) -> BoxHandler + Send + Sync>;

/// Turn a closure into a [`Decorator`].
pub fn decorator<F>(f: F) -> Decorator
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered list of decorators, outermost first.
#[derive(Clone, Default)]
pub struct Chain {
    decorators: Vec<Decorator>,
}

impl Chain {
    pub fn new(decorators: impl IntoIterator<Item = Decorator>) -> Self {
        Self {
            decorators: decorators.into_iter().collect(),
        }
    }

    /// A new chain with `decorator` added innermost; `self` is unchanged.
    pub fn append(&self, decorator: Decorator) -> Self {
        let mut decorators = self.decorators.clone();
        decorators.push(decorator);
        Self { decorators }
    }

    /// Wrap `handler` in every decorator of the chain.
    pub fn then<H: Handler>(&self, handler: H) -> BoxHandler {
        self.then_boxed(boxed(handler))
    }

    pub fn then_boxed(&self, handler: BoxHandler) -> BoxHandler {
        self.decorators
            .iter()
            .rev()
            .fold(handler, |inner, decorate| decorate(inner))
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("decorators", &self.decorators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};

    /// Appends `tag` to the `x-trace` response header.
    fn tag(tag: &'static str) -> Decorator {
        decorator(move |next: BoxHandler| {
            boxed(move |req: Request<Body>| {
                let next = next.clone();
                async move {
                    let mut res = next.call(req).await;
                    let trace = res
                        .headers()
                        .get("x-trace")
                        .and_then(|v| v.to_str().ok())
                        .map(|v| format!("{v},{tag}"))
                        .unwrap_or_else(|| tag.to_string());
                    res.headers_mut()
                        .insert("x-trace", HeaderValue::from_str(&trace).unwrap());
                    res
                }
            })
        })
    }

    async fn trace_of(handler: BoxHandler) -> String {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = handler.call(req).await;
        res.headers()
            .get("x-trace")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_chain_order() {
        let chain = Chain::new([tag("outer"), tag("middle"), tag("inner")]);
        let handler = chain.then(|_req: Request<Body>| async { "ok" });
        // responses unwind from the innermost decorator outwards
        assert_eq!(trace_of(handler).await, "inner,middle,outer");
    }

    #[tokio::test]
    async fn test_append_leaves_original() {
        let base = Chain::new([tag("a")]);
        let extended = base.append(tag("b"));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);

        let handler = extended.then(|_req: Request<Body>| async { "ok" });
        assert_eq!(trace_of(handler).await, "b,a");
        let handler = base.then(|_req: Request<Body>| async { "ok" });
        assert_eq!(trace_of(handler).await, "a");
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = Chain::default();
        assert!(chain.is_empty());
        let handler = chain.then(|_req: Request<Body>| async { "ok" });
        assert_eq!(trace_of(handler).await, "");
    }
}
