//! Long polling with ETag-based change detection.
//!
//! A client that already holds the current representation of a path sends
//! `If-None-Match: <etag>` together with `Long-Poll: <seconds>`. The request
//! is parked until the path is signalled or the timeout elapses; a timeout
//! answers `304 Not Modified`.
//!
//! # Design Decisions
//! - Waiters hold a `watch::Receiver`; signalling drops the sender, which
//!   wakes every waiter including ones that subscribed but have not polled yet
//! - ETags are remembered per request path; signalling a prefix forgets
//!   every ETag and wakes every waiter below it
//! - An ETag computed from a response that started before the last signal
//!   for its path is not remembered

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::Response;
use sha1::{Digest, Sha1};
use tokio::sync::watch;

use crate::http::handler::{boxed, BoxHandler};
use crate::http::middleware::{decorator, Decorator};

/// Request header carrying the maximum wait in seconds.
pub const LONG_POLL: &str = "long-poll";

/// Only session used by the decorator; every client shares its ETags.
const DEFAULT_SESSION: &str = "default";

/// Callback invalidating every path starting with the given prefix.
pub type SignalFn = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct State {
    signals: HashMap<String, watch::Sender<()>>,
    last_signals: HashMap<String, Instant>,
    session_etags: HashMap<String, HashMap<String, String>>,
}

/// Change-notification state shared by a long-poll decorator and its signal.
#[derive(Default)]
pub struct Manager {
    state: Mutex<State>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidate every key starting with `prefix` and wake its waiters.
    pub fn signal(&self, prefix: &str) {
        let mut state = self.state();

        state.session_etags.retain(|_, etags| {
            etags.retain(|key, _| !key.starts_with(prefix));
            !etags.is_empty()
        });
        state.last_signals.insert(prefix.to_string(), Instant::now());

        // dropping a sender wakes its receivers
        state.signals.retain(|key, _| !key.starts_with(prefix));
        tracing::debug!(prefix, "Long-poll signal");
    }

    /// A receiver that wakes on the next signal covering `key`.
    pub fn subscribe(&self, key: &str) -> watch::Receiver<()> {
        let mut state = self.state();
        state
            .signals
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(()).0)
            .subscribe()
    }

    /// Subscribe to `key`, but only if `etag` is still its current ETag.
    fn subscribe_if_current(&self, session: &str, key: &str, etag: &str) -> Option<watch::Receiver<()>> {
        let mut state = self.state();
        let current = state.session_etags.get(session).and_then(|etags| etags.get(key));
        if current.map(String::as_str) != Some(etag) {
            return None;
        }
        Some(
            state
                .signals
                .entry(key.to_string())
                .or_insert_with(|| watch::channel(()).0)
                .subscribe(),
        )
    }

    /// Last ETag recorded for `key` in `session`.
    pub fn etag(&self, session: &str, key: &str) -> Option<String> {
        self.state()
            .session_etags
            .get(session)
            .and_then(|etags| etags.get(key))
            .cloned()
    }

    /// Remember `etag` for `key`, unless a signal covering `key` arrived
    /// after `started`.
    pub fn record_etag(&self, started: Instant, session: &str, key: &str, etag: &str) {
        let mut state = self.state();
        let stale = state
            .last_signals
            .iter()
            .any(|(prefix, last)| key.starts_with(prefix.as_str()) && *last > started);
        if stale {
            return;
        }
        state
            .session_etags
            .entry(session.to_string())
            .or_default()
            .insert(key.to_string(), etag.to_string());
    }

    /// Decorator sharing this manager.
    pub fn decorator(self: &Arc<Self>) -> Decorator {
        let manager = self.clone();
        decorator(move |next: BoxHandler| {
            let manager = manager.clone();
            boxed(move |req: Request<Body>| {
                let manager = manager.clone();
                let next = next.clone();
                async move { long_poll(&manager, next, req).await }
            })
        })
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Manager")
            .field("waiting_keys", &state.signals.len())
            .field("sessions", &state.session_etags.len())
            .finish()
    }
}

/// A long-poll decorator and the function that signals it.
pub fn long_polling() -> (Decorator, SignalFn) {
    let manager = Arc::new(Manager::new());
    let middleware = manager.decorator();
    let signal: SignalFn = Arc::new(move |prefix: &str| manager.signal(prefix));
    (middleware, signal)
}

fn header_str(req: &Request<Body>, name: impl header::AsHeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// `"<length>-<sha1 hex>"` of a response body.
pub fn body_etag(body: &[u8]) -> String {
    format!("\"{}-{:x}\"", body.len(), Sha1::digest(body))
}

fn not_modified(etag: &str) -> Response {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::NOT_MODIFIED;
    if let Ok(value) = HeaderValue::from_str(etag) {
        res.headers_mut().insert(header::ETAG, value);
    }
    res
}

async fn long_poll(manager: &Manager, next: BoxHandler, req: Request<Body>) -> Response {
    let key = req.uri().path().to_owned();
    let if_none_match = header_str(&req, header::IF_NONE_MATCH);

    if let (Some(wait), Some(etag)) = (header_str(&req, LONG_POLL), if_none_match.as_deref()) {
        if let Some(mut changed) = manager.subscribe_if_current(DEFAULT_SESSION, &key, etag) {
            let secs = wait.trim().parse::<u64>().unwrap_or(0).max(1);
            // Err from changed() means the sender was dropped by a signal
            if tokio::time::timeout(Duration::from_secs(secs), changed.changed())
                .await
                .is_err()
            {
                return not_modified(etag);
            }
        }
    }

    let started = Instant::now();
    let res = next.call(req).await;
    if res.status() != StatusCode::OK {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %key, error = %e, "Failed to buffer long-poll response");
            let mut res = Response::new(Body::empty());
            *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return res;
        }
    };

    let etag = match parts.headers.get(header::ETAG).and_then(|v| v.to_str().ok()) {
        Some(existing) => existing.to_owned(),
        None => {
            let computed = body_etag(&bytes);
            if let Ok(value) = HeaderValue::from_str(&computed) {
                parts.headers.insert(header::ETAG, value);
            }
            computed
        }
    };
    manager.record_etag(started, DEFAULT_SESSION, &key, &etag);

    if if_none_match.as_deref() == Some(etag.as_str()) {
        parts.status = StatusCode::NOT_MODIFIED;
        parts.headers.remove(header::CONTENT_LENGTH);
        return Response::from_parts(parts, Body::empty());
    }
    Response::from_parts(parts, Body::from(bytes))
}
