//! `Server-Timing` marks.

use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};

use crate::http::handler::{boxed, BoxHandler};
use crate::http::middleware::{decorator, Decorator};

pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Accumulates named durations, each measured from the previous mark.
#[derive(Debug, Clone)]
pub struct ServerTiming {
    since: Instant,
    marks: Vec<String>,
}

impl Default for ServerTiming {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerTiming {
    pub fn new() -> Self {
        Self {
            since: Instant::now(),
            marks: Vec::new(),
        }
    }

    /// Record the time since the last mark (or creation) under `key`.
    pub fn mark(&mut self, key: &str) {
        let ms = self.since.elapsed().as_secs_f64() * 1000.0;
        self.marks.push(format!("{key}={ms:.1}"));
        self.since = Instant::now();
    }

    pub fn marks(&self) -> &[String] {
        &self.marks
    }

    /// Append a `Server-Timing` header. Nothing is written without marks.
    pub fn write_to(&self, headers: &mut HeaderMap) {
        if self.marks.is_empty() {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&self.marks.join(", ")) {
            headers.append(SERVER_TIMING, value);
        }
    }
}

/// Report the inner handler's duration as a `handler` timing mark.
pub fn server_timing() -> Decorator {
    decorator(|next: BoxHandler| {
        boxed(move |req: Request<Body>| {
            let next = next.clone();
            async move {
                let mut timing = ServerTiming::new();
                let mut res = next.call(req).await;
                timing.mark("handler");
                timing.write_to(res.headers_mut());
                res
            }
        })
    })
}
