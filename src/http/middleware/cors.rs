//! CORS header negotiation.
//!
//! # Responsibilities
//! - Describe the access-control policy of a resource
//! - Answer preflight requests
//! - Decorate actual cross-origin responses
//!
//! # Design Decisions
//! - Requests without an `Origin` header pass through untouched
//! - Only non-empty policy fields produce headers
//! - The policy doubles as configuration (see `config::schema`)

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};
use serde::{Deserialize, Serialize};

use crate::http::handler::{boxed, BoxHandler};
use crate::http::middleware::Decorator;
use crate::http::response::no_content;

/// Access-control policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessControl {
    /// Value of `Access-Control-Allow-Origin`.
    pub allow_origin: String,

    /// Response headers readable by the client.
    pub expose_headers: Vec<String>,

    /// Preflight cache lifetime in seconds (0 = omitted).
    pub max_age: u64,

    /// Whether cookies and credentials may be sent.
    pub allow_credentials: bool,

    /// Methods announced on preflight.
    pub allow_methods: Vec<String>,

    /// Request headers announced on preflight.
    pub allow_headers: Vec<String>,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            max_age: 600,
            allow_methods: to_strings(&["GET", "POST", "DELETE"]),
            // Cache-Control, Content-Language, Content-Type, Expires,
            // Last-Modified and Pragma are always allowed by browsers.
            allow_headers: to_strings(&[
                "Accept",
                "Accept-Language",
                "Content-Type",
                "Authorization",
                "If-None-Match",
            ]),
            expose_headers: to_strings(&["E-Tag", "Location", "Link"]),
            allow_credentials: false,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl AccessControl {
    /// All CORS headers this policy produces.
    pub fn headers(&self) -> Vec<(HeaderName, String)> {
        let mut headers = Vec::new();
        if !self.allow_origin.is_empty() {
            headers.push((header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone()));
        }
        if !self.expose_headers.is_empty() {
            headers.push((header::ACCESS_CONTROL_EXPOSE_HEADERS, self.expose_headers.join(", ")));
        }
        if self.max_age > 0 {
            headers.push((header::ACCESS_CONTROL_MAX_AGE, self.max_age.to_string()));
        }
        if self.allow_credentials {
            headers.push((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string()));
        }
        if !self.allow_methods.is_empty() {
            headers.push((header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.join(", ")));
        }
        if !self.allow_headers.is_empty() {
            headers.push((header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.join(", ")));
        }
        headers
    }

    /// Set every header from [`AccessControl::headers`].
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in self.headers() {
            set_header(headers, name, &value);
        }
    }

    /// Headers added to an actual (non-preflight) cross-origin response.
    /// Values the handler already set are kept.
    fn apply_actual(&self, headers: &mut HeaderMap) {
        if !self.expose_headers.is_empty() {
            set_default_header(headers, header::ACCESS_CONTROL_EXPOSE_HEADERS, &self.expose_headers.join(", "));
        }
        if !self.allow_origin.is_empty() {
            set_default_header(headers, header::ACCESS_CONTROL_ALLOW_ORIGIN, &self.allow_origin);
        }
        if self.allow_credentials {
            set_default_header(headers, header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
        }
    }
}

fn set_default_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if !headers.contains_key(&name) {
        set_header(headers, name, value);
    }
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, value, "Skipping invalid CORS header value"),
    }
}

/// CORS decorator.
///
/// - no `Origin`: not a CORS request, the handler runs as usual
/// - `OPTIONS` with `Access-Control-Request-Method`: preflight, answered
///   with `204` and the full policy without calling the handler
/// - anything else: the handler runs and the response gains the
///   expose/origin/credentials headers the handler did not set itself
pub fn cors(policy: AccessControl) -> Decorator {
    let policy = Arc::new(policy);
    Arc::new(move |next: BoxHandler| -> BoxHandler {
        let policy = policy.clone();
        boxed(move |req: Request<Body>| {
            let policy = policy.clone();
            let next = next.clone();
            async move {
                if !req.headers().contains_key(header::ORIGIN) {
                    return next.call(req).await;
                }
                if req.method() == Method::OPTIONS
                    && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
                {
                    let mut res = no_content();
                    policy.apply(res.headers_mut());
                    return res;
                }
                let mut res = next.call(req).await;
                policy.apply_actual(res.headers_mut());
                res
            }
        })
    })
}
