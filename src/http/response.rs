//! Responses produced by the router itself.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Plain-text 404, used for unknown paths and unregistered methods alike.
pub fn not_found() -> Response {
    let mut res = Response::new(Body::from(NOT_FOUND_BODY));
    *res.status_mut() = StatusCode::NOT_FOUND;
    let headers = res.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    res
}

/// Empty `204 No Content`.
pub fn no_content() -> Response {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::NO_CONTENT;
    res
}
