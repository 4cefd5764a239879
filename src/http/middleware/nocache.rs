//! Cache busting for browsers that cache too eagerly.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request};

use crate::http::handler::{boxed, BoxHandler};
use crate::http::middleware::{decorator, Decorator};

const EXPIRED: &str = "Mon, 23 Aug 1982 12:00:00 GMT";

/// No-cache decorator.
///
/// Internet Explorer (`MSIE`/`Trident`) gets an expired `Expires`, a
/// revalidating `Cache-Control` and, except for `.eot` web fonts,
/// `Pragma: no-cache`. Every other agent gets `Cache-Control: private,
/// max-age=0`. Headers already set by the handler are kept.
pub fn no_cache() -> Decorator {
    decorator(|next: BoxHandler| {
        boxed(move |req: Request<Body>| {
            let next = next.clone();
            let internet_explorer = req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|ua| ua.to_str().ok())
                .is_some_and(|ua| ua.contains("MSIE") || ua.contains("Trident"));
            let web_font = req.uri().path().ends_with(".eot");
            async move {
                let mut res = next.call(req).await;
                let headers = res.headers_mut();
                if internet_explorer {
                    bust_ie_cache(headers, web_font);
                } else if !headers.contains_key(header::CACHE_CONTROL) {
                    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=0"));
                }
                res
            }
        })
    })
}

fn bust_ie_cache(headers: &mut HeaderMap, web_font: bool) {
    headers
        .entry(header::EXPIRES)
        .or_insert(HeaderValue::from_static(EXPIRED));
    if !web_font {
        headers
            .entry(header::PRAGMA)
            .or_insert(HeaderValue::from_static("no-cache"));
    }
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("must-revalidate"));
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("post-check=0, pre-check=0"));
    }
}
