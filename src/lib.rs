//! In-process HTTP request router backed by a segment tree.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::MuxConfig;
pub use http::{boxed, BoxHandler, Chain, Handler, HttpServer, PathVars, RequestVarsExt};
pub use lifecycle::Shutdown;
pub use routing::{render, MuxService, Route, RouteError, RouteTree, Router};
