//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, limits, request ID, tracing)
//!     → routing::MuxService (route lookup, path variables)
//!     → middleware/ (decorator chain wrapped around the handler)
//!     → handler.rs (user handler)
//!     → response.rs (synthesized 404 / 204 responses)
//!     → Send to client
//! ```

pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{boxed, BoxHandler, Handler, HandlerFuture};
pub use middleware::{Chain, Decorator};
pub use request::{PathVars, RequestVarsExt};
pub use server::HttpServer;
