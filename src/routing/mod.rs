//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     "/items/:id"
//!     → builder.rs (split into segments, create or reuse nodes)
//!     → node.rs (arena tree, complex-child and catch-all invariants)
//!     → handler attached per method on the final node
//!
//! Incoming Request (method, path)
//!     → router.rs (strip leading '/', resolve)
//!     → matcher.rs (walk the tree, bind path variables)
//!     → Dispatch | OPTIONS answer | 404
//! ```
//!
//! # Design Decisions
//! - A static child always wins over the parent's complex child
//! - No backtracking: once a child is taken the walk never returns
//! - A catch-all swallows the rest of the path, separators included
//! - The tree is frozen before serving; hot swaps replace the whole router

pub mod builder;
pub mod error;
pub mod matcher;
pub mod node;
pub mod render;
pub mod router;
pub mod segment;
pub mod service;

pub use error::RouteError;
pub use matcher::Match;
pub use node::{NodeId, NodeRef, RouteNode, RouteTree};
pub use render::render;
pub use router::{Resolution, Route, Router};
pub use segment::Kind;
pub use service::MuxService;
