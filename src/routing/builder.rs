//! Incremental route registration.
//!
//! # Responsibilities
//! - Walk the tree along a path, one segment at a time
//! - Create the nodes that do not exist yet
//! - Surface structural conflicts as [`RouteError`]
//!
//! # Design Decisions
//! - Existing children are found by literal segment only, so `:id` and
//!   `:name` are different segments
//! - Registration ends at whatever node the path ends at, not necessarily
//!   a leaf

use crate::routing::error::RouteError;
use crate::routing::node::{NodeId, RouteNode, RouteTree};
use crate::routing::segment::split;

impl RouteTree {
    /// Extend the tree below `from` with `path` and return the terminal node.
    ///
    /// Registering the same path twice returns the same node.
    pub fn register(&mut self, from: NodeId, path: &str) -> Result<NodeId, RouteError> {
        let mut current = from;
        let mut rest = path;
        loop {
            let (head, tail) = split(rest);
            if head.is_empty() {
                return Ok(current);
            }
            current = match self.child_by_segment(current, head) {
                Some(child) => child,
                None => {
                    let child = self.append(current, RouteNode::new(head))?;
                    tracing::trace!(
                        segment = head,
                        full_path = %self.node(child).full_path(),
                        "Route node created"
                    );
                    child
                }
            };
            rest = tail;
        }
    }
}
