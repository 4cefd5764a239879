//! Route matching logic.
//!
//! # Responsibilities
//! - Walk the tree along a request path
//! - Bind parameter and catch-all segments to path text
//! - Return the matched node or an explicit no-match
//!
//! # Design Decisions
//! - Static children win over the complex child, without backtracking
//! - A catch-all consumes the whole remaining path and ends the walk
//! - Matching is read-only and O(path depth)
//! - No regex

use crate::http::request::PathVars;
use crate::routing::node::{NodeId, NodeRef, RouteTree};
use crate::routing::segment::{split, var_name, Kind};

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    /// Node the path ended at.
    pub node: NodeRef<'a>,
    /// Variables bound along the way, keyed by name without sigil.
    pub vars: PathVars,
}

impl RouteTree {
    /// Match `path` starting at the root.
    ///
    /// The leading separator belongs to the root and must already be
    /// stripped: `/items/42` is looked up as `items/42`.
    pub fn find(&self, path: &str) -> Option<Match<'_>> {
        self.find_from(NodeId::ROOT, path)
    }

    /// Match `path` starting at an arbitrary node.
    pub fn find_from(&self, from: NodeId, path: &str) -> Option<Match<'_>> {
        let mut current = self.node(from);
        let mut vars = PathVars::default();
        let mut rest = path;

        while !rest.is_empty() {
            let (head, tail) = split(rest);

            if let Some(child) = self.child_by_segment(current.id(), head) {
                current = self.node(child);
                rest = tail;
                continue;
            }

            let child = self.node(self.complex_child(current.id())?);
            match child.kind() {
                Kind::Parameter => {
                    vars.insert(var_name(child.segment()), head);
                    current = child;
                    rest = tail;
                }
                Kind::CatchAll => {
                    vars.insert(var_name(child.segment()), rest);
                    return Some(Match { node: child, vars });
                }
                Kind::Static => return None,
            }
        }

        Some(Match {
            node: current,
            vars,
        })
    }
}
