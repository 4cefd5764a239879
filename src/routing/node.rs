//! Route tree storage.
//!
//! # Responsibilities
//! - Own every node of the tree in a single arena
//! - Enforce the structural invariants on every append
//! - Provide read-only navigation (parent, siblings, level, full path)
//!
//! # Design Decisions
//! - Nodes refer to each other by [`NodeId`] index, parents never own children
//!   through pointers, so there are no reference cycles
//! - At most one parameter or catch-all child per node
//! - A catch-all node is always a leaf
//! - Handlers are kept in a `BTreeMap` so method listings come out sorted

use std::collections::BTreeMap;
use std::fmt;

use crate::http::handler::BoxHandler;
use crate::routing::error::RouteError;
use crate::routing::segment::{classify, Kind, SEPARATOR};

/// Index of a node inside its [`RouteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A single segment of a registered path.
#[derive(Clone)]
pub struct RouteNode {
    segment: String,
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    handlers: BTreeMap<String, BoxHandler>,
}

impl RouteNode {
    /// Create a detached node; its kind is derived from the segment.
    pub fn new(segment: impl Into<String>) -> Self {
        let segment = segment.into();
        Self {
            kind: classify(&segment),
            segment,
            parent: None,
            children: Vec::new(),
            handlers: BTreeMap::new(),
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("segment", &self.segment)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Arena holding a route tree rooted at the separator segment.
#[derive(Clone, Debug)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    /// Create a tree containing only the root node.
    pub fn new() -> Self {
        Self::with_root(SEPARATOR.to_string())
    }

    /// Create a tree whose root carries `segment`, for building a
    /// replacement subtree (see [`RouteTree::replace`]).
    pub fn with_root(segment: impl Into<String>) -> Self {
        Self {
            nodes: vec![RouteNode::new(segment)],
        }
    }

    /// Read-only view of the root.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// Read-only view of a node.
    ///
    /// Ids are only handed out by this tree, so they are always in bounds.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    /// Read-only view of a node, if the id belongs to this tree.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then(|| self.node(id))
    }

    /// Number of nodes reachable from the root, root included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        count
    }

    /// True when nothing has been registered below the root.
    pub fn is_empty(&self) -> bool {
        self.nodes[NodeId::ROOT.0].children.is_empty()
    }

    /// Attach `child` below `parent`.
    ///
    /// Fails when the parent is a catch-all, or when both the parent's
    /// existing complex child and `child` are complex. Static siblings never
    /// conflict.
    pub fn append(&mut self, parent: NodeId, mut child: RouteNode) -> Result<NodeId, RouteError> {
        let parent_node = &self.nodes[parent.0];
        if parent_node.kind == Kind::CatchAll {
            return Err(RouteError::BeneathCatchAll {
                catch_all: parent_node.segment.clone(),
                segment: child.segment,
            });
        }
        if child.kind.is_complex() {
            if let Some(existing) = self.complex_child(parent) {
                return Err(RouteError::ComplexConflict {
                    parent: self.node(parent).full_path(),
                    existing: self.nodes[existing.0].segment.clone(),
                    segment: child.segment,
                });
            }
        }

        let id = NodeId(self.nodes.len());
        child.parent = Some(parent);
        child.children.clear();
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Register `handler` for `method` on a node, replacing any previous one.
    pub fn set_handler(&mut self, id: NodeId, method: impl Into<String>, handler: BoxHandler) {
        self.nodes[id.0].handlers.insert(method.into(), handler);
    }

    /// Replace the kind, handlers and children of `id` with those of
    /// `subtree`'s root, keeping the node's identity and parent.
    ///
    /// The subtree root must carry the same segment as the target node.
    /// Nodes detached by the replacement stay in the arena but are no
    /// longer reachable.
    pub fn replace(&mut self, id: NodeId, subtree: &RouteTree) -> Result<(), RouteError> {
        let source = &subtree.nodes[NodeId::ROOT.0];
        let target = &self.nodes[id.0];
        if target.segment != source.segment {
            return Err(RouteError::SegmentMismatch {
                expected: target.segment.clone(),
                actual: source.segment.clone(),
            });
        }

        let target = &mut self.nodes[id.0];
        target.kind = source.kind;
        target.handlers = source.handlers.clone();
        target.children.clear();
        for &child in &source.children {
            self.graft(id, subtree, child);
        }
        Ok(())
    }

    /// Copy `src_id` and its descendants from `src` below `parent`.
    fn graft(&mut self, parent: NodeId, src: &RouteTree, src_id: NodeId) {
        let source = &src.nodes[src_id.0];
        let id = NodeId(self.nodes.len());
        self.nodes.push(RouteNode {
            segment: source.segment.clone(),
            kind: source.kind,
            parent: Some(parent),
            children: Vec::new(),
            handlers: source.handlers.clone(),
        });
        self.nodes[parent.0].children.push(id);
        for &child in &source.children {
            self.graft(id, src, child);
        }
    }

    /// Child whose segment equals `segment` literally.
    pub(crate) fn child_by_segment(&self, id: NodeId, segment: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].segment == segment)
    }

    /// The parameter or catch-all child, if any.
    pub(crate) fn complex_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].kind.is_complex())
    }
}

/// Borrowed view of one node and its surroundings.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a RouteTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn inner(&self) -> &'a RouteNode {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn segment(&self) -> &'a str {
        &self.inner().segment
    }

    pub fn kind(&self) -> Kind {
        self.inner().kind
    }

    pub fn is_root(&self) -> bool {
        self.inner().parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.inner().children.is_empty()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.inner().parent.map(|id| self.tree.node(id))
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.inner().children.iter().map(move |&id| tree.node(id))
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.inner().children.first().map(|&id| self.tree.node(id))
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.inner().children.last().map(|&id| self.tree.node(id))
    }

    /// The root counts as both first and last child.
    pub fn is_first_child(&self) -> bool {
        self.parent()
            .map_or(true, |p| p.first_child().map(|c| c.id) == Some(self.id))
    }

    pub fn is_last_child(&self) -> bool {
        self.parent()
            .map_or(true, |p| p.last_child().map(|c| c.id) == Some(self.id))
    }

    /// Other children of this node's parent.
    pub fn siblings(&self) -> Vec<NodeRef<'a>> {
        match self.parent() {
            Some(parent) => parent.children().filter(|c| c.id != self.id).collect(),
            None => Vec::new(),
        }
    }

    /// Depth below the root (the root is level 0).
    pub fn level(&self) -> usize {
        std::iter::successors(self.parent(), |p| p.parent()).count()
    }

    /// Registered path up to and including this node.
    pub fn full_path(&self) -> String {
        let mut segments: Vec<&str> =
            std::iter::successors(Some(*self), |n| n.parent()).map(|n| n.segment()).collect();
        segments.reverse();
        segments.concat()
    }

    /// Registered methods, sorted.
    pub fn methods(&self) -> Vec<&'a str> {
        self.inner().handlers.keys().map(String::as_str).collect()
    }

    pub fn handler(&self, method: &str) -> Option<&'a BoxHandler> {
        self.inner().handlers.get(method)
    }

    pub fn has_handlers(&self) -> bool {
        !self.inner().handlers.is_empty()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {:?}]", self.kind(), self.methods())
    }
}
