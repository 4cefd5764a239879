//! Box-drawing dump of a route tree, for startup logs and debugging.
//!
//! ```text
//! / [Static] (GET)
//! └──items [Static] (GET, POST)
//!    └──/ [Static]
//!       ├──:id [Parameter] (DELETE, GET)
//!       └──new [Static] (GET)
//! ```

use std::fmt::Write;

use crate::routing::node::NodeRef;

const EMPTY: &str = "   ";
const BAR: &str = "│  ";
const MIDDLE: &str = "├──";
const LAST: &str = "└──";

/// Render `node` and everything below it. `None` renders as an empty string.
///
/// Children are listed sorted by segment, so the output only depends on
/// the tree's contents.
pub fn render(node: Option<NodeRef<'_>>) -> String {
    let mut out = String::new();
    if let Some(node) = node {
        write_line(&mut out, node);
        write_children(&mut out, node, "");
    }
    out
}

fn write_children(out: &mut String, node: NodeRef<'_>, prefix: &str) {
    let mut children: Vec<NodeRef<'_>> = node.children().collect();
    children.sort_by(|a, b| a.segment().cmp(b.segment()));

    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { LAST } else { MIDDLE });
        write_line(out, child);

        let nested = format!("{prefix}{}", if last { EMPTY } else { BAR });
        write_children(out, child, &nested);
    }
}

fn write_line(out: &mut String, node: NodeRef<'_>) {
    let _ = write!(out, "{} [{}]", node.segment(), node.kind());
    let methods = node.methods();
    if !methods.is_empty() {
        let _ = write!(out, " ({})", methods.join(", "));
    }
    out.push('\n');
}
