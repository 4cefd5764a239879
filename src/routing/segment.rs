//! Path segment classification and splitting.
//!
//! # Design Decisions
//! - The separator `/` is a segment of its own, so sibling branches share
//!   a prefix at every separator boundary
//! - Classification looks at the first byte only

use std::fmt;

/// Path separator, also the root segment.
pub const SEPARATOR: char = '/';

/// Kind of a route segment, derived from its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Literal text, matched exactly.
    Static,
    /// `:name`, captures one segment.
    Parameter,
    /// `*name`, captures the rest of the path.
    CatchAll,
}

impl Kind {
    /// Parameter and catch-all segments are "complex": at most one per parent.
    pub fn is_complex(self) -> bool {
        matches!(self, Kind::Parameter | Kind::CatchAll)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Static => "Static",
            Kind::Parameter => "Parameter",
            Kind::CatchAll => "CatchAll",
        };
        f.write_str(name)
    }
}

/// Classify a segment by its leading character.
///
/// An empty segment never comes out of [`split`]; it is treated as static.
pub fn classify(segment: &str) -> Kind {
    match segment.as_bytes().first() {
        Some(b':') => Kind::Parameter,
        Some(b'*') => Kind::CatchAll,
        _ => Kind::Static,
    }
}

/// Variable name bound by a complex segment (`:id` -> `id`, `*rest` -> `rest`).
pub fn var_name(segment: &str) -> &str {
    match classify(segment) {
        Kind::Static => segment,
        Kind::Parameter | Kind::CatchAll => &segment[1..],
    }
}

/// Split off the next segment.
///
/// A leading separator is returned as a one-character head. Otherwise the
/// head runs up to the next separator and the tail starts at it.
pub fn split(path: &str) -> (&str, &str) {
    match path.find(SEPARATOR) {
        Some(0) => path.split_at(1),
        Some(i) => path.split_at(i),
        None => (path, ""),
    }
}
