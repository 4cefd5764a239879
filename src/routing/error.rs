//! Route registration errors.

use thiserror::Error;

/// Errors raised while building the route tree.
///
/// All of them are configuration mistakes in the route table and should
/// abort startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A parent may hold a single parameter or catch-all child.
    #[error("cannot add {segment:?} under {parent:?}: complex child {existing:?} already registered")]
    ComplexConflict {
        parent: String,
        existing: String,
        segment: String,
    },

    /// Nothing may be registered below a catch-all segment.
    #[error("cannot add {segment:?} beneath catch-all {catch_all:?}")]
    BeneathCatchAll { catch_all: String, segment: String },

    /// A subtree can only replace a node with the same segment.
    #[error("unable to replace route: expected segment {expected:?}, got {actual:?}")]
    SegmentMismatch { expected: String, actual: String },
}
