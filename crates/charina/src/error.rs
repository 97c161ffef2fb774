//! Error types for the value bridge.
//!
//! Conversion fails synchronously at the point of detection and never
//! produces a partial result. Every error carries the path from the root of
//! the source value to the offending node so callers can diagnose exactly
//! where a conversion went wrong.

use std::fmt;

/// One step in a [`ValuePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Position within an ordered sequence.
    Index(usize),
    /// Key of a mapping entry, rendered as text.
    Key(String),
    /// Membership in a set (sets have no stable position).
    SetMember,
}

/// The path from the root of a conversion to a specific node.
///
/// Rendered in a JSONPath-like notation, e.g. `$["headers"][0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    /// The path of the root value itself.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn from_segments(segments: &[PathSegment]) -> Self {
        Self(segments.to_vec())
    }

    /// The individual steps of this path, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Key(k) => write!(f, "[\"{k}\"]")?,
                PathSegment::SetMember => f.write_str("[<set>]")?,
            }
        }
        Ok(())
    }
}

/// A cycle in the source value that the bridge cannot reproduce on the
/// host side.
///
/// Cycles through default-converted containers are supported (the produced
/// target graph is itself cyclic). This error is raised only for cycles the
/// algorithm cannot tie back: ones passing through a hook-rendered mapping,
/// or re-entering through a set element that is still being built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cyclic structure: {type_name} at {path} is its own ancestor")]
pub struct CyclicStructureError {
    /// Python type name of the node where the cycle was detected.
    pub type_name: String,
    /// Path at which traversal re-entered the node.
    pub path: ValuePath,
}

/// Errors raised while converting a source value to a host value.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The value has no structural JavaScript equivalent and no proxy
    /// fallback was possible.
    #[error("no JavaScript representation for {type_name} at {path}")]
    Unrepresentable {
        /// Python type name of the offending value.
        type_name: String,
        /// Where the value sits in the source graph.
        path: ValuePath,
    },

    /// A proxy would have been created, but proxy creation is disabled.
    #[error("proxy creation is disabled, cannot convert {type_name} at {path}")]
    ProxyCreationDisabled {
        /// Python type name of the offending value.
        type_name: String,
        /// Where the value sits in the source graph.
        path: ValuePath,
    },

    /// A proxy was used after being destroyed.
    #[error("proxy {id} has been destroyed")]
    ProxyDestroyed {
        /// Identifier of the destroyed proxy.
        id: u64,
    },

    /// Traversal descended past the configured recursion limit.
    #[error("recursion limit of {limit} exceeded at {path}")]
    RecursionLimitExceeded {
        /// The configured limit.
        limit: usize,
        /// Path at which the limit was hit.
        path: ValuePath,
    },

    /// A caller-supplied converter hook failed.
    #[error("converter hook failed at {path}: {source}")]
    Hook {
        /// The hook's failure.
        source: crate::converter::HookError,
        /// Mapping node the hook was invoked for.
        path: ValuePath,
    },

    /// Traversal would not terminate.
    #[error(transparent)]
    Cyclic(#[from] CyclicStructureError),
}
