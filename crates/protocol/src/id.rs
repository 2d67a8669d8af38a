//! Chain and sink identifier types
//!
//! Both identifiers are lightweight `Copy` newtypes assigned sequentially
//! during topology compilation. The dispatch loop stores chains and sinks
//! in plain `Vec`s indexed by these ids, so routing a message never does
//! a hash lookup or touches a string.

use std::fmt;

/// Identifier of an assembled chain
///
/// Assigned in deterministic (source node name) order when a topology is
/// compiled. Used by source emitters, injection handles and worker-job
/// tickets to say which chain a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u32);

impl ChainId {
    /// Create a new chain ID from a numeric index
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the numeric index of this chain
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Get the index as usize (for array indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

impl From<u32> for ChainId {
    #[inline]
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

/// Identifier of a constructed sink instance
///
/// Sinks are deduplicated during compilation: a shared (fan-in) sink node
/// gets one id no matter how many chains terminate at it. Small enough to
/// fit in a register; the dispatch loop indexes its sink `Vec` with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u16);

impl SinkId {
    /// Maximum number of sinks supported
    pub const MAX: u16 = u16::MAX;

    /// Create a new sink ID from a numeric index
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Get the numeric index of this sink
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    /// Get the index as usize (for array indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink:{}", self.0)
    }
}

impl From<u16> for SinkId {
    #[inline]
    fn from(index: u16) -> Self {
        Self::new(index)
    }
}

impl From<SinkId> for usize {
    #[inline]
    fn from(id: SinkId) -> Self {
        id.0 as usize
    }
}
