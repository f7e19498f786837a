//! Identity types for the flow graph.
//!
//! Both IDs are newtypes over `u32`. A [`StreamId`] is a direct index into
//! the graph's stream arena; an [`OperatorId`] is the process-unique ID an
//! operator declares (or is handed by [`OperatorId::next`]) and is mapped to
//! its arena slot by the graph.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// First ID handed out by [`OperatorId::next`]. Flow descriptions use small
/// explicit IDs, so generated ones start well above them.
const GENERATED_BASE: u32 = 1 << 24;

static NEXT_OPERATOR_ID: AtomicU32 = AtomicU32::new(GENERATED_BASE);

/// Process-unique operator identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OperatorId(pub u32);

impl OperatorId {
    pub const INVALID: OperatorId = OperatorId(u32::MAX);

    /// A fresh ID for an operator built in code rather than from tags.
    pub fn next() -> Self {
        OperatorId(NEXT_OPERATOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "OperatorId(INVALID)")
        } else {
            write!(f, "OperatorId({})", self.0)
        }
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index into `FlowGraph::streams`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl StreamId {
    pub const INVALID: StreamId = StreamId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "StreamId(INVALID)")
        } else {
            write!(f, "StreamId({})", self.0)
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
