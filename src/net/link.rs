//! Directed links with propagation delay and administrative state.

use super::node::NodeId;

/// A unique identifier for a directed link.
///
/// Link IDs are handles into the owning [`Topology`](super::Topology);
/// they are what routing tables store as next hops, so they are cheap
/// to copy and ordered for deterministic iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(u64);

impl LinkId {
    /// Create a link ID from a raw integer.
    #[inline]
    pub const fn new(id: u64) -> Self {
        LinkId(id)
    }

    /// Return the underlying integer.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One direction of a connection between two nodes.
///
/// A bidirectional connection is modeled as a pair of `Link`s, one per
/// direction, so each direction can be delayed or brought down
/// independently. A link that is down silently drops every packet the
/// transport attempts across it; senders are never notified.
#[derive(Debug, Clone)]
pub struct Link {
    src: NodeId,
    dst: NodeId,
    delay: u64,
    up: bool,
}

impl Link {
    /// Create a new link. Links start in the up state.
    pub fn new(src: NodeId, dst: NodeId, delay: u64) -> Self {
        Link {
            src,
            dst,
            delay,
            up: true,
        }
    }

    /// The sending end.
    pub fn src(&self) -> NodeId {
        self.src
    }

    /// The receiving end.
    pub fn dst(&self) -> NodeId {
        self.dst
    }

    /// Propagation delay in ticks.
    pub fn delay(&self) -> u64 {
        self.delay
    }

    /// Whether the link currently carries traffic.
    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Administratively raise the link.
    pub fn set_up(&mut self) {
        self.up = true;
    }

    /// Administratively lower the link.
    pub fn set_down(&mut self) {
        self.up = false;
    }

    /// Set the administrative state directly.
    pub fn set_state(&mut self, up: bool) {
        self.up = up;
    }
}
