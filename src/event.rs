/// Event system for the deterministic simulation kernel.
///
/// Every effect in Polaris is modeled as an `Event`: packets entering
/// and leaving links, protocol timers, administrative link toggles.
/// Events are immutable records placed on the scheduler's priority
/// queue and dispatched in deterministic order.

use std::cmp::Ordering;

use crate::net::{LinkId, NodeId};
use crate::packet::{Packet, ProtocolId};
use crate::time::VirtualTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// A globally unique, strictly increasing event identifier.
///
/// The monotonic nature of `EventId` breaks ties in the scheduler: two
/// events scheduled at the same `VirtualTime` are ordered by their
/// `EventId`, which corresponds to creation order. This is what gives
/// equal-time events their first-in-first-out guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Wrap a raw u64 into an `EventId`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// Return the raw value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Deterministic, strictly increasing event-ID generator.
///
/// Each `Simulation` owns exactly one. The simulation is
/// single-threaded, so a plain counter is trivially deterministic.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    /// Create a generator starting at 0.
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Event Type ────────────────────────────────────────────────────────

/// The payload of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// A no-op event, used for testing and padding schedules.
    Noop,

    /// A node hands a packet to the transport layer. The runtime fans
    /// a broadcast out over the node's up links, or resolves a unicast
    /// destination through the node's forwarding table.
    PacketSend { from: NodeId, packet: Packet },

    /// A packet has crossed a link and is ready for the node at the
    /// link's receiving end.
    PacketDelivery { link: LinkId, packet: Packet },

    /// A timer fires for one protocol instance on one node.
    ProtocolTimer {
        node: NodeId,
        protocol: ProtocolId,
        timer_id: u64,
    },

    /// Administratively raise or lower a link. Scheduled by fault
    /// plans, never by protocol logic.
    LinkSet { link: LinkId, up: bool },
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Noop => write!(f, "Noop"),
            EventType::PacketSend { from, packet } => {
                write!(f, "Send({} : {})", from, packet)
            }
            EventType::PacketDelivery { link, packet } => {
                write!(f, "Deliver({} : {})", link, packet)
            }
            EventType::ProtocolTimer {
                node,
                protocol,
                timer_id,
            } => write!(f, "Timer({}, {}, #{})", node, protocol, timer_id),
            EventType::LinkSet { link, up } => {
                write!(f, "LinkSet({}, {})", link, if *up { "up" } else { "down" })
            }
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A single simulation event.
///
/// The scheduler orders events by `(scheduled_at, id)` to guarantee a
/// deterministic processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unique identifier (monotonically increasing).
    pub id: EventId,

    /// The virtual time at which this event should be dispatched.
    pub scheduled_at: VirtualTime,

    /// The event payload.
    pub payload: EventType,
}

impl Event {
    /// Convenience constructor.
    pub fn new(id: EventId, scheduled_at: VirtualTime, payload: EventType) -> Self {
        Event {
            id,
            scheduled_at,
            payload,
        }
    }
}

/// Ordering: smallest `(scheduled_at, id)` first.
///
/// Rust's `BinaryHeap` is a max-heap, so the natural ordering is
/// reversed here to turn it into a min-heap.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .scheduled_at
            .cmp(&self.scheduled_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
