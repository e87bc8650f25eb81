//! The `Protocol` trait and `SimulationContext` extensions for
//! protocol-level scheduling.

use crate::event::{EventId, EventType};
use crate::packet::{Packet, ProtocolId};
use crate::simulation::SimulationContext;

use super::link::LinkId;
use super::node::{Node, NodeId};

// ── ProtocolEvent ─────────────────────────────────────────────────────

/// The events a protocol instance can receive.
///
/// These are *logical* events dispatched by
/// [`NetRuntime`](super::NetRuntime). The underlying scheduler speaks
/// [`EventType`]; the runtime translates the relevant variants and
/// delivers them to the handler registered on the addressed node under
/// the matching protocol tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// A packet addressed to this node (or broadcast) arrived.
    Packet(Packet),
    /// A previously scheduled protocol timer fired.
    Timer { timer_id: u64 },
}

// ── Protocol ──────────────────────────────────────────────────────────

/// Trait implemented by every per-node protocol instance.
///
/// Handlers react to [`ProtocolEvent`]s and may schedule follow-up
/// events through the provided [`SimulationContext`]. The runtime also
/// lends the handler a mutable reference to its owning [`Node`] so it
/// can consult links and rewrite the forwarding table.
///
/// # Contract
///
/// Implementations **must**:
/// - Not use global mutable state.
/// - Route all side effects through `ctx` or the lent `node`.
/// - Be deterministic for equal inputs.
pub trait Protocol {
    /// React to a dispatched event.
    fn on_event(&mut self, ctx: &mut SimulationContext, node: &mut Node, event: ProtocolEvent);

    /// Downcast support, required for
    /// [`NetRuntime::protocol`](super::NetRuntime::protocol).
    fn as_any(&self) -> &dyn std::any::Any;
    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ── SimulationContext protocol extensions ─────────────────────────────

/// Extension methods on `SimulationContext` for protocol-level
/// scheduling. These are the primary API protocol handlers use to
/// interact with the simulation.
impl SimulationContext<'_> {
    /// Hand a packet to the transport layer on behalf of `from`.
    ///
    /// Schedules a `PacketSend` at the current time; the runtime fans
    /// broadcasts out over the node's up links and resolves unicasts
    /// through the node's forwarding table.
    pub fn transmit(&mut self, from: NodeId, packet: Packet) -> EventId {
        self.schedule_after(0, EventType::PacketSend { from, packet })
    }

    /// Schedule a timer for one protocol instance on `node` to fire
    /// after `delay` ticks.
    ///
    /// Returns the `EventId`, which also serves as the `timer_id`
    /// delivered in [`ProtocolEvent::Timer`].
    pub fn schedule_protocol_timer(
        &mut self,
        node: NodeId,
        protocol: ProtocolId,
        delay: u64,
    ) -> EventId {
        let timer_id = self.scheduler.next_event_id().raw();
        self.schedule_after(
            delay,
            EventType::ProtocolTimer {
                node,
                protocol,
                timer_id,
            },
        )
    }

    /// Schedule an administrative link-state change after `delay` ticks.
    pub fn set_link_at(&mut self, link: LinkId, up: bool, delay: u64) -> EventId {
        self.schedule_after(delay, EventType::LinkSet { link, up })
    }
}
