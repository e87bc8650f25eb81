//! `NetRuntime`: owns the topology and every protocol instance, and
//! realizes packet transport on top of the scheduler.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::{PolarisError, PolarisResult};
use crate::event::{Event, EventType};
use crate::packet::{Address, Packet, ProtocolId};
use crate::simulation::{EventHandler, SimulationContext};
use crate::time::VirtualTime;

use super::link::LinkId;
use super::node::NodeId;
use super::topology::Topology;
use super::traits::{Protocol, ProtocolEvent};

// ── Transport log ─────────────────────────────────────────────────────

/// What became of one packet at one transport decision point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Scheduled across a link; will arrive after `latency` ticks.
    Sent { latency: u64 },
    /// Handed to a protocol instance on the destination node.
    Delivered,
    /// Transit hop: forwarded onward via the forwarding table.
    Relayed,
    /// Dropped because the chosen link is administratively down.
    DroppedLinkDown,
    /// Dropped because the sender has no forwarding entry for the
    /// destination. This is "no route", not an error.
    DroppedNoRoute,
    /// Dropped because the time-to-live would reach zero.
    DroppedTtl,
    /// Arrived for a protocol tag nobody registered on the node.
    DroppedNoHandler,
}

impl Disposition {
    /// Whether this disposition is any kind of drop.
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            Disposition::DroppedLinkDown
                | Disposition::DroppedNoRoute
                | Disposition::DroppedTtl
                | Disposition::DroppedNoHandler
        )
    }
}

/// A record of one transport decision, appended in dispatch order.
#[derive(Debug, Clone)]
pub struct TransportLogEntry {
    /// Virtual time of the decision.
    pub time: VirtualTime,
    /// The node where the decision was made.
    pub node: NodeId,
    /// The link involved, when one was resolved.
    pub link: Option<LinkId>,
    /// The packet's destination address.
    pub dst: Address,
    /// The packet's protocol tag.
    pub protocol: ProtocolId,
    /// The outcome.
    pub disposition: Disposition,
}

// ── NetRuntime ────────────────────────────────────────────────────────

/// Dispatches scheduler events to the topology and its protocols.
///
/// Implements [`EventHandler`] so it can be passed directly to
/// [`Simulation::run`](crate::simulation::Simulation::run). Transport
/// semantics live here:
///
/// - A broadcast (`dst = `[`Address::BROADCAST`]) fans out over every
///   up link of the sending node, one copy per link, delayed by that
///   link's propagation delay. Broadcasts are never relayed further.
/// - A unicast resolves the sender's forwarding table; a missing entry
///   is a silent drop.
/// - A packet arriving at a node that is not its destination is
///   relayed with its time-to-live decremented, and dropped once the
///   time-to-live would reach zero.
/// - A down link drops silently at send time; senders never learn of
///   the loss.
pub struct NetRuntime {
    topology: Topology,
    protocols: BTreeMap<(NodeId, ProtocolId), Box<dyn Protocol>>,
    /// Append-only log of transport decisions.
    log: Vec<TransportLogEntry>,
}

impl std::fmt::Debug for NetRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetRuntime")
            .field("topology", &self.topology)
            .field("protocols", &self.protocols.keys().collect::<Vec<_>>())
            .field("log", &self.log)
            .finish()
    }
}

impl NetRuntime {
    /// Create a runtime over a topology.
    pub fn new(topology: Topology) -> Self {
        NetRuntime {
            topology,
            protocols: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    /// The owned topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Mutable access to the topology (e.g., direct link toggles in
    /// tests; scenario drivers should prefer scheduled `LinkSet`
    /// events).
    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    /// Register a protocol instance on a node.
    pub fn register_protocol(
        &mut self,
        node: NodeId,
        protocol: ProtocolId,
        handler: Box<dyn Protocol>,
    ) -> PolarisResult<()> {
        if self.topology.node(node).is_none() {
            return Err(PolarisError::NodeNotFound(node));
        }
        match self.protocols.entry((node, protocol)) {
            Entry::Occupied(_) => Err(PolarisError::ProtocolAlreadyRegistered { node, protocol }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    /// Downcast a protocol instance for inspection.
    ///
    /// Returns `None` if nothing is registered under the key or the
    /// concrete type differs.
    pub fn protocol<T: Protocol + 'static>(
        &self,
        node: NodeId,
        protocol: ProtocolId,
    ) -> Option<&T> {
        self.protocols
            .get(&(node, protocol))?
            .as_any()
            .downcast_ref::<T>()
    }

    /// Mutable variant of [`protocol`](Self::protocol).
    pub fn protocol_mut<T: Protocol + 'static>(
        &mut self,
        node: NodeId,
        protocol: ProtocolId,
    ) -> Option<&mut T> {
        self.protocols
            .get_mut(&(node, protocol))?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Convenience: look a protocol instance up by hostname.
    pub fn protocol_at<T: Protocol + 'static>(
        &self,
        hostname: &str,
        protocol: ProtocolId,
    ) -> Option<&T> {
        self.protocol(self.topology.resolve(hostname)?, protocol)
    }

    // ── Transport log accessors ───────────────────────────────────

    /// The transport decision log.
    pub fn log(&self) -> &[TransportLogEntry] {
        &self.log
    }

    /// Count of packets handed to protocol instances.
    pub fn delivered_count(&self) -> usize {
        self.log
            .iter()
            .filter(|e| e.disposition == Disposition::Delivered)
            .count()
    }

    /// Count of packets dropped for any reason.
    pub fn dropped_count(&self) -> usize {
        self.log.iter().filter(|e| e.disposition.is_drop()).count()
    }

    // ── Event handling ────────────────────────────────────────────

    fn handle_send(&mut self, ctx: &mut SimulationContext, from: NodeId, packet: &Packet) {
        let now = ctx.now();
        let Some(node) = self.topology.node(from) else {
            return;
        };

        if packet.dst.is_broadcast() {
            for (_peer, link_id) in node.neighbor_links() {
                let Some(link) = self.topology.link(link_id) else {
                    continue;
                };
                let disposition = if link.is_up() {
                    ctx.schedule_after(
                        link.delay(),
                        EventType::PacketDelivery {
                            link: link_id,
                            packet: packet.clone(),
                        },
                    );
                    Disposition::Sent {
                        latency: link.delay(),
                    }
                } else {
                    trace!(%from, link = %link_id, "broadcast copy dropped, link down");
                    Disposition::DroppedLinkDown
                };
                self.log.push(TransportLogEntry {
                    time: now,
                    node: from,
                    link: Some(link_id),
                    dst: packet.dst,
                    protocol: packet.protocol,
                    disposition,
                });
            }
            return;
        }

        // Unicast: resolve through the sender's forwarding table.
        let (link, disposition) = match node.forward_lookup(packet.dst) {
            None => {
                trace!(%from, dst = %packet.dst, "no forwarding entry, dropping");
                (None, Disposition::DroppedNoRoute)
            }
            Some(link_id) => match self.topology.link(link_id) {
                Some(link) if link.is_up() => {
                    ctx.schedule_after(
                        link.delay(),
                        EventType::PacketDelivery {
                            link: link_id,
                            packet: packet.clone(),
                        },
                    );
                    (
                        Some(link_id),
                        Disposition::Sent {
                            latency: link.delay(),
                        },
                    )
                }
                _ => {
                    trace!(%from, link = %link_id, "unicast dropped, link down");
                    (Some(link_id), Disposition::DroppedLinkDown)
                }
            },
        };
        self.log.push(TransportLogEntry {
            time: now,
            node: from,
            link,
            dst: packet.dst,
            protocol: packet.protocol,
            disposition,
        });
    }

    fn handle_delivery(&mut self, ctx: &mut SimulationContext, link_id: LinkId, packet: &Packet) {
        let now = ctx.now();
        let to = match self.topology.link(link_id) {
            Some(link) => link.dst(),
            None => return,
        };
        let Some(node) = self.topology.node_mut(to) else {
            return;
        };

        if packet.dst.is_broadcast() || packet.dst == node.address() {
            // Local delivery: dispatch by protocol tag.
            let disposition = match self.protocols.get_mut(&(to, packet.protocol)) {
                Some(handler) => {
                    handler.on_event(ctx, node, ProtocolEvent::Packet(packet.clone()));
                    Disposition::Delivered
                }
                None => {
                    trace!(node = %to, protocol = %packet.protocol, "no handler registered");
                    Disposition::DroppedNoHandler
                }
            };
            self.log.push(TransportLogEntry {
                time: now,
                node: to,
                link: Some(link_id),
                dst: packet.dst,
                protocol: packet.protocol,
                disposition,
            });
            return;
        }

        // Transit: relay with a decremented hop budget.
        let disposition = if packet.ttl <= 1 {
            trace!(node = %to, dst = %packet.dst, "time-to-live exhausted");
            Disposition::DroppedTtl
        } else {
            let mut onward = packet.clone();
            onward.ttl -= 1;
            ctx.schedule_after(
                0,
                EventType::PacketSend {
                    from: to,
                    packet: onward,
                },
            );
            Disposition::Relayed
        };
        self.log.push(TransportLogEntry {
            time: now,
            node: to,
            link: Some(link_id),
            dst: packet.dst,
            protocol: packet.protocol,
            disposition,
        });
    }
}

impl EventHandler for NetRuntime {
    fn handle(&mut self, ctx: &mut SimulationContext, event: &Event) {
        match &event.payload {
            EventType::PacketSend { from, packet } => {
                self.handle_send(ctx, *from, packet);
            }

            EventType::PacketDelivery { link, packet } => {
                self.handle_delivery(ctx, *link, packet);
            }

            EventType::ProtocolTimer {
                node,
                protocol,
                timer_id,
            } => {
                let Some(n) = self.topology.node_mut(*node) else {
                    return;
                };
                if let Some(handler) = self.protocols.get_mut(&(*node, *protocol)) {
                    handler.on_event(ctx, n, ProtocolEvent::Timer { timer_id: *timer_id });
                }
            }

            EventType::LinkSet { link, up } => {
                if let Some(l) = self.topology.link_mut(*link) {
                    l.set_state(*up);
                    debug!(link = %link, up = *up, "administrative link state change");
                }
            }

            EventType::Noop => {}
        }
    }
}
