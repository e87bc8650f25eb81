//! The per-node distance-vector protocol instance.

use tracing::debug;

use crate::net::{Node, ProtocolEvent};
use crate::packet::Packet;
use crate::simulation::SimulationContext;

use super::advert::{Advertisement, DV_ROUTING};
use super::liveness::NeighborLiveness;
use super::table::RoutingTable;

// ── Configuration ─────────────────────────────────────────────────────

/// Default ticks between periodic advertisements.
pub const DEFAULT_BROADCAST_INTERVAL: u64 = 30;
/// Default number of re-armed broadcasts after the initial one.
pub const DEFAULT_BROADCAST_LIMIT: u64 = 100;
/// Default neighbor silence threshold in ticks.
pub const DEFAULT_NEIGHBOR_TIMEOUT: u64 = 90;

/// Tunables for one [`DistanceVectorApp`].
#[derive(Debug, Clone)]
pub struct DvConfig {
    /// Ticks between periodic advertisements.
    pub broadcast_interval: u64,
    /// How many times the broadcast timer is re-armed. Once the
    /// counter reaches this limit the node stops originating
    /// advertisements for good.
    pub broadcast_limit: u64,
    /// Silence threshold at or beyond which a neighbor's cached
    /// vector is evicted.
    pub neighbor_timeout: u64,
}

impl Default for DvConfig {
    fn default() -> Self {
        DvConfig {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            broadcast_limit: DEFAULT_BROADCAST_LIMIT,
            neighbor_timeout: DEFAULT_NEIGHBOR_TIMEOUT,
        }
    }
}

/// Harness hook invoked after every broadcast with the current counter
/// value. Lets a test scenario toggle links at chosen counts without
/// wiring that logic into the protocol itself.
pub type BroadcastHook = Box<dyn FnMut(u64, &mut SimulationContext)>;

// ── DistanceVectorApp ─────────────────────────────────────────────────

/// Distance-vector routing on one node.
///
/// Owns the node's [`RoutingTable`] and [`NeighborLiveness`] state;
/// neither is ever shared across nodes. The app periodically
/// broadcasts its distances to the immediate neighbors, consumes their
/// advertisements, and keeps the owning node's forwarding table in
/// sync with the recomputed routes.
///
/// Lifecycle: the app starts with an empty table (not even a self
/// entry; that is created lazily on the first advertisement receipt),
/// broadcasts until its counter reaches the configured limit, and
/// afterwards keeps receiving and reacting to other nodes'
/// advertisements until the simulation drains.
pub struct DistanceVectorApp {
    table: RoutingTable,
    liveness: NeighborLiveness,
    config: DvConfig,
    broadcast_count: u64,
    hook: Option<BroadcastHook>,
}

impl DistanceVectorApp {
    /// Create an app with the given configuration.
    pub fn new(config: DvConfig) -> Self {
        DistanceVectorApp {
            liveness: NeighborLiveness::new(config.neighbor_timeout),
            table: RoutingTable::new(),
            config,
            broadcast_count: 0,
            hook: None,
        }
    }

    /// Attach a per-broadcast harness hook.
    pub fn with_broadcast_hook(mut self, hook: BroadcastHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// The routing table, for inspection.
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// The liveness tracker, for inspection.
    pub fn liveness(&self) -> &NeighborLiveness {
        &self.liveness
    }

    /// How many times the broadcast timer has been re-armed.
    pub fn broadcast_count(&self) -> u64 {
        self.broadcast_count
    }

    /// Build and transmit one advertisement, then re-arm the timer
    /// unless the counter has reached its limit.
    fn on_broadcast_due(&mut self, ctx: &mut SimulationContext, node: &mut Node) {
        let advert = Advertisement::new(node.hostname(), self.table.export_distances());
        ctx.transmit(node.id(), advert.to_packet(self.broadcast_count));

        if self.broadcast_count < self.config.broadcast_limit {
            ctx.schedule_protocol_timer(node.id(), DV_ROUTING, self.config.broadcast_interval);
            self.broadcast_count += 1;
        } else {
            debug!(host = node.hostname(), "broadcast limit reached, no further advertisements");
        }

        if let Some(hook) = self.hook.as_mut() {
            hook(self.broadcast_count, ctx);
        }
    }

    /// Consume one neighbor advertisement.
    ///
    /// Updates last-contact for the sender, evicts every neighbor that
    /// has been silent for the configured threshold, caches the new
    /// vector, recomputes the routes, and (only when something
    /// actually changed) rewrites the owning node's forwarding table
    /// from scratch with the fresh forwarding projection.
    ///
    /// # Panics
    /// Panics if the payload does not decode as an advertisement. A
    /// packet tagged `dv-routing` with an undecodable body is a
    /// transport contract fault, not a condition to recover from.
    fn on_advertisement(&mut self, ctx: &mut SimulationContext, node: &mut Node, packet: &Packet) {
        let advert = Advertisement::decode(&packet.payload)
            .expect("transport delivered a malformed distance-vector advertisement");
        let now = ctx.now();

        self.liveness.record(&advert.sender, now);
        let stale = self.liveness.sweep(now);
        for hostname in &stale {
            self.table.remove_neighbor(hostname);
            debug!(
                host = node.hostname(),
                neighbor = %hostname,
                "neighbor silent too long, evicting cached vector"
            );
        }
        let evicted = !stale.is_empty();

        let self_added = self.table.record_self(node.address());
        self.table.upsert_neighbor(advert.sender.clone(), advert.vector);
        let changed = self.table.recompute(|hostname| node.link_to(hostname));

        if changed || self_added || evicted {
            // Full replace: the forwarding table is a disposable
            // projection of the routing table, so it is rebuilt rather
            // than diffed.
            node.clear_forwarding();
            for (destination, link) in self.table.forwarding_entries() {
                node.add_forwarding_entry(destination, link);
            }
            debug!(
                time = %now,
                host = node.hostname(),
                distances = ?self.table.export_distances(),
                "routing table updated"
            );
        }
    }
}

impl crate::net::Protocol for DistanceVectorApp {
    fn on_event(&mut self, ctx: &mut SimulationContext, node: &mut Node, event: ProtocolEvent) {
        match event {
            ProtocolEvent::Timer { .. } => self.on_broadcast_due(ctx, node),
            ProtocolEvent::Packet(packet) => self.on_advertisement(ctx, node, &packet),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
