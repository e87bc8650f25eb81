//! The per-node routing table: best-known routes plus the raw
//! per-neighbor advertisement cache they are derived from.

use std::collections::BTreeMap;

use crate::net::LinkId;
use crate::packet::Address;

/// Best-known route to one destination.
///
/// The entry for the node's own address has cost 0 and no next hop;
/// every other entry carries the outgoing link it was learned through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Hop count to the destination.
    pub cost: u32,
    /// Outgoing link, `None` only for the self entry.
    pub next_hop: Option<LinkId>,
}

/// Routes and the neighbor vectors they are computed from.
///
/// `entries` is a pure function of `neighbor_vectors` plus the self
/// entry: [`recompute`](Self::recompute) always rebuilds it from
/// scratch, so the derived routes can never drift from their inputs.
/// The neighbor cache is keyed by hostname in a `BTreeMap`, which
/// fixes the relaxation order (lexicographic by hostname) and with it
/// the winner of equal-cost ties.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: BTreeMap<Address, RouteEntry>,
    neighbor_vectors: BTreeMap<String, BTreeMap<Address, u32>>,
}

impl RoutingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        RoutingTable::default()
    }

    /// Ensure the self entry `{cost: 0, next_hop: None}` exists for
    /// `address`. Returns `true` if it was newly inserted.
    pub fn record_self(&mut self, address: Address) -> bool {
        if self.entries.contains_key(&address) {
            return false;
        }
        self.entries.insert(
            address,
            RouteEntry {
                cost: 0,
                next_hop: None,
            },
        );
        true
    }

    /// Replace the cached vector for `hostname` wholesale. There is no
    /// incremental merge; the previous vector, if any, is discarded.
    pub fn upsert_neighbor(&mut self, hostname: impl Into<String>, vector: BTreeMap<Address, u32>) {
        self.neighbor_vectors.insert(hostname.into(), vector);
    }

    /// Drop the cached vector for `hostname`. Returns `false` if no
    /// vector was cached (the call is then a no-op).
    pub fn remove_neighbor(&mut self, hostname: &str) -> bool {
        self.neighbor_vectors.remove(hostname).is_some()
    }

    /// Hostnames with a cached vector, in relaxation order.
    pub fn cached_neighbors(&self) -> impl Iterator<Item = &str> {
        self.neighbor_vectors.keys().map(String::as_str)
    }

    /// Rebuild the routes from the cached neighbor vectors.
    ///
    /// Every derived entry is discarded (only the self entry, if
    /// present, survives), then each neighbor's vector is relaxed one
    /// hop: a destination advertised at cost `c` becomes a candidate at
    /// `c + 1` via the link to that neighbor, and wins if it is
    /// strictly cheaper than the best so far. On equal cost the entry
    /// relaxed first (lexicographically smallest neighbor hostname)
    /// is kept.
    ///
    /// `resolve_link` maps a cached neighbor hostname to the outgoing
    /// link; a neighbor it cannot resolve contributes nothing.
    ///
    /// Returns `true` if any entry was added, removed, or changed.
    pub fn recompute<F>(&mut self, mut resolve_link: F) -> bool
    where
        F: FnMut(&str) -> Option<LinkId>,
    {
        let previous = std::mem::take(&mut self.entries);

        // Keep only the self entry, then rebuild everything else.
        let mut rebuilt: BTreeMap<Address, RouteEntry> = previous
            .iter()
            .filter(|(_, entry)| entry.next_hop.is_none())
            .map(|(addr, entry)| (*addr, entry.clone()))
            .collect();

        for (hostname, vector) in &self.neighbor_vectors {
            let Some(link) = resolve_link(hostname) else {
                continue;
            };
            for (&destination, &cost) in vector {
                let candidate = cost.saturating_add(1);
                let improves = match rebuilt.get(&destination) {
                    None => true,
                    Some(entry) => candidate < entry.cost,
                };
                if improves {
                    rebuilt.insert(
                        destination,
                        RouteEntry {
                            cost: candidate,
                            next_hop: Some(link),
                        },
                    );
                }
            }
        }

        let changed = rebuilt != previous;
        self.entries = rebuilt;
        changed
    }

    /// Snapshot of the distances, used to build outgoing
    /// advertisements. A fresh map, never an alias of the live table.
    ///
    /// No hop-count ceiling and no split-horizon filtering: a route is
    /// advertised back toward the neighbor it was learned from.
    pub fn export_distances(&self) -> BTreeMap<Address, u32> {
        self.entries
            .iter()
            .map(|(addr, entry)| (*addr, entry.cost))
            .collect()
    }

    /// The forwarding projection: every destination with a next hop
    /// (which excludes the self entry).
    pub fn forwarding_entries(&self) -> BTreeMap<Address, LinkId> {
        self.entries
            .iter()
            .filter_map(|(addr, entry)| entry.next_hop.map(|link| (*addr, link)))
            .collect()
    }

    /// The route for one destination, if known.
    pub fn entry(&self, destination: Address) -> Option<&RouteEntry> {
        self.entries.get(&destination)
    }

    /// Number of known destinations (including self, once recorded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no destination is known yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
