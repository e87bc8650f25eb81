//! Nodes: named hosts with attached links and a forwarding table.

use std::collections::BTreeMap;

use crate::packet::Address;

use super::link::LinkId;

/// A unique identifier for a node.
///
/// `NodeId` is a newtype around `u64` rather than a bare integer so it
/// cannot be confused with other u64 values (event IDs, addresses,
/// link IDs) at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node ID from a raw integer.
    #[inline]
    pub const fn new(id: u64) -> Self {
        NodeId(id)
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

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A host in the topology.
///
/// A node knows its own hostname and address, which neighbor sits at
/// the far end of each of its outgoing links, and its forwarding table
/// (the derived address-to-link projection that packet transport
/// consults). Protocol instances never own a `Node`; the runtime lends
/// each handler a mutable reference for the duration of one event.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    hostname: String,
    address: Address,
    /// Outgoing link per neighbor hostname. Sorted, so broadcast
    /// fan-out order is deterministic.
    links: BTreeMap<String, LinkId>,
    /// Derived forwarding table: destination address to outgoing link.
    forwarding: BTreeMap<Address, LinkId>,
}

impl Node {
    /// Create an unattached node.
    pub fn new(id: NodeId, hostname: impl Into<String>, address: Address) -> Self {
        Node {
            id,
            hostname: hostname.into(),
            address,
            links: BTreeMap::new(),
            forwarding: BTreeMap::new(),
        }
    }

    /// This node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// This node's hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// This node's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Record that `link` leads to the neighbor named `peer`.
    pub(crate) fn attach_link(&mut self, peer: impl Into<String>, link: LinkId) {
        self.links.insert(peer.into(), link);
    }

    /// The outgoing link toward a directly connected neighbor, if any.
    pub fn link_to(&self, peer: &str) -> Option<LinkId> {
        self.links.get(peer).copied()
    }

    /// Outgoing links in deterministic (hostname-sorted) order.
    pub fn neighbor_links(&self) -> impl Iterator<Item = (&str, LinkId)> {
        self.links.iter().map(|(peer, link)| (peer.as_str(), *link))
    }

    /// Number of directly connected neighbors.
    pub fn neighbor_count(&self) -> usize {
        self.links.len()
    }

    // ── Forwarding table ──────────────────────────────────────────

    /// Remove every forwarding entry.
    pub fn clear_forwarding(&mut self) {
        self.forwarding.clear();
    }

    /// Insert a forwarding entry for `dst` via `link`.
    pub fn add_forwarding_entry(&mut self, dst: Address, link: LinkId) {
        self.forwarding.insert(dst, link);
    }

    /// The outgoing link for a destination, or `None` for "no route".
    pub fn forward_lookup(&self, dst: Address) -> Option<LinkId> {
        self.forwarding.get(&dst).copied()
    }

    /// Read-only view of the forwarding table.
    pub fn forwarding_table(&self) -> &BTreeMap<Address, LinkId> {
        &self.forwarding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        Node::new(NodeId::new(0), "n1", Address::new(1))
    }

    #[test]
    fn test_identity() {
        let n = node();
        assert_eq!(n.hostname(), "n1");
        assert_eq!(n.address(), Address::new(1));
        assert_eq!(n.id(), NodeId::new(0));
    }

    #[test]
    fn test_link_attachment() {
        let mut n = node();
        n.attach_link("n2", LinkId::new(0));
        n.attach_link("n3", LinkId::new(2));

        assert_eq!(n.link_to("n2"), Some(LinkId::new(0)));
        assert_eq!(n.link_to("n9"), None);
        assert_eq!(n.neighbor_count(), 2);

        // Sorted by hostname.
        let peers: Vec<&str> = n.neighbor_links().map(|(p, _)| p).collect();
        assert_eq!(peers, vec!["n2", "n3"]);
    }

    #[test]
    fn test_forwarding_table_ops() {
        let mut n = node();
        n.add_forwarding_entry(Address::new(2), LinkId::new(0));
        n.add_forwarding_entry(Address::new(3), LinkId::new(0));

        assert_eq!(n.forward_lookup(Address::new(2)), Some(LinkId::new(0)));
        assert_eq!(n.forward_lookup(Address::new(9)), None);
        assert_eq!(n.forwarding_table().len(), 2);

        n.clear_forwarding();
        assert!(n.forwarding_table().is_empty());
        assert_eq!(n.forward_lookup(Address::new(2)), None);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(4)), "N4");
    }
}
