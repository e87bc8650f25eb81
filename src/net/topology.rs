//! The topology aggregate and its textual description format.
//!
//! A topology is built either programmatically (`add_host` /
//! `connect`) or from a text description with one connection per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! n1 n2        # link with the default delay of 1 tick
//! n2 n3 5      # link with a 5-tick delay per direction
//! ```
//!
//! Each line creates a pair of directed [`Link`]s, one per direction.
//! Hosts are created on first mention and assigned one [`Address`]
//! each, in order of appearance.

use std::collections::BTreeMap;

use crate::error::{PolarisError, PolarisResult};
use crate::packet::Address;

use super::link::{Link, LinkId};
use super::node::{Node, NodeId};

/// Default per-direction propagation delay in ticks.
pub const DEFAULT_LINK_DELAY: u64 = 1;

/// Nodes, links, and the hostname index that ties them together.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: BTreeMap<String, NodeId>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Topology::default()
    }

    /// Parse a topology from its textual description.
    pub fn from_text(text: &str) -> PolarisResult<Self> {
        let mut topology = Topology::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = idx + 1;
            // Strip trailing comments, then surrounding whitespace.
            let content = raw_line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let fields: Vec<&str> = content.split_whitespace().collect();
            let (a, b, delay) = match fields.as_slice() {
                [a, b] => (*a, *b, DEFAULT_LINK_DELAY),
                [a, b, delay] => {
                    let delay = delay.parse::<u64>().map_err(|_| {
                        PolarisError::InvalidTopology {
                            line,
                            reason: format!("invalid delay {:?}", delay),
                        }
                    })?;
                    (*a, *b, delay)
                }
                _ => {
                    return Err(PolarisError::InvalidTopology {
                        line,
                        reason: "expected '<host> <host> [delay]'".into(),
                    })
                }
            };

            if a == b {
                return Err(PolarisError::InvalidTopology {
                    line,
                    reason: format!("host {:?} linked to itself", a),
                });
            }

            topology.connect(a, b, delay)?;
        }

        Ok(topology)
    }

    // ── Construction ──────────────────────────────────────────────

    /// Add a host, or return the existing ID if the name is known.
    ///
    /// New hosts are assigned the next free address (addresses are
    /// 1-based; 0 is never used).
    pub fn add_host(&mut self, hostname: &str) -> NodeId {
        if let Some(&id) = self.index.get(hostname) {
            return id;
        }
        let id = NodeId::new(self.nodes.len() as u64);
        let address = Address::new(self.nodes.len() as u64 + 1);
        self.nodes.push(Node::new(id, hostname, address));
        self.index.insert(hostname.to_string(), id);
        id
    }

    /// Connect two hosts with a pair of directed links sharing one
    /// per-direction delay. Hosts are created if not yet known.
    ///
    /// Returns the `(a -> b, b -> a)` link handles.
    pub fn connect(
        &mut self,
        a: &str,
        b: &str,
        delay: u64,
    ) -> PolarisResult<(LinkId, LinkId)> {
        let a_id = self.add_host(a);
        let b_id = self.add_host(b);

        if self.nodes[a_id.index()].link_to(b).is_some() {
            return Err(PolarisError::DuplicateLink(a.to_string(), b.to_string()));
        }

        let forward = LinkId::new(self.links.len() as u64);
        self.links.push(Link::new(a_id, b_id, delay));
        let backward = LinkId::new(self.links.len() as u64);
        self.links.push(Link::new(b_id, a_id, delay));

        self.nodes[a_id.index()].attach_link(b, forward);
        self.nodes[b_id.index()].attach_link(a, backward);

        Ok((forward, backward))
    }

    // ── Lookup ────────────────────────────────────────────────────

    /// Resolve a hostname to its node ID.
    pub fn resolve(&self, hostname: &str) -> Option<NodeId> {
        self.index.get(hostname).copied()
    }

    /// Access a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Mutable access to a node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Access a node by hostname.
    pub fn node_by_hostname(&self, hostname: &str) -> Option<&Node> {
        self.node(self.resolve(hostname)?)
    }

    /// Access a link by ID.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index())
    }

    /// Mutable access to a link by ID.
    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.index())
    }

    /// The directed link from `a` to `b`, if the hosts are neighbors.
    pub fn link_between(&self, a: &str, b: &str) -> Option<LinkId> {
        self.node_by_hostname(a)?.link_to(b)
    }

    /// Both directions between `a` and `b` as `(a -> b, b -> a)`.
    pub fn pair_between(&self, a: &str, b: &str) -> Option<(LinkId, LinkId)> {
        Some((self.link_between(a, b)?, self.link_between(b, a)?))
    }

    /// All hostnames in sorted order.
    pub fn hostnames(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    /// Number of hosts.
    pub fn host_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
