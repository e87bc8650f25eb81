//! Packet envelope and the identifiers it carries.
//!
//! A [`Packet`] is the unit of transport between nodes. The envelope
//! holds a destination [`Address`], a time-to-live, a [`ProtocolId`]
//! tag used to pick the receiving protocol handler, and an opaque
//! payload. The transport layer never looks inside the payload.

use serde::{Deserialize, Serialize};

// ── Address ───────────────────────────────────────────────────────────

/// A destination address within the topology.
///
/// Every node is assigned exactly one address when the topology is
/// built. Addresses are opaque to the transport: routing tables map
/// them to link handles, nothing more. `Address` is a newtype around
/// `u64` so it cannot be confused with node or event identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(u64);

impl Address {
    /// The local-broadcast sentinel: "all directly connected neighbors".
    pub const BROADCAST: Address = Address(u64::MAX);

    /// Create an address from a raw value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Address(raw)
    }

    /// Return the raw value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this is the local-broadcast sentinel.
    #[inline]
    pub fn is_broadcast(self) -> bool {
        self == Address::BROADCAST
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_broadcast() {
            write!(f, "A*")
        } else {
            write!(f, "A{}", self.0)
        }
    }
}

// ── Protocol identifier ───────────────────────────────────────────────

/// Tag naming the protocol a packet belongs to.
///
/// A node may have several protocol handlers registered; the runtime
/// dispatches an arriving packet to the handler registered under the
/// packet's tag. Protocol names are compile-time constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolId(&'static str);

impl ProtocolId {
    /// Create a protocol identifier from a static name.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        ProtocolId(name)
    }

    /// Return the protocol name.
    #[inline]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

// ── Packet ────────────────────────────────────────────────────────────

/// A message in flight between nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Destination address, or [`Address::BROADCAST`].
    pub dst: Address,
    /// Remaining hops. Decremented at each transit node; a packet is
    /// dropped rather than relayed once this would reach zero.
    pub ttl: u8,
    /// Handler tag for dispatch on the receiving node.
    pub protocol: ProtocolId,
    /// Sender-chosen packet identifier, carried opaquely.
    pub ident: u64,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a local broadcast: delivered to every directly connected
    /// neighbor and never relayed further (time-to-live of one).
    pub fn broadcast(protocol: ProtocolId, ident: u64, payload: Vec<u8>) -> Self {
        Packet {
            dst: Address::BROADCAST,
            ttl: 1,
            protocol,
            ident,
            payload,
        }
    }

    /// Build a unicast packet toward `dst` with an explicit hop budget.
    pub fn unicast(
        dst: Address,
        ttl: u8,
        protocol: ProtocolId,
        ident: u64,
        payload: Vec<u8>,
    ) -> Self {
        Packet {
            dst,
            ttl,
            protocol,
            ident,
            payload,
        }
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}#{} -> {} (ttl {}, {} bytes)",
            self.protocol,
            self.ident,
            self.dst,
            self.ttl,
            self.payload.len()
        )
    }
}
