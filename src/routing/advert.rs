//! Distance-vector advertisements and their wire encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PolarisError, PolarisResult};
use crate::packet::{Address, Packet, ProtocolId};

/// Protocol tag under which distance-vector handlers register.
pub const DV_ROUTING: ProtocolId = ProtocolId::new("dv-routing");

/// One neighbor's view of the network: the sender's hostname and its
/// advertised distance to every destination it knows.
///
/// A receiving node caches exactly one advertisement per sender
/// hostname; a newer advertisement fully replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Hostname of the advertising node.
    pub sender: String,
    /// Advertised cost per destination address.
    pub vector: BTreeMap<Address, u32>,
}

/// JSON-serializable form. The vector travels as sorted
/// `(address, cost)` pairs so the encoded bytes are deterministic.
#[derive(Serialize, Deserialize)]
struct WireAdvertisement {
    sender: String,
    vector: Vec<(u64, u32)>,
}

impl Advertisement {
    /// Create an advertisement.
    pub fn new(sender: impl Into<String>, vector: BTreeMap<Address, u32>) -> Self {
        Advertisement {
            sender: sender.into(),
            vector,
        }
    }

    /// Encode into payload bytes.
    pub fn encode(&self) -> Vec<u8> {
        let wire = WireAdvertisement {
            sender: self.sender.clone(),
            vector: self
                .vector
                .iter()
                .map(|(addr, cost)| (addr.raw(), *cost))
                .collect(),
        };
        serde_json::to_vec(&wire).expect("advertisement serialization cannot fail")
    }

    /// Decode from payload bytes.
    pub fn decode(bytes: &[u8]) -> PolarisResult<Self> {
        let wire: WireAdvertisement = serde_json::from_slice(bytes)
            .map_err(|e| PolarisError::MalformedAdvertisement(e.to_string()))?;
        Ok(Advertisement {
            sender: wire.sender,
            vector: wire
                .vector
                .into_iter()
                .map(|(raw, cost)| (Address::new(raw), cost))
                .collect(),
        })
    }

    /// Wrap into a local-broadcast packet (time-to-live of one, never
    /// relayed past the immediate neighbors).
    pub fn to_packet(&self, ident: u64) -> Packet {
        Packet::broadcast(DV_ROUTING, ident, self.encode())
    }
}
