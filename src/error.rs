//! Structured error types for Polaris.
//!
//! All fallible public APIs return `Result<T, PolarisError>`. This lets
//! callers distinguish operational errors (e.g. a host missing from the
//! topology) from programming errors (e.g. scheduling in the past),
//! which panic instead.

use thiserror::Error;

use crate::net::NodeId;
use crate::packet::ProtocolId;

/// The top-level error type for the Polaris simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolarisError {
    /// A topology description line could not be parsed.
    #[error("topology line {line}: {reason}")]
    InvalidTopology { line: usize, reason: String },

    /// A hostname was referenced but is not part of the topology.
    #[error("host {0:?} is not part of the topology")]
    UnknownHost(String),

    /// Two hosts were linked more than once.
    #[error("hosts {0:?} and {1:?} are already linked")]
    DuplicateLink(String, String),

    /// A node ID was referenced but is not registered in the topology.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// A protocol was registered twice on the same node.
    #[error("protocol {protocol} is already registered on node {node}")]
    ProtocolAlreadyRegistered { node: NodeId, protocol: ProtocolId },

    /// An advertisement payload failed to decode.
    #[error("malformed advertisement payload: {0}")]
    MalformedAdvertisement(String),
}

/// Convenience alias for `Result<T, PolarisError>`.
pub type PolarisResult<T> = Result<T, PolarisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_host() {
        let e = PolarisError::UnknownHost("n9".into());
        assert_eq!(e.to_string(), "host \"n9\" is not part of the topology");
    }

    #[test]
    fn test_error_display_invalid_topology() {
        let e = PolarisError::InvalidTopology {
            line: 3,
            reason: "expected two hostnames".into(),
        };
        assert!(e.to_string().contains("line 3"));
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(PolarisError::NodeNotFound(NodeId::new(5)));
        assert!(!e.to_string().is_empty());
    }
}
