//! # Polaris — Deterministic Distance-Vector Routing Simulator
//!
//! A discrete-event simulation of a classic hop-count distance-vector
//! routing protocol. No async, no threads, no wall-clock time; just
//! pure state machines driven by a virtual clock, so every run of a
//! scenario is exactly reproducible.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │        NetRuntime          │ ← topology + protocol dispatch
//! │  ┌─────────────────────┐  │
//! │  │  DistanceVectorApp   │  │ ← per-node protocol instance
//! │  │  ┌───────────────┐  │  │
//! │  │  │ RoutingTable  │  │  │ ← relaxation over neighbor vectors
//! │  │  ├───────────────┤  │  │
//! │  │  │   Liveness    │  │  │ ← soft-state neighbor timeout
//! │  │  └───────────────┘  │  │
//! │  └─────────────────────┘  │
//! │  ┌─────────────────────┐  │
//! │  │     Simulation       │  │ ← execution loop
//! │  │  ┌───────────────┐  │  │
//! │  │  │   Scheduler   │  │  │ ← deterministic min-heap
//! │  │  ├───────────────┤  │  │
//! │  │  │     VTime     │  │  │ ← logical clock
//! │  │  └───────────────┘  │  │
//! │  └─────────────────────┘  │
//! └───────────────────────────┘
//! ```
//!
//! The protocol itself is deliberately classic and deliberately
//! limited: hop count is the only metric, there is no split horizon
//! and no poison reverse, and failed neighbors are detected only by
//! the absence of their periodic advertisements.

pub mod dsl;
pub mod error;
pub mod event;
pub mod faults;
pub mod net;
pub mod packet;
pub mod routing;
pub mod scheduler;
pub mod simulation;
pub mod time;

// Re-exports for convenience.
pub use dsl::SimBuilder;
pub use error::{PolarisError, PolarisResult};
pub use event::{Event, EventId, EventIdGen, EventType};
pub use faults::{FaultEvent, FaultPlan};
pub use net::{Link, LinkId, NetRuntime, Node, NodeId, Protocol, ProtocolEvent, Topology};
pub use packet::{Address, Packet, ProtocolId};
pub use routing::{
    Advertisement, DistanceVectorApp, DvConfig, NeighborLiveness, RouteEntry, RoutingTable,
    DV_ROUTING,
};
pub use scheduler::Scheduler;
pub use simulation::{EventHandler, Simulation, SimulationContext};
pub use time::VirtualTime;
