/// Fluent builder for simulation setup.
///
/// Hides the boilerplate of creating the simulation, parsing or
/// assembling the topology, registering distance-vector apps, seeding
/// their initial broadcasts, and scheduling a fault plan, while
/// preserving full determinism.

use crate::error::{PolarisError, PolarisResult};
use crate::event::EventType;
use crate::faults::FaultPlan;
use crate::net::{NetRuntime, Topology};
use crate::net::topology::DEFAULT_LINK_DELAY;
use crate::routing::{DistanceVectorApp, DvConfig, DV_ROUTING};
use crate::simulation::Simulation;
use crate::time::VirtualTime;

/// Fluent builder for a `(Simulation, NetRuntime)` pair running the
/// distance-vector protocol.
///
/// # Example
/// ```rust
/// use polaris::dsl::SimBuilder;
///
/// let (mut sim, mut rt) = SimBuilder::new()
///     .link("n1", "n2")?
///     .link("n2", "n3")?
///     .dv_all()
///     .build()?;
/// sim.run(&mut rt);
/// # Ok::<(), polaris::PolarisError>(())
/// ```
#[derive(Debug, Default)]
pub struct SimBuilder {
    topology: Topology,
    /// Hosts to run the protocol on, in registration order. The order
    /// fixes the T=0 broadcast sequence.
    dv_hosts: Vec<String>,
    config: DvConfig,
    faults: FaultPlan,
}

impl SimBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        SimBuilder::default()
    }

    /// Start from a parsed textual topology description.
    pub fn from_topology_text(text: &str) -> PolarisResult<Self> {
        Ok(SimBuilder {
            topology: Topology::from_text(text)?,
            ..SimBuilder::default()
        })
    }

    // ── Topology ──────────────────────────────────────────────

    /// Connect two hosts with the default per-direction delay.
    pub fn link(self, a: &str, b: &str) -> PolarisResult<Self> {
        self.link_with_delay(a, b, DEFAULT_LINK_DELAY)
    }

    /// Connect two hosts with an explicit per-direction delay.
    pub fn link_with_delay(mut self, a: &str, b: &str, delay: u64) -> PolarisResult<Self> {
        self.topology.connect(a, b, delay)?;
        Ok(self)
    }

    // ── Protocol instances ────────────────────────────────────

    /// Run the distance-vector protocol on one host.
    pub fn dv(mut self, hostname: &str) -> Self {
        self.dv_hosts.push(hostname.to_string());
        self
    }

    /// Run the distance-vector protocol on every host, in sorted
    /// hostname order.
    pub fn dv_all(mut self) -> Self {
        self.dv_hosts = self.topology.hostnames();
        self
    }

    /// Override the protocol configuration for all apps.
    pub fn dv_config(mut self, config: DvConfig) -> Self {
        self.config = config;
        self
    }

    // ── Faults ────────────────────────────────────────────────

    /// Lower both directions between `a` and `b` at tick `at`.
    pub fn sever(mut self, a: &str, b: &str, at: u64) -> PolarisResult<Self> {
        let pair = self
            .topology
            .pair_between(a, b)
            .ok_or_else(|| PolarisError::UnknownHost(format!("{} <-> {}", a, b)))?;
        self.faults = self.faults.sever(VirtualTime::new(at), pair);
        Ok(self)
    }

    /// Raise both directions between `a` and `b` at tick `at`.
    pub fn restore(mut self, a: &str, b: &str, at: u64) -> PolarisResult<Self> {
        let pair = self
            .topology
            .pair_between(a, b)
            .ok_or_else(|| PolarisError::UnknownHost(format!("{} <-> {}", a, b)))?;
        self.faults = self.faults.restore(VirtualTime::new(at), pair);
        Ok(self)
    }

    /// Attach a pre-assembled fault plan.
    pub fn fault_plan(mut self, plan: FaultPlan) -> Self {
        self.faults = plan;
        self
    }

    // ── Build ─────────────────────────────────────────────────

    /// Build the simulation and runtime.
    ///
    /// Each app's first broadcast is seeded at T=0, in registration
    /// order, mirroring a setup script that starts every node before
    /// the clock runs.
    pub fn build(self) -> PolarisResult<(Simulation, NetRuntime)> {
        let mut sim = Simulation::new();
        let mut rt = NetRuntime::new(self.topology);

        for hostname in &self.dv_hosts {
            let node = rt
                .topology()
                .resolve(hostname)
                .ok_or_else(|| PolarisError::UnknownHost(hostname.clone()))?;
            rt.register_protocol(
                node,
                DV_ROUTING,
                Box::new(DistanceVectorApp::new(self.config.clone())),
            )?;
            sim.schedule(
                VirtualTime::ZERO,
                EventType::ProtocolTimer {
                    node,
                    protocol: DV_ROUTING,
                    timer_id: 0,
                },
            );
        }

        self.faults.schedule(&mut sim);
        Ok((sim, rt))
    }

    /// Build, run to completion, and return
    /// `(Simulation, NetRuntime, events_processed)`.
    pub fn run(self) -> PolarisResult<(Simulation, NetRuntime, u64)> {
        let (mut sim, mut rt) = self.build()?;
        let processed = sim.run(&mut rt);
        Ok((sim, rt, processed))
    }
}
