//! Scripted fault injection.
//!
//! A [`FaultPlan`] is a scenario-level list of administrative link
//! toggles, referenced by link handle and scheduled through the same
//! scheduler the protocols use. The protocol code never knows a plan
//! exists; a lowered link is only observed indirectly, as silence.

use crate::event::EventType;
use crate::net::LinkId;
use crate::simulation::Simulation;
use crate::time::VirtualTime;

/// One scheduled link-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultEvent {
    /// When to apply the change.
    pub at: VirtualTime,
    /// The directed link to change.
    pub link: LinkId,
    /// `true` raises the link, `false` lowers it.
    pub up: bool,
}

/// An ordered collection of link toggles for one scenario.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    events: Vec<FaultEvent>,
}

impl FaultPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        FaultPlan::default()
    }

    /// Lower one directed link at `at`.
    pub fn down(mut self, at: VirtualTime, link: LinkId) -> Self {
        self.events.push(FaultEvent {
            at,
            link,
            up: false,
        });
        self
    }

    /// Raise one directed link at `at`.
    pub fn up(mut self, at: VirtualTime, link: LinkId) -> Self {
        self.events.push(FaultEvent { at, link, up: true });
        self
    }

    /// Lower both directions of a connection at `at`.
    pub fn sever(self, at: VirtualTime, pair: (LinkId, LinkId)) -> Self {
        self.down(at, pair.0).down(at, pair.1)
    }

    /// Raise both directions of a connection at `at`.
    pub fn restore(self, at: VirtualTime, pair: (LinkId, LinkId)) -> Self {
        self.up(at, pair.0).up(at, pair.1)
    }

    /// The scheduled changes, in insertion order.
    pub fn events(&self) -> &[FaultEvent] {
        &self.events
    }

    /// Whether the plan contains no changes.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Enqueue every change as a `LinkSet` event.
    pub fn schedule(&self, sim: &mut Simulation) {
        for event in &self.events {
            sim.schedule(
                event.at,
                EventType::LinkSet {
                    link: event.link,
                    up: event.up,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;

    #[test]
    fn test_sever_covers_both_directions() {
        let plan = FaultPlan::new().sever(
            VirtualTime::new(100),
            (LinkId::new(0), LinkId::new(1)),
        );
        assert_eq!(plan.events().len(), 2);
        assert!(plan.events().iter().all(|e| !e.up));
    }

    #[test]
    fn test_schedule_enqueues_link_set_events() {
        let plan = FaultPlan::new()
            .down(VirtualTime::new(50), LinkId::new(3))
            .up(VirtualTime::new(80), LinkId::new(3));

        let mut sim = Simulation::new();
        plan.schedule(&mut sim);

        let events = sim.scheduler_mut().drain_ordered();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].payload,
            EventType::LinkSet {
                link: LinkId::new(3),
                up: false
            }
        );
        assert_eq!(events[0].scheduled_at, VirtualTime::new(50));
        assert_eq!(
            events[1].payload,
            EventType::LinkSet {
                link: LinkId::new(3),
                up: true
            }
        );
    }

    #[test]
    fn test_empty_plan() {
        let plan = FaultPlan::new();
        assert!(plan.is_empty());
        let mut sim = Simulation::new();
        plan.schedule(&mut sim);
        assert!(sim.is_finished());
    }
}
