/// Simulation execution loop.
///
/// Drives the scheduler: pops events, advances virtual time, dispatches
/// to a user-supplied handler. The loop is purely synchronous and
/// single-threaded; a handler always runs to completion before the next
/// event is considered, so handlers are atomic with respect to each
/// other.

use crate::event::{Event, EventId, EventType};
use crate::scheduler::Scheduler;
use crate::time::VirtualTime;

// ── Handler trait ─────────────────────────────────────────────────────

/// User-defined event handler.
///
/// Implement this trait to react to dispatched events. The handler
/// receives a mutable reference to `SimulationContext` so it can
/// schedule follow-up events.
pub trait EventHandler {
    /// Called for every dispatched event.
    fn handle(&mut self, ctx: &mut SimulationContext, event: &Event);
}

/// A handler backed by a closure, useful for tests and one-off scripts.
impl<F> EventHandler for F
where
    F: FnMut(&mut SimulationContext, &Event),
{
    fn handle(&mut self, ctx: &mut SimulationContext, event: &Event) {
        (self)(ctx, event);
    }
}

// ── Simulation Context ───────────────────────────────────────────────

/// Mutable context passed to the handler on every event dispatch.
///
/// Provides the handler with the current virtual time and the ability
/// to schedule follow-up events. The context borrows the scheduler
/// mutably, so a handler cannot interfere with dispatch ordering
/// outside of the schedule API.
pub struct SimulationContext<'a> {
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) now: VirtualTime,
}

impl SimulationContext<'_> {
    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Schedule an event at an absolute virtual time.
    ///
    /// # Panics
    /// Panics if `at` is before the current time (non-causal scheduling).
    pub fn schedule_at(&mut self, at: VirtualTime, payload: EventType) -> EventId {
        assert!(
            at >= self.now,
            "Cannot schedule event in the past: now={}, at={}",
            self.now,
            at
        );
        self.scheduler.schedule(at, payload)
    }

    /// Schedule an event `delay` ticks into the future relative to now.
    ///
    /// # Panics
    /// Panics on arithmetic overflow (astronomically unlikely).
    pub fn schedule_after(&mut self, delay: u64, payload: EventType) -> EventId {
        let at = self
            .now
            .advance(delay)
            .expect("VirtualTime overflow when scheduling");
        self.scheduler.schedule(at, payload)
    }

    /// Number of pending events in the scheduler.
    pub fn pending_count(&self) -> usize {
        self.scheduler.len()
    }
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level simulation driver.
///
/// Owns the scheduler and tracks the current virtual time. Call `run`
/// to execute until the queue is drained, or `step` to advance by
/// exactly one event.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    scheduler: Scheduler,
    current_time: VirtualTime,
    events_processed: u64,
}

impl Simulation {
    /// Create a new simulation starting at time zero.
    pub fn new() -> Self {
        Simulation {
            scheduler: Scheduler::new(),
            current_time: VirtualTime::ZERO,
            events_processed: 0,
        }
    }

    /// Access the scheduler directly (e.g., for initial event seeding).
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Current virtual time.
    pub fn current_time(&self) -> VirtualTime {
        self.current_time
    }

    /// Total events processed so far.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Schedule an event before the simulation starts running.
    pub fn schedule(&mut self, at: VirtualTime, payload: EventType) -> EventId {
        self.scheduler.schedule(at, payload)
    }

    /// Execute a single step: pop one event, advance time, dispatch.
    ///
    /// Returns `Some(event)` if an event was processed, `None` if the
    /// queue is empty.
    ///
    /// # Panics
    /// Panics if the queue yields an event before the current time;
    /// virtual time must never go backward.
    pub fn step(&mut self, handler: &mut dyn EventHandler) -> Option<Event> {
        let event = self.scheduler.pop_next()?;

        assert!(
            event.scheduled_at >= self.current_time,
            "Time went backward! current={}, event={}",
            self.current_time,
            event.scheduled_at
        );
        self.current_time = event.scheduled_at;
        self.events_processed += 1;

        let mut ctx = SimulationContext {
            scheduler: &mut self.scheduler,
            now: self.current_time,
        };
        handler.handle(&mut ctx, &event);

        Some(event)
    }

    /// Run until the event queue is empty.
    ///
    /// Returns the total number of events processed during this run.
    pub fn run(&mut self, handler: &mut dyn EventHandler) -> u64 {
        let start = self.events_processed;
        while self.step(handler).is_some() {}
        self.events_processed - start
    }

    /// Run until the event queue is empty **or** `max_steps` events
    /// have been dispatched, whichever comes first.
    ///
    /// Returns the number of events processed in this call.
    pub fn run_for(&mut self, max_steps: u64, handler: &mut dyn EventHandler) -> u64 {
        let start = self.events_processed;
        let mut steps = 0u64;
        while steps < max_steps {
            if self.step(handler).is_none() {
                break;
            }
            steps += 1;
        }
        self.events_processed - start
    }

    /// Returns `true` if there are no more events to process.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }
}
