/// Deterministic event scheduler.
///
/// Uses a `BinaryHeap` with reversed `Ord` on `Event` to act as a
/// min-heap keyed by `(scheduled_at, event_id)`. Event IDs are strictly
/// increasing, so events scheduled for the same virtual time dispatch
/// in enqueue order and two runs of the same scenario always produce
/// the same dispatch sequence.

use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdGen, EventType};
use crate::time::VirtualTime;

/// The core deterministic scheduler.
///
/// Owns the event queue and the ID generator. All scheduling goes
/// through this struct to ensure monotonic IDs and deterministic
/// ordering.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    /// Min-heap (via reversed Ord on Event).
    queue: BinaryHeap<Event>,

    /// Monotonic event-ID generator.
    id_gen: EventIdGen,
}

impl Scheduler {
    /// Create a new, empty scheduler.
    pub fn new() -> Self {
        Scheduler {
            queue: BinaryHeap::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Schedule a new event at the given virtual time.
    ///
    /// Returns the `EventId` assigned to this event.
    pub fn schedule(&mut self, at: VirtualTime, payload: EventType) -> EventId {
        let id = self.id_gen.next_id();
        self.queue.push(Event::new(id, at, payload));
        id
    }

    /// Pop the next event (earliest time, lowest ID).
    ///
    /// Returns `None` when the queue is empty.
    pub fn pop_next(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    /// Peek at the next event without removing it.
    pub fn peek_next(&self) -> Option<&Event> {
        self.queue.peek()
    }

    /// Returns `true` if the event queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns the next event ID that will be assigned.
    pub fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }

    /// Drain all events in deterministic order into a `Vec`.
    /// Useful for testing.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(e) = self.queue.pop() {
            events.push(e);
        }
        events
    }
}
