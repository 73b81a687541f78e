//! The global event queue — spec §4.D / §5.
//!
//! Events are ordered by `(time, tiebreak class, insertion order)`. The
//! tiebreak class encodes: `supply-end < arrival < deadline < supply-start <
//! completion` at the same instant — supply revocation must be applied
//! before new supply begins, and deadlines are checked only after the
//! arrival that creates the next job has already been enqueued.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::model::{ComponentId, TaskId};
use crate::time::{Duration, OrderedTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TiebreakClass {
    SupplyEnd = 0,
    Arrival = 1,
    Deadline = 2,
    SupplyStart = 3,
    Completion = 4,
}

#[derive(Debug, Clone)]
pub enum Event {
    Arrival { task: TaskId, component: ComponentId },
    Deadline { task: TaskId, instance: u64 },
    Completion { job: usize, run_token: u64 },
    SupplyStart { component: ComponentId },
    SupplyEnd { component: ComponentId },
}

impl Event {
    fn class(&self) -> TiebreakClass {
        match self {
            Event::SupplyEnd { .. } => TiebreakClass::SupplyEnd,
            Event::Arrival { .. } => TiebreakClass::Arrival,
            Event::Deadline { .. } => TiebreakClass::Deadline,
            Event::SupplyStart { .. } => TiebreakClass::SupplyStart,
            Event::Completion { .. } => TiebreakClass::Completion,
        }
    }
}

#[derive(Debug, Clone)]
struct ScheduledEvent {
    time: OrderedTime,
    class: TiebreakClass,
    seq: u64,
    event: Event,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        (self.time, self.class, self.seq) == (other.time, other.class, other.seq)
    }
}
impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.time, self.class, self.seq).cmp(&(other.time, other.class, other.seq))
    }
}

/// A deterministic event queue: earliest time first, ties broken by
/// [`TiebreakClass`], further ties broken FIFO by insertion order.
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue { heap: BinaryHeap::new(), next_seq: 0 }
    }

    pub fn push(&mut self, time: Duration, event: Event) {
        let class = event.class();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time: crate::time::ordered(time), class, seq, event }));
    }

    pub fn pop(&mut self) -> Option<(Duration, Event)> {
        self.heap.pop().map(|Reverse(se)| (Duration::new(se.time.into_inner()), se.event))
    }

    pub fn peek_time(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(se)| Duration::new(se.time.into_inner()))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_resolved_by_class_then_fifo() {
        let mut q = EventQueue::new();
        let t = Duration::new(10.0);
        q.push(t, Event::Completion { job: 0, run_token: 0 });
        q.push(t, Event::SupplyEnd { component: "c".into() });
        q.push(t, Event::Arrival { task: "t1".into(), component: "c".into() });

        let (_, first) = q.pop().unwrap();
        assert!(matches!(first, Event::SupplyEnd { .. }));
        let (_, second) = q.pop().unwrap();
        assert!(matches!(second, Event::Arrival { .. }));
        let (_, third) = q.pop().unwrap();
        assert!(matches!(third, Event::Completion { .. }));
    }

    #[test]
    fn earlier_time_pops_first_regardless_of_class() {
        let mut q = EventQueue::new();
        q.push(Duration::new(20.0), Event::SupplyEnd { component: "c".into() });
        q.push(Duration::new(5.0), Event::Completion { job: 0, run_token: 0 });

        let (t, event) = q.pop().unwrap();
        assert_eq!(t, Duration::new(5.0));
        assert!(matches!(event, Event::Completion { .. }));
    }
}
