//! Events pinned to the audio clock.
//!
//! Every pending transition is an explicit [`ScheduledEvent`] with its own
//! id. Cancellation works by id, by source, or by kind, so stopping an
//! engine can prove nothing is left behind.

use std::fmt;

/// Monotonic id of a playing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The attack reached the loop start.
    EnterSustain,
    /// Start the next loop pass on the idle lane.
    LoopCrossfade,
    /// A faded-out source can be dropped.
    StopSource { lane: usize, source: SourceId },
}

impl EventKind {
    /// Timers that shape the note, as opposed to cleanup of old sources.
    pub fn is_timer(&self) -> bool {
        matches!(self, EventKind::EnterSustain | EventKind::LoopCrossfade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub id: EventId,
    /// Clock position (in output samples) at which the event fires.
    pub at: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: Vec<ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: u64, kind: EventKind) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.pending.push(ScheduledEvent { id, at, kind });
        id
    }

    pub fn cancel(&mut self, id: EventId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.id != id);
        self.pending.len() != before
    }

    /// Cancel every event matching `pred`; returns how many were removed.
    pub fn cancel_where(&mut self, pred: impl Fn(&EventKind) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|e| !pred(&e.kind));
        before - self.pending.len()
    }

    pub fn cancel_timers(&mut self) -> usize {
        self.cancel_where(EventKind::is_timer)
    }

    /// Cancel the pending stop of one source.
    pub fn cancel_stop(&mut self, id: SourceId) -> usize {
        self.cancel_where(|k| matches!(k, EventKind::StopSource { source, .. } if *source == id))
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return the earliest event due at or before `clock`.
    /// Events due at the same time come out in scheduling order.
    pub fn pop_due(&mut self, clock: u64) -> Option<ScheduledEvent> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.at <= clock)
            .min_by_key(|(_, e)| (e.at, e.id))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(idx))
    }

    pub fn pending(&self) -> &[ScheduledEvent] {
        &self.pending
    }

    pub fn count(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.pending.iter().filter(|e| pred(&e.kind)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_then_id_order() {
        let mut s = Scheduler::new();
        s.schedule(100, EventKind::LoopCrossfade);
        s.schedule(50, EventKind::EnterSustain);
        let stop = EventKind::StopSource { lane: 0, source: SourceId(1) };
        s.schedule(50, stop);

        assert!(s.pop_due(49).is_none());
        assert_eq!(s.pop_due(60).map(|e| e.kind), Some(EventKind::EnterSustain));
        assert_eq!(s.pop_due(60).map(|e| e.kind), Some(stop));
        assert!(s.pop_due(60).is_none());
        assert_eq!(s.pop_due(100).map(|e| e.kind), Some(EventKind::LoopCrossfade));
        assert!(s.is_empty());
    }

    #[test]
    fn cancellation_by_id_kind_and_source() {
        let mut s = Scheduler::new();
        let a = s.schedule(10, EventKind::EnterSustain);
        s.schedule(20, EventKind::LoopCrossfade);
        s.schedule(30, EventKind::StopSource { lane: 1, source: SourceId(7) });
        s.schedule(40, EventKind::StopSource { lane: 0, source: SourceId(8) });

        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert_eq!(s.cancel_timers(), 1);
        assert_eq!(s.cancel_stop(SourceId(7)), 1);
        assert_eq!(s.pending().len(), 1);
        s.cancel_all();
        assert!(s.is_empty());
    }
}
