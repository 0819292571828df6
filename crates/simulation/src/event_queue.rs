//! Virtual-time event queue.

use cranesim_core::SimTime;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::trace;

/// Key for ordering entries in the queue.
///
/// Ordered by time first, then by insertion sequence, so entries scheduled
/// for the same instant pop in the order they were scheduled. The key also
/// serves as the handle for cancelling an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    /// When the entry is due.
    pub time: SimTime,
    /// Insertion sequence number (FIFO tie-break).
    pub sequence: u64,
}

/// A pending action owned by the queue.
#[derive(Debug)]
struct ScheduledEntry<A> {
    action: A,
    /// Only used in logs.
    label: Cow<'static, str>,
    canceled: bool,
}

/// Ordered collection of pending actions keyed by virtual time.
///
/// Owns the simulated clock. The clock only moves when an entry is popped,
/// and never moves backwards: an entry scheduled in the past runs on the
/// next drain at the current time.
///
/// There is no internal locking. Exactly one thread of control drives a
/// queue; other threads hand their inputs to that thread.
#[derive(Debug)]
pub struct EventQueue<A> {
    entries: BTreeMap<EventKey, ScheduledEntry<A>>,
    now: SimTime,
    next_sequence: u64,
    /// Entries not yet popped and not canceled.
    live: usize,
}

impl<A> Default for EventQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> EventQueue<A> {
    /// Create an empty queue with the clock at zero.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            now: SimTime::ZERO,
            next_sequence: 0,
            live: 0,
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `action` at `time`. Past times are allowed.
    pub fn schedule(
        &mut self,
        time: SimTime,
        action: A,
        label: impl Into<Cow<'static, str>>,
    ) -> EventKey {
        let key = EventKey {
            time,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.entries.insert(
            key,
            ScheduledEntry {
                action,
                label: label.into(),
                canceled: false,
            },
        );
        self.live += 1;
        key
    }

    /// Cancel a pending entry.
    ///
    /// Returns `true` if the entry was live. Canceling an entry that already
    /// ran, or was already canceled, does nothing.
    pub fn cancel(&mut self, key: EventKey) -> bool {
        match self.entries.get_mut(&key) {
            Some(entry) if !entry.canceled => {
                entry.canceled = true;
                self.live -= 1;
                trace!(time = key.time.as_nanos(), label = %entry.label, "Canceled entry");
                true
            }
            _ => false,
        }
    }

    /// Check if any live entry is pending.
    pub fn has_pending(&self) -> bool {
        self.live > 0
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if no live entry is pending.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Time of the earliest live entry.
    pub fn earliest(&self) -> Option<SimTime> {
        self.entries
            .iter()
            .find(|(_, entry)| !entry.canceled)
            .map(|(key, _)| key.time)
    }

    /// Pop the next live entry due at or before `limit`.
    ///
    /// Canceled entries met on the way are consumed and skipped. The clock
    /// advances to the popped entry's time before the action is returned.
    pub fn pop_due(&mut self, limit: SimTime) -> Option<A> {
        loop {
            let entry = self.entries.first_entry()?;
            if entry.key().time > limit {
                return None;
            }
            let (key, entry) = entry.remove_entry();
            if entry.canceled {
                continue;
            }
            self.live -= 1;
            self.now = self.now.max(key.time);
            trace!(
                time = key.time.as_nanos(),
                sequence = key.sequence,
                label = %entry.label,
                "Popped entry"
            );
            return Some(entry.action);
        }
    }

    /// Invoke every live entry due at or before `limit`, in order.
    ///
    /// `invoke` receives the queue itself, so an action may schedule further
    /// entries. Those run within the same call if they are due by `limit`.
    pub fn run_until(&mut self, limit: SimTime, mut invoke: impl FnMut(&mut Self, A)) {
        while let Some(action) = self.pop_due(limit) {
            invoke(self, action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn t(nanos: u64) -> SimTime {
        SimTime::from_nanos(nanos)
    }

    #[traced_test]
    #[test]
    fn test_pops_in_time_then_insertion_order() {
        let mut queue = EventQueue::new();
        // Scrambled insertion order with ties at 10 and 30
        let inserts = [(30, 'a'), (10, 'b'), (20, 'c'), (10, 'd'), (30, 'e'), (0, 'f'), (10, 'g')];
        for (time, tag) in inserts {
            queue.schedule(t(time), tag, "test");
        }

        let mut seen = Vec::new();
        queue.run_until(SimTime::MAX, |q, tag| seen.push((q.now().as_nanos(), tag)));

        assert_eq!(
            seen,
            vec![
                (0, 'f'),
                (10, 'b'),
                (10, 'd'),
                (10, 'g'),
                (20, 'c'),
                (30, 'a'),
                (30, 'e'),
            ]
        );
        assert!(!queue.has_pending());
    }

    #[traced_test]
    #[test]
    fn test_run_until_stops_at_limit() {
        let mut queue = EventQueue::new();
        queue.schedule(t(5), 1, "a");
        queue.schedule(t(10), 2, "b");
        queue.schedule(t(11), 3, "c");

        let mut seen = Vec::new();
        queue.run_until(t(10), |_, n| seen.push(n));

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(queue.now(), t(10));
        assert_eq!(queue.earliest(), Some(t(11)));
        assert_eq!(queue.len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_cancel_before_due_skips_action() {
        let mut queue = EventQueue::new();
        let doomed = queue.schedule(t(10), "doomed", "a");
        queue.schedule(t(20), "kept", "b");

        assert!(queue.cancel(doomed));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.earliest(), Some(t(20)));

        let mut seen = Vec::new();
        queue.run_until(SimTime::MAX, |_, s| seen.push(s));
        assert_eq!(seen, vec!["kept"]);
    }

    #[traced_test]
    #[test]
    fn test_cancel_after_firing_is_noop() {
        let mut queue = EventQueue::new();
        let key = queue.schedule(t(10), (), "a");
        queue.run_until(SimTime::MAX, |_, _| {});

        assert!(!queue.cancel(key));
        assert!(!queue.cancel(key));
        assert!(queue.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_reentrant_scheduling_runs_in_same_drain() {
        let mut queue: EventQueue<&'static str> = EventQueue::new();
        queue.schedule(t(10), "first", "a");
        queue.schedule(t(10), "second", "b");
        queue.schedule(t(50), "late", "c");

        let mut seen = Vec::new();
        queue.run_until(t(20), |q, tag| {
            seen.push((q.now().as_nanos(), tag));
            if tag == "first" {
                // Same instant: must run after "second", which was queued earlier
                q.schedule(q.now(), "chained", "d");
                // Later but within the limit
                q.schedule(t(15), "follow-up", "e");
                // Beyond the limit: stays queued
                q.schedule(t(25), "next-drain", "f");
            }
        });

        assert_eq!(
            seen,
            vec![
                (10, "first"),
                (10, "second"),
                (10, "chained"),
                (15, "follow-up"),
            ]
        );
        assert_eq!(queue.earliest(), Some(t(25)));
        assert_eq!(queue.len(), 2);
    }

    #[traced_test]
    #[test]
    fn test_past_entry_runs_without_rewinding_clock() {
        let mut queue = EventQueue::new();
        queue.schedule(t(100), "now", "a");
        queue.run_until(t(100), |_, _| {});
        assert_eq!(queue.now(), t(100));

        queue.schedule(t(40), "past", "b");
        let mut seen = Vec::new();
        queue.run_until(t(100), |q, s| seen.push((q.now(), s)));

        assert_eq!(seen, vec![(t(100), "past")]);
    }

    #[traced_test]
    #[test]
    fn test_earliest_ignores_canceled_head() {
        let mut queue = EventQueue::new();
        let head = queue.schedule(t(1), 'x', "a");
        queue.schedule(t(2), 'y', "b");
        queue.cancel(head);
        assert_eq!(queue.earliest(), Some(t(2)));
        queue.run_until(SimTime::MAX, |_, _| {});
        assert_eq!(queue.earliest(), None);
    }
}
