//! Deadline queue for engine timers.
//!
//! Timers are never removed eagerly. The engine tags each armed timer with
//! a per-node token and ignores expiries whose token is no longer current,
//! so the queue only has to hand back whatever is due.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::NodeId;

/// Stands in for deadlines too far out to be represented.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after`, clamped to a far-future deadline instead of overflowing.
pub fn deadline_after(now: Instant, after: Duration) -> Instant {
    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Which handshake timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Our PING went unanswered.
    PongTimeout,
    /// The remote did not PING us back after answering.
    PingTimeout,
}

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    /// Peer the timer belongs to
    pub node: NodeId,
    /// Kind of timer
    pub kind: TimerKind,
    /// Arming generation, checked against the peer's current token
    pub token: u64,
}

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    deadline: Instant,
    seq: u64,
    key: TimerKey,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending timers, ordered by deadline then arming order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `deadline`.
    pub fn arm(&mut self, key: TimerKey, deadline: Instant) {
        self.seq = self.seq.wrapping_add(1);
        self.heap.push(Reverse(Entry {
            deadline,
            seq: self.seq,
            key,
        }));
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.key);
            }
        }
        due
    }

    /// Number of pending timers, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
