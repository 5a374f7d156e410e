//! A single point-to-point queue: a priority-ordered ready heap plus a FIFO
//! of parked long-poll waiters.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use super::waiter::Waiter;

/// An entry in the ready heap. Carries the message's `generation` so a
/// stale entry (the message was deleted or re-delivered since this entry
/// was pushed) can be recognized and dropped lazily on pop instead of
/// requiring an eager remove-from-heap.
#[derive(Debug, Clone, Copy)]
pub struct HeapEntry {
    pub priority: i64,
    /// The message's `show` at the moment it entered the ready heap —
    /// the due time that breaks priority ties.
    pub show: f64,
    pub id: u64,
    pub generation: u64,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Key is (-priority, show, id): higher priority first, then
        // earliest due, then earliest id. BinaryHeap is a max-heap, so
        // `show` and `id` are compared in reverse to prefer the smallest.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.show.total_cmp(&self.show))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

#[derive(Default)]
pub struct Channel {
    pub ready: BinaryHeap<HeapEntry>,
    pub waiters: VecDeque<Waiter>,
    /// Topics this channel subscribes to.
    pub topics: HashSet<String>,
    /// Live (ready + hidden + terminal-hidden) message count owned by this
    /// channel, maintained incrementally so `remove_if_empty` is O(1)
    /// instead of a store-wide scan on every delete/drain/purge.
    pub message_count: usize,
}

impl Channel {
    /// A channel exists while it holds at least one message or at least one
    /// subscription. A channel with a parked waiter but no
    /// messages/subscriptions is kept around anyway — destroying it would
    /// strand the waiter — but is not reported as existing to callers.
    pub fn exists(&self) -> bool {
        self.message_count > 0 || !self.topics.is_empty()
    }

    /// Remove a waiter by identity once it's known to be stale (timed out
    /// or cancelled), so it doesn't linger in the FIFO forever. Returns
    /// `true` if a matching waiter was found and removed.
    pub fn remove_waiter(&mut self, id: usize) -> bool {
        let before = self.waiters.len();
        self.waiters.retain(|w| w.id() != id);
        self.waiters.len() != before
    }
}
