// src/engine/queue.rs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::time::Instant;
use tracing::trace;

use crate::engine::EntryId;

/// A slot in the dispatch queue.
///
/// `seq` is the insertion sequence number; it breaks ties between equal
/// due times so that entries due at the same instant pop in FIFO order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEntry {
    pub id: EntryId,
    pub due_time: Instant,
    pub seq: u64,
}

// `BinaryHeap` is a max-heap, so the comparison is reversed: the earliest
// due time (then the lowest sequence number) is the "greatest" slot.
impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_time
            .cmp(&self.due_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Due-time ordered queue of pending entries.
///
/// Semantics:
/// - `insert` and `pop_earliest` are O(log n); `peek_earliest` is O(1).
/// - Ordering is by `due_time`, ties broken by insertion order.
/// - Capacity is unbounded and no operation fails.
///
/// The queue itself is not synchronised: the engine keeps it behind the
/// same mutex as the entry map and signals the dispatch loop after every
/// insert. Slots whose entry was cancelled are left in place and skipped
/// by the engine when they reach the head.
#[derive(Debug, Default)]
pub struct DispatchQueue {
    heap: BinaryHeap<QueuedEntry>,
    next_seq: u64,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn insert(&mut self, id: EntryId, due_time: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(id = %id, seq, queued = self.heap.len() + 1, "queued entry");
        self.heap.push(QueuedEntry { id, due_time, seq });
    }

    pub fn peek_earliest(&self) -> Option<&QueuedEntry> {
        self.heap.peek()
    }

    pub fn pop_earliest(&mut self) -> Option<QueuedEntry> {
        self.heap.pop()
    }

    /// Pop the head only if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<QueuedEntry> {
        match self.heap.peek() {
            Some(head) if head.due_time <= now => self.heap.pop(),
            _ => None,
        }
    }
}
