//! Очередь задач с приоритетом: больший приоритет обслуживается первым.
//!
//! Гарантии против голодания нет: непрерывный поток задач с высоким
//! приоритетом может бесконечно откладывать задачи с низким.

use super::handle::WorkItem;
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
};


pub type Priority = i64;

#[derive(Debug)]
pub struct QueueEntry {
    pub priority: Priority,
    seq: u64,
    pub item: WorkItem,
}

impl QueueEntry {
    /// Порядковый номер постановки в очередь.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // При равном приоритете раньше выходит тот, кто раньше встал в очередь.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Неограниченная очередь. Сама по себе не синхронизирована, её охраняет
/// монитор пула.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(log n).
    pub fn push(&mut self, priority: Priority, item: WorkItem) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueueEntry { priority, seq, item });
    }

    #[inline]
    pub fn pop_highest(&mut self) -> Option<QueueEntry> {
        self.heap.pop()
    }

    #[inline]
    pub fn peek_priority(&self) -> Option<Priority> {
        self.heap.peek().map(|e| e.priority)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
