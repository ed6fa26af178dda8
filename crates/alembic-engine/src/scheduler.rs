//! Indexed binary min-heap of reactions keyed by next occurrence.
//!
//! Entries are ordered by `(tau, id)`: equal times are broken by the
//! smaller [`ReactionId`], which keeps runs deterministic. A side table
//! maps each id to its heap slot so that rescheduling and removal are
//! `O(log n)`.

use std::collections::HashMap;

use alembic_core::{ReactionId, Time};

/// Priority queue of reactions by next occurrence.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    heap: Vec<(Time, ReactionId)>,
    slots: HashMap<ReactionId, usize>,
}

impl Scheduler {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scheduled reactions.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether `id` is scheduled.
    pub fn contains(&self, id: ReactionId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Scheduled time of `id`.
    pub fn tau_of(&self, id: ReactionId) -> Option<Time> {
        self.slots.get(&id).map(|&slot| self.heap[slot].0)
    }

    /// The reaction due first, without removing it.
    pub fn peek(&self) -> Option<(ReactionId, Time)> {
        self.heap.first().map(|&(tau, id)| (id, tau))
    }

    /// Schedule `id` at `tau`, or move it there if already scheduled.
    pub fn schedule(&mut self, id: ReactionId, tau: Time) {
        match self.slots.get(&id) {
            Some(&slot) => {
                let old = self.heap[slot].0;
                self.heap[slot].0 = tau;
                if tau < old {
                    self.sift_up(slot);
                } else {
                    self.sift_down(slot);
                }
            }
            None => {
                let slot = self.heap.len();
                self.heap.push((tau, id));
                self.slots.insert(id, slot);
                self.sift_up(slot);
            }
        }
    }

    /// Remove `id`, returning its scheduled time.
    pub fn remove(&mut self, id: ReactionId) -> Option<Time> {
        let slot = self.slots.remove(&id)?;
        let (tau, _) = self.heap.swap_remove(slot);
        if slot < self.heap.len() {
            let moved = self.heap[slot].1;
            self.slots.insert(moved, slot);
            self.sift_down(slot);
            self.sift_up(slot);
        }
        Some(tau)
    }

    /// Remove and return the reaction due first.
    pub fn pop(&mut self) -> Option<(ReactionId, Time)> {
        let (id, tau) = self.peek()?;
        self.remove(id);
        Some((id, tau))
    }

    fn key(&self, slot: usize) -> (Time, ReactionId) {
        self.heap[slot]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].1, a);
        self.slots.insert(self.heap[b].1, b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.key(slot) >= self.key(parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < len && self.key(left) < self.key(smallest) {
                smallest = left;
            }
            if right < len && self.key(right) < self.key(smallest) {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }
}
