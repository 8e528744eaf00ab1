//! # Admission queue.
//!
//! Pending tickets ordered by `(priority desc, sequence asc)`: higher priority
//! first, FIFO among equals. A ticket-id index makes `contains` O(1).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::controller::ticket::{Ticket, TicketId};
use crate::error::ControllerError;

struct Pending(Ticket);

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // BinaryHeap pops the greatest element.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

pub(crate) struct AdmissionQueue {
    heap: BinaryHeap<Pending>,
    index: HashSet<TicketId>,
    capacity: Option<usize>,
}

impl AdmissionQueue {
    /// `None` means unbounded.
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            heap: BinaryHeap::new(),
            index: HashSet::new(),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, ticket: Ticket) -> Result<(), ControllerError> {
        if let Some(capacity) = self.capacity {
            if self.heap.len() >= capacity {
                return Err(ControllerError::AdmissionRejected { capacity });
            }
        }
        self.index.insert(ticket.id.clone());
        self.heap.push(Pending(ticket));
        Ok(())
    }

    /// Removes the head: highest priority, earliest sequence.
    pub(crate) fn pop(&mut self) -> Option<Ticket> {
        let Pending(ticket) = self.heap.pop()?;
        self.index.remove(&ticket.id);
        Some(ticket)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Empties the queue, returning tickets in admission order.
    pub(crate) fn drain(&mut self) -> Vec<Ticket> {
        self.index.clear();
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(Pending(t)) = self.heap.pop() {
            out.push(t);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Params;

    fn ticket(priority: i32, sequence: u64) -> Ticket {
        Ticket::new(Params::new(), priority, sequence)
    }

    fn order(q: &mut AdmissionQueue) -> Vec<(i32, u64)> {
        std::iter::from_fn(|| q.pop().map(|t| (t.priority, t.sequence))).collect()
    }

    #[test]
    fn higher_priority_first_then_fifo() {
        let mut q = AdmissionQueue::new(None);
        for (p, s) in [(0, 0), (5, 1), (0, 2), (-3, 3), (5, 4)] {
            q.push(ticket(p, s)).unwrap();
        }
        assert_eq!(order(&mut q), vec![(5, 1), (5, 4), (0, 0), (0, 2), (-3, 3)]);
    }

    #[test]
    fn contains_tracks_membership() {
        let mut q = AdmissionQueue::new(None);
        let t = ticket(1, 0);
        let id = t.id.clone();
        q.push(t).unwrap();
        assert!(q.contains(id.as_str()));
        assert!(!q.contains("nope"));

        q.pop();
        assert!(!q.contains(id.as_str()));
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn bounded_queue_rejects_when_full() {
        let mut q = AdmissionQueue::new(Some(2));
        q.push(ticket(0, 0)).unwrap();
        q.push(ticket(0, 1)).unwrap();
        assert_eq!(
            q.push(ticket(9, 2)),
            Err(ControllerError::AdmissionRejected { capacity: 2 })
        );

        q.pop();
        assert!(q.push(ticket(9, 3)).is_ok());
    }

    #[test]
    fn drain_empties_in_order() {
        let mut q = AdmissionQueue::new(None);
        q.push(ticket(1, 0)).unwrap();
        q.push(ticket(2, 1)).unwrap();
        let drained: Vec<i32> = q.drain().into_iter().map(|t| t.priority).collect();
        assert_eq!(drained, vec![2, 1]);
        assert_eq!(q.len(), 0);
    }
}
