//! The work queue a composite node drives its children through.

use crate::node::NodeIndex;
use std::collections::VecDeque;

/// FIFO of children that still need steps.
///
/// The owner pops the front, steps it once, and pushes it back while it
/// still needs steps. A pass over the queue therefore advances every
/// pending child by exactly one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mind {
    queue: VecDeque<NodeIndex>,
}

impl Mind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, idx: NodeIndex) {
        self.queue.push_back(idx);
    }

    /// Put a child back at the front after its step failed.
    pub(crate) fn requeue_front(&mut self, idx: NodeIndex) {
        self.queue.push_front(idx);
    }

    pub(crate) fn dequeue(&mut self) -> Option<NodeIndex> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.queue.contains(&idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.queue.iter().copied()
    }
}

impl FromIterator<NodeIndex> for Mind {
    fn from_iter<I: IntoIterator<Item = NodeIndex>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}
