//! Delayed block delivery between miners

use std::collections::VecDeque;

use crate::block::BlockId;

/// A block waiting to be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Round in which the block reaches every miner.
    pub at: usize,
    pub block: BlockId,
}

/// Blocks in transit, ordered by delivery round.
///
/// Deliveries scheduled for the same round leave the queue in the order they
/// were scheduled.
#[derive(Debug, Default, Clone)]
pub struct DeliveryQueue {
    pending: VecDeque<Delivery>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `block` for delivery in round `at`.
    pub fn schedule(&mut self, at: usize, block: BlockId) {
        let delivery = Delivery { at, block };
        // Scheduling is almost always in order, so search from the back.
        let index = self
            .pending
            .iter()
            .rposition(|d| d.at <= at)
            .map_or(0, |i| i + 1);

        self.pending.insert(index, delivery);
    }

    /// Removes and returns every delivery due at or before round `now`.
    pub fn due(&mut self, now: usize) -> Vec<Delivery> {
        let count = self.pending.iter().take_while(|d| d.at <= now).count();

        self.pending.drain(..count).collect()
    }

    /// Number of blocks still in transit.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
