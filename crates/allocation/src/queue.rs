use alloy_primitives::Address;
use kunlun_primitives::OperatorSet;
use tracing::debug;

use crate::{
    error::AllocationResult,
    events::EventLog,
    journal::{Checkpoint, JournaledMap},
    ledger::MagnitudeLedger,
};

/// FIFO of operator sets with a pending deallocation. Entries live in an arena and
/// are consumed by advancing `head`; the arena is reset once fully drained.
#[derive(Debug, Clone, Default)]
pub struct DeallocationQueue {
    entries: Vec<OperatorSet>,
    head: usize,
}

impl DeallocationQueue {
    pub fn push_back(&mut self, operator_set: OperatorSet) {
        self.entries.push(operator_set);
    }

    pub fn front(&self) -> Option<&OperatorSet> {
        self.entries.get(self.head)
    }

    pub fn pop_front(&mut self) -> Option<OperatorSet> {
        let front = self.entries.get(self.head).copied()?;
        self.head += 1;
        if self.head == self.entries.len() {
            self.entries.clear();
            self.head = 0;
        }
        Some(front)
    }

    pub fn len(&self) -> usize {
        self.entries.len() - self.head
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorSet> {
        self.entries[self.head..].iter()
    }
}

/// Deallocation queues keyed by (operator, strategy).
#[derive(Debug, Default)]
pub struct DeallocationQueues {
    queues: JournaledMap<(Address, Address), DeallocationQueue>,
}

impl DeallocationQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, operator: Address, strategy: Address, operator_set: OperatorSet) {
        self.queues.get_mut_or_default((operator, strategy)).push_back(operator_set);
    }

    pub fn len(&self, operator: &Address, strategy: &Address) -> usize {
        self.queues.get(&(*operator, *strategy)).map(DeallocationQueue::len).unwrap_or_default()
    }

    pub fn entries(&self, operator: &Address, strategy: &Address) -> Vec<OperatorSet> {
        self.queues
            .get(&(*operator, *strategy))
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Completes up to `max_to_clear` matured deallocations from the front of the queue,
    /// releasing their encumbered magnitude. Stops at the first entry that has not
    /// matured. Returns the number of entries cleared.
    pub fn clear_matured(
        &mut self,
        ledger: &mut MagnitudeLedger,
        events: &mut EventLog,
        operator: Address,
        strategy: Address,
        max_to_clear: usize,
        block: u32,
    ) -> AllocationResult<usize> {
        let mut cleared = 0;
        while cleared < max_to_clear {
            let Some(operator_set) = self
                .queues
                .get(&(operator, strategy))
                .and_then(|queue| queue.front().copied())
            else {
                break;
            };

            let stored = ledger.allocation(&operator, &operator_set, &strategy);
            if block < stored.effect_block {
                break;
            }

            let (info, allocation) =
                ledger.updated_allocation(&operator, &operator_set, &strategy, block)?;
            ledger.store(operator, operator_set, strategy, info, allocation, events);
            self.queues.get_mut_or_default((operator, strategy)).pop_front();
            cleared += 1;
        }

        if cleared > 0 {
            debug!(%operator, %strategy, cleared, "cleared deallocation queue");
        }
        Ok(cleared)
    }
}

impl Checkpoint for DeallocationQueues {
    fn checkpoint(&mut self) {
        self.queues.checkpoint();
    }

    fn commit(&mut self) {
        self.queues.commit();
    }

    fn revert(&mut self) {
        self.queues.revert();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use kunlun_primitives::Allocation;

    const OPERATOR: Address = address!("0x0000777735367b36bC9B61C50022d9D0700dB4Ec");
    const STRATEGY: Address = address!("0x00000000000000000000000000000000000005a1");
    const AVS: Address = address!("0x00000000000000000000000000000000000000aa");

    #[test]
    fn queue_is_fifo_and_resets_when_drained() {
        let mut queue = DeallocationQueue::default();
        let first = OperatorSet::new(AVS, 1);
        let second = OperatorSet::new(AVS, 2);
        queue.push_back(first);
        queue.push_back(second);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop_front(), Some(first));
        assert_eq!(queue.front(), Some(&second));
        assert_eq!(queue.iter().count(), 1);
        assert_eq!(queue.pop_front(), Some(second));
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop_front(), None);

        queue.push_back(first);
        assert_eq!(queue.front(), Some(&first));
    }

    fn queued_deallocation(
        ledger: &mut MagnitudeLedger,
        queues: &mut DeallocationQueues,
        events: &mut EventLog,
        operator_set: OperatorSet,
        magnitude: u64,
        effect_block: u32,
    ) {
        let encumbered = ledger.encumbered_magnitude(&OPERATOR, &STRATEGY) + magnitude;
        ledger.set_encumbered_magnitude(OPERATOR, STRATEGY, encumbered, events);
        let allocation = Allocation::new(magnitude, -(magnitude as i128), effect_block);
        ledger.set_allocation(OPERATOR, operator_set, STRATEGY, allocation, events);
        queues.enqueue(OPERATOR, STRATEGY, operator_set);
    }

    #[test]
    fn clear_matured_stops_at_first_unmatured_entry() {
        let mut ledger = MagnitudeLedger::new();
        let mut queues = DeallocationQueues::new();
        let mut events = EventLog::default();
        let first = OperatorSet::new(AVS, 1);
        let second = OperatorSet::new(AVS, 2);
        let third = OperatorSet::new(AVS, 3);
        queued_deallocation(&mut ledger, &mut queues, &mut events, first, 100, 10);
        queued_deallocation(&mut ledger, &mut queues, &mut events, second, 200, 20);
        queued_deallocation(&mut ledger, &mut queues, &mut events, third, 300, 30);

        let cleared =
            queues.clear_matured(&mut ledger, &mut events, OPERATOR, STRATEGY, usize::MAX, 20).unwrap();
        assert_eq!(cleared, 2);
        assert_eq!(queues.entries(&OPERATOR, &STRATEGY), vec![third]);
        assert_eq!(ledger.encumbered_magnitude(&OPERATOR, &STRATEGY), 300);
        assert_eq!(ledger.allocation(&OPERATOR, &first, &STRATEGY), Allocation::new(0, 0, 10));
    }

    #[test]
    fn clear_matured_respects_limit() {
        let mut ledger = MagnitudeLedger::new();
        let mut queues = DeallocationQueues::new();
        let mut events = EventLog::default();
        queued_deallocation(&mut ledger, &mut queues, &mut events, OperatorSet::new(AVS, 1), 100, 10);
        queued_deallocation(&mut ledger, &mut queues, &mut events, OperatorSet::new(AVS, 2), 100, 10);

        let cleared =
            queues.clear_matured(&mut ledger, &mut events, OPERATOR, STRATEGY, 1, 50).unwrap();
        assert_eq!(cleared, 1);
        assert_eq!(queues.len(&OPERATOR, &STRATEGY), 1);
        assert_eq!(ledger.encumbered_magnitude(&OPERATOR, &STRATEGY), 100);
    }

    #[test]
    fn clear_matured_on_empty_queue_is_noop() {
        let mut ledger = MagnitudeLedger::new();
        let mut queues = DeallocationQueues::new();
        let mut events = EventLog::default();
        let cleared =
            queues.clear_matured(&mut ledger, &mut events, OPERATOR, STRATEGY, 10, 50).unwrap();
        assert_eq!(cleared, 0);
    }
}
