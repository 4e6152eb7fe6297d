use std::collections::BTreeSet;

use alloy_primitives::Address;
use kunlun_primitives::{
    magnitude::add_signed, Allocation, LedgerEvent, OperatorSet, StrategyInfo, WAD,
};

use crate::{
    error::{AllocationError, AllocationResult},
    events::EventLog,
    journal::{Checkpoint, JournaledMap},
};

/// Max magnitude snapshots in block order. Empty means the initial `WAD`.
#[derive(Debug, Clone, Default)]
struct MagnitudeHistory {
    snapshots: Vec<(u32, u64)>,
}

impl MagnitudeHistory {
    fn latest(&self) -> u64 {
        self.snapshots.last().map(|(_, magnitude)| *magnitude).unwrap_or(WAD)
    }

    fn at(&self, block: u32) -> u64 {
        let after = self.snapshots.partition_point(|(snapshot_block, _)| *snapshot_block <= block);
        match after.checked_sub(1) {
            Some(index) => self.snapshots[index].1,
            None => WAD,
        }
    }

    fn push(&mut self, block: u32, magnitude: u64) {
        match self.snapshots.last_mut() {
            Some((last_block, value)) if *last_block == block => *value = magnitude,
            _ => self.snapshots.push((block, magnitude)),
        }
    }
}

/// Capacity accounting store. Performs no validation of its own; the allocation and
/// slashing engines keep it consistent.
#[derive(Debug, Default)]
pub struct MagnitudeLedger {
    allocations: JournaledMap<(Address, OperatorSet, Address), Allocation>,
    encumbered: JournaledMap<(Address, Address), u64>,
    max_magnitudes: JournaledMap<(Address, Address), MagnitudeHistory>,
    allocated_sets: JournaledMap<Address, BTreeSet<OperatorSet>>,
    allocated_strategies: JournaledMap<(Address, OperatorSet), BTreeSet<Address>>,
}

impl MagnitudeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encumbered_magnitude(&self, operator: &Address, strategy: &Address) -> u64 {
        self.encumbered.get(&(*operator, *strategy)).copied().unwrap_or_default()
    }

    pub fn set_encumbered_magnitude(
        &mut self,
        operator: Address,
        strategy: Address,
        encumbered_magnitude: u64,
        events: &mut EventLog,
    ) {
        self.encumbered.insert((operator, strategy), encumbered_magnitude);
        events.emit(LedgerEvent::EncumberedMagnitudeUpdated {
            operator,
            strategy,
            encumbered_magnitude,
        });
    }

    pub fn max_magnitude(&self, operator: &Address, strategy: &Address) -> u64 {
        self.max_magnitudes
            .get(&(*operator, *strategy))
            .map(MagnitudeHistory::latest)
            .unwrap_or(WAD)
    }

    pub fn max_magnitude_at(&self, operator: &Address, strategy: &Address, block: u32) -> u64 {
        self.max_magnitudes
            .get(&(*operator, *strategy))
            .map(|history| history.at(block))
            .unwrap_or(WAD)
    }

    /// Lowers the max magnitude by `amount` as of `block` and returns the new value.
    pub fn reduce_max_magnitude(
        &mut self,
        operator: Address,
        strategy: Address,
        amount: u64,
        block: u32,
        events: &mut EventLog,
    ) -> u64 {
        let history = self.max_magnitudes.get_mut_or_default((operator, strategy));
        let max_magnitude = history.latest().saturating_sub(amount);
        history.push(block, max_magnitude);
        events.emit(LedgerEvent::MaxMagnitudeUpdated { operator, strategy, max_magnitude });
        max_magnitude
    }

    pub fn strategy_info(&self, operator: &Address, strategy: &Address) -> StrategyInfo {
        StrategyInfo::new(
            self.max_magnitude(operator, strategy),
            self.encumbered_magnitude(operator, strategy),
        )
    }

    /// Allocation exactly as stored, matured or not.
    pub fn allocation(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
        strategy: &Address,
    ) -> Allocation {
        self.allocations.get(&(*operator, *operator_set, *strategy)).copied().unwrap_or_default()
    }

    /// Stored allocation and strategy info with a matured pending change applied.
    /// A matured deallocation also releases its encumbered magnitude. Nothing is written.
    pub fn updated_allocation(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
        strategy: &Address,
        block: u32,
    ) -> AllocationResult<(StrategyInfo, Allocation)> {
        let mut info = self.strategy_info(operator, strategy);
        let mut allocation = self.allocation(operator, operator_set, strategy);
        if let Some(diff) = allocation.complete(block) {
            if diff < 0 {
                info.encumbered_magnitude = add_signed(info.encumbered_magnitude, diff).ok_or(
                    AllocationError::MagnitudeOutOfRange {
                        magnitude: info.encumbered_magnitude,
                        diff,
                    },
                )?;
            }
        }
        Ok((info, allocation))
    }

    pub fn set_allocation(
        &mut self,
        operator: Address,
        operator_set: OperatorSet,
        strategy: Address,
        allocation: Allocation,
        events: &mut EventLog,
    ) {
        self.allocations.insert((operator, operator_set, strategy), allocation);

        if allocation.is_empty() {
            let strategies = self.allocated_strategies.get_mut_or_default((operator, operator_set));
            strategies.remove(&strategy);
            if strategies.is_empty() {
                self.allocated_strategies.remove(&(operator, operator_set));
                self.allocated_sets.get_mut_or_default(operator).remove(&operator_set);
            }
        } else {
            self.allocated_sets.get_mut_or_default(operator).insert(operator_set);
            self.allocated_strategies
                .get_mut_or_default((operator, operator_set))
                .insert(strategy);
        }

        events.emit(LedgerEvent::AllocationUpdated {
            operator,
            operator_set,
            strategy,
            magnitude: allocation.target_magnitude(),
            effect_block: allocation.effect_block,
        });
    }

    /// Persists an allocation together with the encumbered magnitude of its strategy,
    /// writing only what changed.
    pub fn store(
        &mut self,
        operator: Address,
        operator_set: OperatorSet,
        strategy: Address,
        info: StrategyInfo,
        allocation: Allocation,
        events: &mut EventLog,
    ) {
        if self.allocation(&operator, &operator_set, &strategy) != allocation {
            self.set_allocation(operator, operator_set, strategy, allocation, events);
        }
        if self.encumbered_magnitude(&operator, &strategy) != info.encumbered_magnitude {
            self.set_encumbered_magnitude(operator, strategy, info.encumbered_magnitude, events);
        }
    }

    /// Operator sets with a non-zero current or pending magnitude for the operator.
    pub fn allocated_sets(&self, operator: &Address) -> Vec<OperatorSet> {
        self.allocated_sets
            .get(operator)
            .map(|sets| sets.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn allocated_strategies(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
    ) -> Vec<Address> {
        self.allocated_strategies
            .get(&(*operator, *operator_set))
            .map(|strategies| strategies.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Stored allocations of one strategy across every set the operator is allocated to.
    pub fn strategy_allocations(
        &self,
        operator: &Address,
        strategy: &Address,
    ) -> Vec<(OperatorSet, Allocation)> {
        self.allocated_sets(operator)
            .into_iter()
            .filter(|operator_set| {
                self.allocated_strategies
                    .get(&(*operator, *operator_set))
                    .is_some_and(|strategies| strategies.contains(strategy))
            })
            .map(|operator_set| (operator_set, self.allocation(operator, &operator_set, strategy)))
            .collect()
    }
}

impl Checkpoint for MagnitudeLedger {
    fn checkpoint(&mut self) {
        self.allocations.checkpoint();
        self.encumbered.checkpoint();
        self.max_magnitudes.checkpoint();
        self.allocated_sets.checkpoint();
        self.allocated_strategies.checkpoint();
    }

    fn commit(&mut self) {
        self.allocations.commit();
        self.encumbered.commit();
        self.max_magnitudes.commit();
        self.allocated_sets.commit();
        self.allocated_strategies.commit();
    }

    fn revert(&mut self) {
        self.allocations.revert();
        self.encumbered.revert();
        self.max_magnitudes.revert();
        self.allocated_sets.revert();
        self.allocated_strategies.revert();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const OPERATOR: Address = address!("0x0000777735367b36bC9B61C50022d9D0700dB4Ec");
    const STRATEGY: Address = address!("0x00000000000000000000000000000000000005a1");
    const AVS: Address = address!("0x00000000000000000000000000000000000000aa");

    #[test]
    fn max_magnitude_starts_at_wad_and_keeps_history() {
        let mut ledger = MagnitudeLedger::new();
        let mut events = EventLog::default();
        assert_eq!(ledger.max_magnitude(&OPERATOR, &STRATEGY), WAD);

        ledger.reduce_max_magnitude(OPERATOR, STRATEGY, WAD / 4, 100, &mut events);
        ledger.reduce_max_magnitude(OPERATOR, STRATEGY, WAD / 4, 200, &mut events);
        ledger.reduce_max_magnitude(OPERATOR, STRATEGY, 1, 200, &mut events);

        assert_eq!(ledger.max_magnitude(&OPERATOR, &STRATEGY), WAD / 2 - 1);
        assert_eq!(ledger.max_magnitude_at(&OPERATOR, &STRATEGY, 99), WAD);
        assert_eq!(ledger.max_magnitude_at(&OPERATOR, &STRATEGY, 100), WAD / 4 * 3);
        assert_eq!(ledger.max_magnitude_at(&OPERATOR, &STRATEGY, 199), WAD / 4 * 3);
        assert_eq!(ledger.max_magnitude_at(&OPERATOR, &STRATEGY, 5_000), WAD / 2 - 1);
        assert_eq!(events.take().len(), 3);
    }

    #[test]
    fn updated_allocation_releases_matured_deallocation() {
        let mut ledger = MagnitudeLedger::new();
        let mut events = EventLog::default();
        let operator_set = OperatorSet::new(AVS, 1);
        ledger.set_encumbered_magnitude(OPERATOR, STRATEGY, 500, &mut events);
        ledger.set_allocation(OPERATOR, operator_set, STRATEGY, Allocation::new(500, -200, 10), &mut events);

        let (info, allocation) = ledger.updated_allocation(&OPERATOR, &operator_set, &STRATEGY, 9).unwrap();
        assert_eq!(info.encumbered_magnitude, 500);
        assert_eq!(allocation, Allocation::new(500, -200, 10));

        let (info, allocation) =
            ledger.updated_allocation(&OPERATOR, &operator_set, &STRATEGY, 10).unwrap();
        assert_eq!(info.encumbered_magnitude, 300);
        assert_eq!(allocation, Allocation::new(300, 0, 10));
        // reads never write
        assert_eq!(ledger.encumbered_magnitude(&OPERATOR, &STRATEGY), 500);
    }

    #[test]
    fn updated_allocation_keeps_encumbrance_of_matured_allocation() {
        let mut ledger = MagnitudeLedger::new();
        let mut events = EventLog::default();
        let operator_set = OperatorSet::new(AVS, 1);
        ledger.set_encumbered_magnitude(OPERATOR, STRATEGY, 500, &mut events);
        ledger.set_allocation(OPERATOR, operator_set, STRATEGY, Allocation::new(0, 500, 10), &mut events);

        let (info, allocation) =
            ledger.updated_allocation(&OPERATOR, &operator_set, &STRATEGY, 10).unwrap();
        assert_eq!(info.encumbered_magnitude, 500);
        assert_eq!(allocation.current_magnitude, 500);
    }

    #[test]
    fn allocated_sets_track_non_empty_allocations() {
        let mut ledger = MagnitudeLedger::new();
        let mut events = EventLog::default();
        let first = OperatorSet::new(AVS, 1);
        let second = OperatorSet::new(AVS, 2);

        ledger.set_allocation(OPERATOR, first, STRATEGY, Allocation::new(0, 10, 5), &mut events);
        ledger.set_allocation(OPERATOR, second, STRATEGY, Allocation::new(10, 0, 5), &mut events);
        assert_eq!(ledger.allocated_sets(&OPERATOR), vec![first, second]);
        assert_eq!(ledger.allocated_strategies(&OPERATOR, &first), vec![STRATEGY]);
        assert_eq!(ledger.strategy_allocations(&OPERATOR, &STRATEGY).len(), 2);

        ledger.set_allocation(OPERATOR, first, STRATEGY, Allocation::new(0, 0, 6), &mut events);
        assert_eq!(ledger.allocated_sets(&OPERATOR), vec![second]);
        assert!(ledger.allocated_strategies(&OPERATOR, &first).is_empty());
    }

    #[test]
    fn revert_restores_ledger() {
        let mut ledger = MagnitudeLedger::new();
        let mut events = EventLog::default();
        let operator_set = OperatorSet::new(AVS, 1);

        ledger.checkpoint();
        ledger.set_allocation(OPERATOR, operator_set, STRATEGY, Allocation::new(0, 10, 5), &mut events);
        ledger.set_encumbered_magnitude(OPERATOR, STRATEGY, 10, &mut events);
        ledger.reduce_max_magnitude(OPERATOR, STRATEGY, 10, 1, &mut events);
        ledger.revert();

        assert_eq!(ledger.allocation(&OPERATOR, &operator_set, &STRATEGY), Allocation::default());
        assert_eq!(ledger.strategy_info(&OPERATOR, &STRATEGY), StrategyInfo::default());
        assert!(ledger.allocated_sets(&OPERATOR).is_empty());
    }
}
