use alloy_primitives::{Address, U256};
use kunlun_primitives::{
    magnitude::{add_signed, proportional_stake},
    Allocation, AllocationDelayInfo, OperatorSet, RegistrationStatus,
};

use crate::{
    clients::{AvsRegistrar, DelegationLedger, PermissionController},
    manager::AllocationManager,
};

impl<D, R, P> AllocationManager<D, R, P>
where
    D: DelegationLedger,
    R: AvsRegistrar,
    P: PermissionController,
{
    pub fn max_magnitudes(&self, operator: &Address, strategies: &[Address]) -> Vec<u64> {
        strategies
            .iter()
            .map(|strategy| self.state.ledger.max_magnitude(operator, strategy))
            .collect()
    }

    pub fn max_magnitudes_at_block(
        &self,
        operator: &Address,
        strategies: &[Address],
        block: u32,
    ) -> Vec<u64> {
        strategies
            .iter()
            .map(|strategy| self.state.ledger.max_magnitude_at(operator, strategy, block))
            .collect()
    }

    pub fn encumbered_magnitude(&self, operator: &Address, strategy: &Address) -> u64 {
        self.state.ledger.encumbered_magnitude(operator, strategy)
    }

    /// Magnitude still free to allocate, counting deallocations in the queue that
    /// have matured but were not cleared yet.
    pub fn allocatable_magnitude(&self, operator: &Address, strategy: &Address) -> u64 {
        let ledger = &self.state.ledger;
        let mut encumbered = ledger.encumbered_magnitude(operator, strategy);
        for operator_set in self.state.queues.entries(operator, strategy) {
            let allocation = ledger.allocation(operator, &operator_set, strategy);
            if self.block_number < allocation.effect_block {
                break;
            }
            if allocation.is_deallocation_pending() {
                encumbered = add_signed(encumbered, allocation.pending_diff).unwrap_or_default();
            }
        }
        ledger.max_magnitude(operator, strategy).saturating_sub(encumbered)
    }

    /// Allocation as of the current block, with a matured pending change applied.
    pub fn allocation(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
        strategy: &Address,
    ) -> Allocation {
        let mut allocation = self.state.ledger.allocation(operator, operator_set, strategy);
        allocation.complete(self.block_number);
        allocation
    }

    pub fn allocations(
        &self,
        operators: &[Address],
        operator_set: &OperatorSet,
        strategy: &Address,
    ) -> Vec<Allocation> {
        operators.iter().map(|operator| self.allocation(operator, operator_set, strategy)).collect()
    }

    /// Current allocations of one strategy across the operator's allocated sets.
    pub fn strategy_allocations(
        &self,
        operator: &Address,
        strategy: &Address,
    ) -> Vec<(OperatorSet, Allocation)> {
        self.state
            .ledger
            .strategy_allocations(operator, strategy)
            .into_iter()
            .map(|(operator_set, mut allocation)| {
                allocation.complete(self.block_number);
                (operator_set, allocation)
            })
            .collect()
    }

    pub fn allocated_sets(&self, operator: &Address) -> Vec<OperatorSet> {
        self.state.ledger.allocated_sets(operator)
    }

    pub fn allocated_strategies(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
    ) -> Vec<Address> {
        self.state.ledger.allocated_strategies(operator, operator_set)
    }

    /// Operator sets with a queued deallocation, oldest first.
    pub fn deallocation_queue(&self, operator: &Address, strategy: &Address) -> Vec<OperatorSet> {
        self.state.queues.entries(operator, strategy)
    }

    pub fn deallocation_queue_len(&self, operator: &Address, strategy: &Address) -> usize {
        self.state.queues.len(operator, strategy)
    }

    /// `(is_set, delay)` as of the current block.
    pub fn allocation_delay(&self, operator: &Address) -> (bool, u32) {
        self.state.delays.delay(operator, self.block_number)
    }

    pub fn allocation_delay_info(&self, operator: &Address) -> AllocationDelayInfo {
        self.state.delays.info(operator)
    }

    pub fn is_operator_set(&self, operator_set: &OperatorSet) -> bool {
        self.state.operator_sets.is_operator_set(operator_set)
    }

    pub fn operator_sets(&self, avs: &Address) -> Vec<OperatorSet> {
        self.state.operator_sets.operator_sets(avs)
    }

    pub fn operator_set_count(&self, avs: &Address) -> usize {
        self.state.operator_sets.operator_set_count(avs)
    }

    pub fn strategies_in_operator_set(&self, operator_set: &OperatorSet) -> Vec<Address> {
        self.state.operator_sets.strategies(operator_set)
    }

    pub fn members(&self, operator_set: &OperatorSet) -> Vec<Address> {
        self.state.operator_sets.members(operator_set)
    }

    pub fn member_count(&self, operator_set: &OperatorSet) -> usize {
        self.state.operator_sets.member_count(operator_set)
    }

    pub fn is_member_of_operator_set(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
    ) -> bool {
        self.state.operator_sets.is_member(operator, operator_set)
    }

    pub fn registered_sets(&self, operator: &Address) -> Vec<OperatorSet> {
        self.state.operator_sets.registered_sets(operator)
    }

    pub fn registration_status(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
    ) -> RegistrationStatus {
        self.state.operator_sets.registration_status(operator, operator_set)
    }

    pub fn is_operator_slashable(&self, operator: &Address, operator_set: &OperatorSet) -> bool {
        self.state.operator_sets.is_operator_slashable(operator, operator_set, self.block_number)
    }

    pub fn slash_count(&self, operator_set: &OperatorSet) -> u64 {
        self.state.operator_sets.slash_count(operator_set)
    }

    /// Delegated shares backing each operator's current allocation to the set, one
    /// row per operator and one column per strategy.
    pub fn allocated_stake(
        &self,
        operator_set: &OperatorSet,
        operators: &[Address],
        strategies: &[Address],
    ) -> Vec<Vec<U256>> {
        operators
            .iter()
            .map(|operator| {
                let shares = self.delegation.operator_shares(operator, strategies);
                strategies
                    .iter()
                    .zip(shares)
                    .map(|(strategy, shares)| {
                        let magnitude =
                            self.allocation(operator, operator_set, strategy).current_magnitude;
                        let max_magnitude = self.state.ledger.max_magnitude(operator, strategy);
                        proportional_stake(shares, magnitude, max_magnitude)
                    })
                    .collect()
            })
            .collect()
    }

    /// Stake guaranteed to stay slashable by the set until `future_block`: pending
    /// deallocations that complete by then are subtracted, pending allocations are
    /// ignored. Operators that are not slashable for the set have no stake.
    pub fn minimum_slashable_stake(
        &self,
        operator_set: &OperatorSet,
        operators: &[Address],
        strategies: &[Address],
        future_block: u32,
    ) -> Vec<Vec<U256>> {
        operators
            .iter()
            .map(|operator| {
                if !self.is_operator_slashable(operator, operator_set) {
                    return vec![U256::ZERO; strategies.len()];
                }
                let shares = self.delegation.operator_shares(operator, strategies);
                strategies
                    .iter()
                    .zip(shares)
                    .map(|(strategy, shares)| {
                        let allocation = self.allocation(operator, operator_set, strategy);
                        let magnitude = if allocation.is_deallocation_pending()
                            && allocation.effect_block <= future_block
                        {
                            allocation.target_magnitude()
                        } else {
                            allocation.current_magnitude
                        };
                        let max_magnitude = self.state.ledger.max_magnitude(operator, strategy);
                        proportional_stake(shares, magnitude, max_magnitude)
                    })
                    .collect()
            })
            .collect()
    }
}
