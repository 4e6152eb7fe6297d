use alloy_primitives::Address;
use kunlun_primitives::{
    magnitude::{add_signed, signed_delta},
    AllocateParams, Entrypoint, OperatorSet,
};
use tracing::{debug, info};

use crate::{
    clients::{AvsRegistrar, DelegationLedger, PermissionController},
    error::{AllocationError, AllocationResult},
    manager::{after_delay, AllocationManager},
    metrics::{AllocationMetrics, ModificationKind},
};

impl<D, R, P> AllocationManager<D, R, P>
where
    D: DelegationLedger,
    R: AvsRegistrar,
    P: PermissionController,
{
    /// Moves the operator's magnitude towards the requested targets. Increases and
    /// deallocations from slashable sets take effect after a delay; deallocations the
    /// operator is no longer slashable for take effect immediately.
    pub fn modify_allocations(
        &mut self,
        caller: Address,
        operator: Address,
        params: &[AllocateParams],
    ) -> AllocationResult<()> {
        self.check_can_call(operator, caller, Entrypoint::ModifyAllocations)?;
        let kinds = self.atomically(|manager| manager.apply_allocations(operator, params))?;

        for kind in &kinds {
            AllocationMetrics::modification(*kind);
        }
        info!(%operator, modifications = kinds.len(), "allocations modified");
        Ok(())
    }

    /// Completes matured deallocations from the front of each strategy's queue.
    /// Anyone may call this. Returns how many entries were cleared per strategy.
    pub fn clear_deallocation_queue(
        &mut self,
        operator: Address,
        strategies: &[Address],
        nums_to_clear: &[usize],
    ) -> AllocationResult<Vec<usize>> {
        if strategies.len() != nums_to_clear.len() {
            return Err(AllocationError::InputArrayLengthMismatch {
                strategies: strategies.len(),
                values: nums_to_clear.len(),
            });
        }

        let block = self.block_number;
        let cleared = self.atomically(|manager| {
            let state = &mut manager.state;
            let mut cleared = Vec::with_capacity(strategies.len());
            for (strategy, num_to_clear) in strategies.iter().zip(nums_to_clear) {
                cleared.push(state.queues.clear_matured(
                    &mut state.ledger,
                    &mut state.events,
                    operator,
                    *strategy,
                    *num_to_clear,
                    block,
                )?);
            }
            Ok(cleared)
        })?;

        let total = cleared.iter().sum::<usize>();
        AllocationMetrics::deallocations_cleared(total);
        info!(%operator, total, "deallocation queue cleared");
        Ok(cleared)
    }

    fn apply_allocations(
        &mut self,
        operator: Address,
        params: &[AllocateParams],
    ) -> AllocationResult<Vec<ModificationKind>> {
        let block = self.block_number;
        let allocation_delay = self.state.delays.effective_delay(&operator, block)?;

        let mut kinds = vec![];
        for param in params {
            if param.strategies.len() != param.new_magnitudes.len() {
                return Err(AllocationError::InputArrayLengthMismatch {
                    strategies: param.strategies.len(),
                    values: param.new_magnitudes.len(),
                });
            }
            let operator_set = param.operator_set;
            self.state.operator_sets.ensure_exists(&operator_set)?;
            let slashable =
                self.state.operator_sets.is_operator_slashable(&operator, &operator_set, block);

            for (strategy, new_magnitude) in param.strategies.iter().zip(&param.new_magnitudes) {
                let kind = self.modify_allocation(
                    operator,
                    operator_set,
                    *strategy,
                    *new_magnitude,
                    allocation_delay,
                    slashable,
                )?;
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    fn modify_allocation(
        &mut self,
        operator: Address,
        operator_set: OperatorSet,
        strategy: Address,
        new_magnitude: u64,
        allocation_delay: u32,
        operator_slashable: bool,
    ) -> AllocationResult<ModificationKind> {
        let block = self.block_number;
        let deallocation_delay = self.config.deallocation_delay;
        self.settle_matured(operator, strategy)?;

        let state = &mut self.state;
        let (mut info, mut allocation) =
            state.ledger.updated_allocation(&operator, &operator_set, &strategy, block)?;
        if allocation.is_pending() {
            return Err(AllocationError::ModificationAlreadyPending {
                operator,
                operator_set,
                strategy,
            });
        }

        let diff = signed_delta(allocation.current_magnitude, new_magnitude);
        if diff == 0 {
            return Err(AllocationError::SameMagnitude {
                operator,
                operator_set,
                strategy,
                magnitude: new_magnitude,
            });
        }

        let out_of_range =
            |magnitude: u64| AllocationError::MagnitudeOutOfRange { magnitude, diff };
        let kind = if diff > 0 {
            let requested = u64::try_from(diff).unwrap_or(u64::MAX);
            let allocatable = info.max_magnitude.saturating_sub(info.encumbered_magnitude);
            if requested > allocatable {
                return Err(AllocationError::InsufficientAllocatableMagnitude {
                    operator,
                    strategy,
                    allocatable,
                    requested,
                });
            }
            info.encumbered_magnitude += requested;
            allocation.pending_diff = diff;
            allocation.effect_block = after_delay(block, allocation_delay)?;
            ModificationKind::Allocate
        } else if operator_slashable
            && state.operator_sets.contains_strategy(&operator_set, &strategy)
            && allocation.current_magnitude != 0
        {
            allocation.pending_diff = diff;
            allocation.effect_block = after_delay(block, deallocation_delay)?;
            state.queues.enqueue(operator, strategy, operator_set);
            ModificationKind::QueuedDeallocation
        } else {
            info.encumbered_magnitude = add_signed(info.encumbered_magnitude, diff)
                .ok_or_else(|| out_of_range(info.encumbered_magnitude))?;
            allocation.current_magnitude = new_magnitude;
            allocation.effect_block = block;
            ModificationKind::InstantDeallocation
        };

        debug!(
            %operator,
            %operator_set,
            %strategy,
            new_magnitude,
            effect_block = allocation.effect_block,
            ?kind,
            "allocation modified"
        );
        state.ledger.store(operator, operator_set, strategy, info, allocation, &mut state.events);
        Ok(kind)
    }

    /// Brings every allocation of the strategy up to date before it is modified:
    /// drains the matured part of the deallocation queue, then writes back matured
    /// allocation increases in any set.
    fn settle_matured(&mut self, operator: Address, strategy: Address) -> AllocationResult<()> {
        let block = self.block_number;
        let state = &mut self.state;
        state.queues.clear_matured(
            &mut state.ledger,
            &mut state.events,
            operator,
            strategy,
            usize::MAX,
            block,
        )?;

        for (operator_set, allocation) in state.ledger.strategy_allocations(&operator, &strategy) {
            if !allocation.is_matured(block) || allocation.is_deallocation_pending() {
                continue;
            }
            let (info, allocation) =
                state.ledger.updated_allocation(&operator, &operator_set, &strategy, block)?;
            let events = &mut state.events;
            state.ledger.store(operator, operator_set, strategy, info, allocation, events);
        }
        Ok(())
    }
}
