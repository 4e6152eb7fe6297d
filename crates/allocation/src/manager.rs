use alloy_primitives::Address;
use kunlun_primitives::{
    AllocationDelayInfo, CreateSetParams, Entrypoint, LedgerEvent, OperatorSet,
};
use tracing::info;

use crate::{
    clients::{AvsRegistrar, DelegationLedger, PermissionController},
    config::AllocationConfig,
    error::{AllocationError, AllocationResult},
    journal::Checkpoint,
    state::AllocationState,
};

/// `block + delay`, failing instead of wrapping.
pub(crate) fn after_delay(block: u32, delay: u32) -> AllocationResult<u32> {
    block.checked_add(delay).ok_or(AllocationError::BlockNumberOverflow { block, delay })
}

/// Entry point of the accounting core. Every mutating call is atomic: it either
/// commits all of its effects or none of them.
#[derive(Debug)]
pub struct AllocationManager<D, R, P> {
    pub(crate) config: AllocationConfig,
    pub(crate) block_number: u32,
    pub(crate) state: AllocationState,
    pub(crate) delegation: D,
    pub(crate) registrar: R,
    pub(crate) permissions: P,
}

impl<D, R, P> AllocationManager<D, R, P>
where
    D: DelegationLedger,
    R: AvsRegistrar,
    P: PermissionController,
{
    pub fn new(config: AllocationConfig, delegation: D, registrar: R, permissions: P) -> Self {
        Self {
            state: AllocationState::new(&config),
            config,
            block_number: 0,
            delegation,
            registrar,
            permissions,
        }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    pub fn block_number(&self) -> u32 {
        self.block_number
    }

    pub fn set_block_number(&mut self, block: u32) -> AllocationResult<()> {
        if block < self.block_number {
            return Err(AllocationError::BlockNumberRegression {
                current: self.block_number,
                requested: block,
            });
        }
        self.block_number = block;
        Ok(())
    }

    pub fn delegation(&self) -> &D {
        &self.delegation
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn permissions(&self) -> &P {
        &self.permissions
    }

    /// Drains the events of every committed call so far.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.state.events.take()
    }

    pub(crate) fn check_can_call(
        &self,
        principal: Address,
        caller: Address,
        entrypoint: Entrypoint,
    ) -> AllocationResult<()> {
        if principal == caller || self.permissions.can_call(&principal, &caller, entrypoint) {
            return Ok(());
        }
        Err(AllocationError::Unauthorized { principal, caller, entrypoint })
    }

    /// Runs `f` against a checkpoint of the state, reverting every write if it fails.
    pub(crate) fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> AllocationResult<T>,
    ) -> AllocationResult<T> {
        self.state.checkpoint();
        let result = f(self);
        match result {
            Ok(_) => self.state.commit(),
            Err(_) => self.state.revert(),
        }
        result
    }

    pub fn set_allocation_delay(
        &mut self,
        caller: Address,
        operator: Address,
        delay: u32,
    ) -> AllocationResult<AllocationDelayInfo> {
        self.check_can_call(operator, caller, Entrypoint::SetAllocationDelay)?;
        if !self.delegation.is_operator(&operator) {
            return Err(AllocationError::InvalidOperator(operator));
        }

        let block = self.block_number;
        let info = self.atomically(|manager| {
            let state = &mut manager.state;
            state.delays.set_delay(operator, delay, block, &mut state.events)
        })?;
        info!(%operator, delay, effect_block = info.effect_block, "allocation delay set");
        Ok(info)
    }

    pub fn create_operator_sets(
        &mut self,
        caller: Address,
        avs: Address,
        params: &[CreateSetParams],
    ) -> AllocationResult<()> {
        self.check_can_call(avs, caller, Entrypoint::CreateOperatorSets)?;
        self.atomically(|manager| {
            let state = &mut manager.state;
            for param in params {
                let operator_set = OperatorSet::new(avs, param.operator_set_id);
                state.operator_sets.create(operator_set, &param.strategies, &mut state.events)?;
            }
            Ok(())
        })?;
        info!(%avs, count = params.len(), "operator sets created");
        Ok(())
    }

    pub fn add_strategies_to_operator_set(
        &mut self,
        caller: Address,
        avs: Address,
        operator_set_id: u32,
        strategies: &[Address],
    ) -> AllocationResult<()> {
        self.check_can_call(avs, caller, Entrypoint::AddStrategiesToOperatorSet)?;
        let operator_set = OperatorSet::new(avs, operator_set_id);
        self.atomically(|manager| {
            let state = &mut manager.state;
            state.operator_sets.add_strategies(operator_set, strategies, &mut state.events)
        })?;
        info!(%operator_set, count = strategies.len(), "strategies added");
        Ok(())
    }

    pub fn remove_strategies_from_operator_set(
        &mut self,
        caller: Address,
        avs: Address,
        operator_set_id: u32,
        strategies: &[Address],
    ) -> AllocationResult<()> {
        self.check_can_call(avs, caller, Entrypoint::RemoveStrategiesFromOperatorSet)?;
        let operator_set = OperatorSet::new(avs, operator_set_id);
        self.atomically(|manager| {
            let state = &mut manager.state;
            state.operator_sets.remove_strategies(operator_set, strategies, &mut state.events)
        })?;
        info!(%operator_set, count = strategies.len(), "strategies removed");
        Ok(())
    }
}
