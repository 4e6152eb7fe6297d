use alloy_primitives::Address;
use kunlun_primitives::{
    log_util::log_tolerated, DeregisterParams, Entrypoint, OperatorSet, RegisterParams,
};
use tracing::info;

use crate::{
    clients::{AvsRegistrar, DelegationLedger, PermissionController},
    error::{AllocationError, AllocationResult},
    manager::{after_delay, AllocationManager},
    metrics::AllocationMetrics,
};

impl<D, R, P> AllocationManager<D, R, P>
where
    D: DelegationLedger,
    R: AvsRegistrar,
    P: PermissionController,
{
    /// Registers the operator for operator sets of one AVS. The AVS registrar is
    /// consulted last and may veto the whole registration.
    pub fn register_for_operator_sets(
        &mut self,
        caller: Address,
        operator: Address,
        params: &RegisterParams,
    ) -> AllocationResult<()> {
        self.check_can_call(operator, caller, Entrypoint::RegisterForOperatorSets)?;
        if !self.delegation.is_operator(&operator) {
            return Err(AllocationError::InvalidOperator(operator));
        }

        self.atomically(|manager| {
            let state = &mut manager.state;
            for operator_set_id in &params.operator_set_ids {
                let operator_set = OperatorSet::new(params.avs, *operator_set_id);
                state.operator_sets.mark_registered(operator, operator_set, &mut state.events)?;
            }
            manager.registrar.register_operator(
                &operator,
                &params.avs,
                &params.operator_set_ids,
                &params.data,
            )?;
            Ok(())
        })?;

        for _ in &params.operator_set_ids {
            AllocationMetrics::registration("register");
        }
        info!(%operator, avs = %params.avs, sets = ?params.operator_set_ids, "operator registered");
        Ok(())
    }

    /// Removes the operator from operator sets. Either the operator or the AVS may
    /// call this. The operator stays slashable for the deallocation delay, and a
    /// failing registrar hook does not undo the deregistration.
    pub fn deregister_from_operator_sets(
        &mut self,
        caller: Address,
        params: &DeregisterParams,
    ) -> AllocationResult<()> {
        let operator = params.operator;
        self.check_can_call(operator, caller, Entrypoint::DeregisterFromOperatorSets).or_else(
            |_| self.check_can_call(params.avs, caller, Entrypoint::DeregisterFromOperatorSets),
        )?;

        let slashable_until = after_delay(self.block_number, self.config.deallocation_delay)?;
        self.atomically(|manager| {
            let state = &mut manager.state;
            for operator_set_id in &params.operator_set_ids {
                let operator_set = OperatorSet::new(params.avs, *operator_set_id);
                state.operator_sets.mark_deregistered(
                    operator,
                    operator_set,
                    slashable_until,
                    &mut state.events,
                )?;
            }
            Ok(())
        })?;

        for _ in &params.operator_set_ids {
            AllocationMetrics::registration("deregister");
        }
        let hook =
            self.registrar.deregister_operator(&operator, &params.avs, &params.operator_set_ids);
        if log_tolerated(hook, "deregistration hook failed") {
            AllocationMetrics::registrar_failure_ignored();
        }
        info!(
            %operator,
            avs = %params.avs,
            sets = ?params.operator_set_ids,
            slashable_until,
            "operator deregistered"
        );
        Ok(())
    }
}
