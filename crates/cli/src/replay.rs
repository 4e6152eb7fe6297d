use std::sync::Arc;

use alloy_primitives::{Address, U256};
use eyre::{eyre, Result};
use kunlun_allocation::{
    clients::local::{LocalDelegation, LocalPermissions, LocalRegistrar},
    AllocationConfig, AllocationManager, AllocationResult,
};
use kunlun_primitives::{
    log_util::log_error, Allocation, DeregisterParams, LedgerEvent, OperatorSet, RegisterParams,
    SlashOutcome, SlashingParams,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::scenario::{Action, ReportTarget, Scenario, Step};

type LocalManager =
    AllocationManager<Arc<LocalDelegation>, Arc<LocalRegistrar>, Arc<LocalPermissions>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub block: u32,
    pub action: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slash: Option<SlashOutcome>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAllocation {
    pub operator_set: OperatorSet,
    pub allocation: Allocation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorReport {
    pub operator: Address,
    pub strategy: Address,
    pub shares: U256,
    pub max_magnitude: u64,
    pub encumbered_magnitude: u64,
    pub allocatable_magnitude: u64,
    pub allocations: Vec<SetAllocation>,
    pub deallocation_queue: Vec<OperatorSet>,
    pub registered_sets: Vec<OperatorSet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub final_block: u32,
    pub steps: Vec<StepReport>,
    pub operators: Vec<OperatorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<LedgerEvent>>,
}

impl Report {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|step| !step.ok).count()
    }
}

/// Drives an [`AllocationManager`] backed by the in-memory collaborators through a
/// scenario.
pub struct Replayer {
    manager: LocalManager,
    delegation: Arc<LocalDelegation>,
    permissions: Arc<LocalPermissions>,
    fail_fast: bool,
}

impl Replayer {
    pub fn new(config: AllocationConfig, scenario: &Scenario, fail_fast: bool) -> Self {
        let delegation = Arc::new(LocalDelegation::new());
        for operator in &scenario.operators {
            delegation.register_operator(operator.address);
            for share in &operator.shares {
                delegation.set_shares(operator.address, share.strategy, share.shares);
            }
        }
        let permissions = Arc::new(LocalPermissions::new());
        let manager = AllocationManager::new(
            config,
            delegation.clone(),
            Arc::new(LocalRegistrar::new()),
            permissions.clone(),
        );
        Self { manager, delegation, permissions, fail_fast }
    }

    pub fn run(mut self, scenario: &Scenario, with_events: bool) -> Result<Report> {
        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            steps.push(self.step(index, step)?);
        }

        let operators =
            scenario.report.iter().map(|target| self.operator_report(target)).collect();
        let events = with_events.then(|| self.manager.take_events());
        let report =
            Report { final_block: self.manager.block_number(), steps, operators, events };
        info!(steps = report.steps.len(), failed = report.failed_steps(), "scenario replayed");
        Ok(report)
    }

    fn step(&mut self, index: usize, step: &Step) -> Result<StepReport> {
        self.manager.set_block_number(step.block)?;
        let action = step.action.name();
        debug!(index, block = step.block, caller = %step.caller, action, "replaying step");

        let result = self.apply(step.caller, &step.action);
        let error = result.as_ref().err().map(ToString::to_string);
        if let (Some(error), true) = (&error, self.fail_fast) {
            return Err(eyre!("step {index} ({action}) at block {} failed: {error}", step.block));
        }
        let slash = log_error(result, &format!("step {index} ({action}) failed")).flatten();

        Ok(StepReport { index, block: step.block, action, ok: error.is_none(), error, slash })
    }

    fn apply(
        &mut self,
        caller: Address,
        action: &Action,
    ) -> AllocationResult<Option<SlashOutcome>> {
        let manager = &mut self.manager;
        match action {
            Action::SetAllocationDelay { operator, delay } => {
                manager.set_allocation_delay(caller, *operator, *delay)?;
            }
            Action::ModifyAllocations { operator, allocations } => {
                manager.modify_allocations(caller, *operator, allocations)?;
            }
            Action::ClearDeallocationQueue { operator, strategies, nums_to_clear } => {
                manager.clear_deallocation_queue(*operator, strategies, nums_to_clear)?;
            }
            Action::RegisterForOperatorSets { operator, avs, operator_set_ids, data } => {
                let params = RegisterParams {
                    avs: *avs,
                    operator_set_ids: operator_set_ids.clone(),
                    data: data.clone(),
                };
                manager.register_for_operator_sets(caller, *operator, &params)?;
            }
            Action::DeregisterFromOperatorSets { operator, avs, operator_set_ids } => {
                let params = DeregisterParams {
                    operator: *operator,
                    avs: *avs,
                    operator_set_ids: operator_set_ids.clone(),
                };
                manager.deregister_from_operator_sets(caller, &params)?;
            }
            Action::CreateOperatorSets { avs, sets } => {
                manager.create_operator_sets(caller, *avs, sets)?;
            }
            Action::AddStrategiesToOperatorSet { avs, operator_set_id, strategies } => {
                manager.add_strategies_to_operator_set(
                    caller,
                    *avs,
                    *operator_set_id,
                    strategies,
                )?;
            }
            Action::RemoveStrategiesFromOperatorSet { avs, operator_set_id, strategies } => {
                manager.remove_strategies_from_operator_set(
                    caller,
                    *avs,
                    *operator_set_id,
                    strategies,
                )?;
            }
            Action::SlashOperator {
                avs,
                operator,
                operator_set_id,
                strategies,
                wads_to_slash,
                description,
            } => {
                let params = SlashingParams {
                    operator: *operator,
                    operator_set_id: *operator_set_id,
                    strategies: strategies.clone(),
                    wads_to_slash: wads_to_slash.clone(),
                    description: description.clone(),
                };
                return manager.slash_operator(caller, *avs, &params).map(Some);
            }
            Action::SetAppointee { principal, appointee, entrypoint } => {
                self.permissions.set_appointee(*principal, *appointee, *entrypoint);
            }
        }
        Ok(None)
    }

    fn operator_report(&self, target: &ReportTarget) -> OperatorReport {
        let ReportTarget { operator, strategy } = target;
        let manager = &self.manager;
        OperatorReport {
            operator: *operator,
            strategy: *strategy,
            shares: self.delegation.shares(operator, strategy),
            max_magnitude: manager.max_magnitudes(operator, &[*strategy])[0],
            encumbered_magnitude: manager.encumbered_magnitude(operator, strategy),
            allocatable_magnitude: manager.allocatable_magnitude(operator, strategy),
            allocations: manager
                .strategy_allocations(operator, strategy)
                .into_iter()
                .map(|(operator_set, allocation)| SetAllocation { operator_set, allocation })
                .collect(),
            deallocation_queue: manager.deallocation_queue(operator, strategy),
            registered_sets: manager.registered_sets(operator),
        }
    }
}
