use std::path::Path;

use alloy_primitives::{Address, Bytes, U256};
use eyre::{Result, WrapErr};
use kunlun_allocation::AllocationConfig;
use kunlun_primitives::{AllocateParams, CreateSetParams, Entrypoint};
use serde::{Deserialize, Serialize};

/// A replayable sequence of ledger calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<AllocationConfig>,
    #[serde(default)]
    pub operators: Vec<OperatorSpec>,
    pub steps: Vec<Step>,
    /// (operator, strategy) pairs summarised at the end of the run.
    #[serde(default)]
    pub report: Vec<ReportTarget>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&json).wrap_err_with(|| format!("invalid scenario {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSpec {
    pub address: Address,
    #[serde(default)]
    pub shares: Vec<ShareSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSpec {
    pub strategy: Address,
    pub shares: U256,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTarget {
    pub operator: Address,
    pub strategy: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Block the clock is advanced to before the action runs.
    pub block: u32,
    pub caller: Address,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    SetAllocationDelay {
        operator: Address,
        delay: u32,
    },
    ModifyAllocations {
        operator: Address,
        allocations: Vec<AllocateParams>,
    },
    ClearDeallocationQueue {
        operator: Address,
        strategies: Vec<Address>,
        nums_to_clear: Vec<usize>,
    },
    RegisterForOperatorSets {
        operator: Address,
        avs: Address,
        operator_set_ids: Vec<u32>,
        #[serde(default)]
        data: Bytes,
    },
    DeregisterFromOperatorSets {
        operator: Address,
        avs: Address,
        operator_set_ids: Vec<u32>,
    },
    CreateOperatorSets {
        avs: Address,
        sets: Vec<CreateSetParams>,
    },
    AddStrategiesToOperatorSet {
        avs: Address,
        operator_set_id: u32,
        strategies: Vec<Address>,
    },
    RemoveStrategiesFromOperatorSet {
        avs: Address,
        operator_set_id: u32,
        strategies: Vec<Address>,
    },
    SlashOperator {
        avs: Address,
        operator: Address,
        operator_set_id: u32,
        strategies: Vec<Address>,
        wads_to_slash: Vec<u64>,
        #[serde(default)]
        description: String,
    },
    /// Grants `appointee` the right to call `entrypoint` for `principal`.
    SetAppointee {
        principal: Address,
        appointee: Address,
        entrypoint: Entrypoint,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetAllocationDelay { .. } => "setAllocationDelay",
            Self::ModifyAllocations { .. } => "modifyAllocations",
            Self::ClearDeallocationQueue { .. } => "clearDeallocationQueue",
            Self::RegisterForOperatorSets { .. } => "registerForOperatorSets",
            Self::DeregisterFromOperatorSets { .. } => "deregisterFromOperatorSets",
            Self::CreateOperatorSets { .. } => "createOperatorSets",
            Self::AddStrategiesToOperatorSet { .. } => "addStrategiesToOperatorSet",
            Self::RemoveStrategiesFromOperatorSet { .. } => "removeStrategiesFromOperatorSet",
            Self::SlashOperator { .. } => "slashOperator",
            Self::SetAppointee { .. } => "setAppointee",
        }
    }
}
