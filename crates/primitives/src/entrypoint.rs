use std::fmt;

use serde::{Deserialize, Serialize};

/// Mutating entrypoints that can be delegated to an appointee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Entrypoint {
    SetAllocationDelay,
    ModifyAllocations,
    RegisterForOperatorSets,
    DeregisterFromOperatorSets,
    CreateOperatorSets,
    AddStrategiesToOperatorSet,
    RemoveStrategiesFromOperatorSet,
    SlashOperator,
}

impl Entrypoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetAllocationDelay => "setAllocationDelay",
            Self::ModifyAllocations => "modifyAllocations",
            Self::RegisterForOperatorSets => "registerForOperatorSets",
            Self::DeregisterFromOperatorSets => "deregisterFromOperatorSets",
            Self::CreateOperatorSets => "createOperatorSets",
            Self::AddStrategiesToOperatorSet => "addStrategiesToOperatorSet",
            Self::RemoveStrategiesFromOperatorSet => "removeStrategiesFromOperatorSet",
            Self::SlashOperator => "slashOperator",
        }
    }
}

impl fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
