use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::OperatorSet;

/// Audit trail entry for every committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LedgerEvent {
    AllocationDelaySet {
        operator: Address,
        delay: u32,
        effect_block: u32,
    },
    AllocationUpdated {
        operator: Address,
        operator_set: OperatorSet,
        strategy: Address,
        /// Magnitude once the pending change completes.
        magnitude: u64,
        effect_block: u32,
    },
    EncumberedMagnitudeUpdated {
        operator: Address,
        strategy: Address,
        encumbered_magnitude: u64,
    },
    MaxMagnitudeUpdated {
        operator: Address,
        strategy: Address,
        max_magnitude: u64,
    },
    OperatorSlashed {
        operator: Address,
        operator_set: OperatorSet,
        strategies: Vec<Address>,
        wads_slashed: Vec<u64>,
        description: String,
        slash_id: u64,
    },
    OperatorSetCreated {
        operator_set: OperatorSet,
    },
    StrategyAddedToOperatorSet {
        operator_set: OperatorSet,
        strategy: Address,
    },
    StrategyRemovedFromOperatorSet {
        operator_set: OperatorSet,
        strategy: Address,
    },
    OperatorAddedToOperatorSet {
        operator: Address,
        operator_set: OperatorSet,
    },
    OperatorRemovedFromOperatorSet {
        operator: Address,
        operator_set: OperatorSet,
    },
}
