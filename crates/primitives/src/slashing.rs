use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashingParams {
    pub operator: Address,
    pub operator_set_id: u32,
    /// Must be strictly ascending.
    pub strategies: Vec<Address>,
    /// Fraction of the current allocation to slash per strategy, in WAD.
    pub wads_to_slash: Vec<u64>,
    #[serde(default)]
    pub description: String,
}

/// What a single strategy leg of a slash removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySlash {
    pub strategy: Address,
    pub slashed_magnitude: u64,
    pub slashed_shares: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashOutcome {
    pub slash_id: u64,
    /// Legs with a zero allocation are absent.
    pub slashes: Vec<StrategySlash>,
}

impl SlashOutcome {
    pub fn total_slashed_magnitude(&self) -> u64 {
        self.slashes.iter().map(|slash| slash.slashed_magnitude).sum()
    }
}
