use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{magnitude::add_signed, OperatorSet, WAD};

/// Allocation of one (operator, strategy, operator set) tuple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Magnitude that is active and slashable.
    pub current_magnitude: u64,
    /// Positive for a pending allocation, negative for a pending deallocation.
    pub pending_diff: i128,
    /// Block at which `pending_diff` completes.
    pub effect_block: u32,
}

impl Allocation {
    pub const fn new(current_magnitude: u64, pending_diff: i128, effect_block: u32) -> Self {
        Self { current_magnitude, pending_diff, effect_block }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_diff != 0
    }

    pub fn is_deallocation_pending(&self) -> bool {
        self.pending_diff < 0
    }

    pub fn is_matured(&self, block: u32) -> bool {
        self.is_pending() && block >= self.effect_block
    }

    /// Both the current and the pending magnitude are zero.
    pub fn is_empty(&self) -> bool {
        self.current_magnitude == 0 && self.pending_diff == 0
    }

    /// Magnitude the tuple settles at once the pending change completes.
    pub fn target_magnitude(&self) -> u64 {
        add_signed(self.current_magnitude, self.pending_diff).unwrap_or_default()
    }

    /// Completes a matured pending change, returning the diff that was applied.
    pub fn complete(&mut self, block: u32) -> Option<i128> {
        if !self.is_matured(block) {
            return None;
        }
        let diff = self.pending_diff;
        self.current_magnitude = self.target_magnitude();
        self.pending_diff = 0;
        Some(diff)
    }
}

/// Per (operator, strategy) capacity bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInfo {
    pub max_magnitude: u64,
    pub encumbered_magnitude: u64,
}

impl StrategyInfo {
    pub const fn new(max_magnitude: u64, encumbered_magnitude: u64) -> Self {
        Self { max_magnitude, encumbered_magnitude }
    }

    pub fn allocatable_magnitude(&self) -> u64 {
        self.max_magnitude.saturating_sub(self.encumbered_magnitude)
    }
}

impl Default for StrategyInfo {
    fn default() -> Self {
        Self::new(WAD, 0)
    }
}

/// Requested magnitudes for a list of strategies within one operator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateParams {
    pub operator_set: OperatorSet,
    pub strategies: Vec<Address>,
    pub new_magnitudes: Vec<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDelayInfo {
    pub delay: u32,
    pub pending_delay: u32,
    pub effect_block: u32,
    pub is_set: bool,
}

impl AllocationDelayInfo {
    pub fn has_matured_pending(&self, block: u32) -> bool {
        self.effect_block != 0 && block >= self.effect_block
    }

    /// `(is_set, delay)` as seen at `block`, with a matured pending delay taking effect.
    pub fn resolve(&self, block: u32) -> (bool, u32) {
        if self.has_matured_pending(block) {
            (true, self.pending_delay)
        } else {
            (self.is_set, self.delay)
        }
    }
}
