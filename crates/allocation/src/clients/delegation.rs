use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DelegationError {
    #[error("unknown operator {0}")]
    UnknownOperator(Address),

    #[error("share slashing failed: {msg}")]
    SlashFailed { msg: String },
}

pub type DelegationResult<T> = Result<T, DelegationError>;

/// Share ledger owned by the delegation subsystem.
#[cfg_attr(test, mockall::automock)]
pub trait DelegationLedger {
    fn is_operator(&self, operator: &Address) -> bool;

    /// Delegated shares of `operator`, one entry per strategy.
    fn operator_shares(&self, operator: &Address, strategies: &[Address]) -> Vec<U256>;

    /// Burns the share loss implied by the max magnitude moving from `prev_max_magnitude`
    /// to `new_max_magnitude`, returning the shares slashed.
    fn slash_operator_shares(
        &self,
        operator: &Address,
        strategy: &Address,
        prev_max_magnitude: u64,
        new_max_magnitude: u64,
    ) -> DelegationResult<U256>;
}
