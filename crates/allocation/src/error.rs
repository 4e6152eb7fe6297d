use alloy_primitives::Address;
use kunlun_primitives::{Entrypoint, OperatorSet};
use thiserror::Error;

use crate::clients::{DelegationError, RegistrarError};

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("{caller} cannot call {entrypoint} on behalf of {principal}")]
    Unauthorized { principal: Address, caller: Address, entrypoint: Entrypoint },

    #[error("{0} is not a registered operator")]
    InvalidOperator(Address),

    #[error("Allocation delay not set for operator {0}")]
    UninitializedAllocationDelay(Address),

    #[error("Input array length mismatch (strategies={strategies}, values={values})")]
    InputArrayLengthMismatch { strategies: usize, values: usize },

    #[error("Operator set {0} does not exist")]
    InvalidOperatorSet(OperatorSet),

    #[error("Operator set {0} already exists")]
    OperatorSetAlreadyExists(OperatorSet),

    #[error("Strategy {strategy} already in operator set {operator_set}")]
    StrategyAlreadyInOperatorSet { operator_set: OperatorSet, strategy: Address },

    #[error("Strategy {strategy} not in operator set {operator_set}")]
    StrategyNotInOperatorSet { operator_set: OperatorSet, strategy: Address },

    #[error("Operator set {operator_set} cannot hold more than {max} strategies")]
    MaxStrategiesExceeded { operator_set: OperatorSet, max: usize },

    #[error("Operator {operator} already registered for {operator_set}")]
    AlreadyMemberOfSet { operator: Address, operator_set: OperatorSet },

    #[error("Operator {operator} not registered for {operator_set}")]
    NotMemberOfSet { operator: Address, operator_set: OperatorSet },

    #[error("Modification already pending for {operator} in {operator_set} (strategy={strategy})")]
    ModificationAlreadyPending { operator: Address, operator_set: OperatorSet, strategy: Address },

    #[error("Magnitude of {operator} in {operator_set} is already {magnitude} (strategy={strategy})")]
    SameMagnitude { operator: Address, operator_set: OperatorSet, strategy: Address, magnitude: u64 },

    #[error(
        "Insufficient allocatable magnitude for {operator} (strategy={strategy}, allocatable={allocatable}, requested={requested})"
    )]
    InsufficientAllocatableMagnitude {
        operator: Address,
        strategy: Address,
        allocatable: u64,
        requested: u64,
    },

    #[error("Operator {operator} is not slashable for {operator_set}")]
    OperatorNotSlashable { operator: Address, operator_set: OperatorSet },

    #[error("Strategies must be in strictly ascending order")]
    StrategiesNotInAscendingOrder,

    #[error("Invalid wad to slash: {0}")]
    InvalidWadToSlash(u64),

    #[error("Magnitude {magnitude} cannot absorb diff {diff}")]
    MagnitudeOutOfRange { magnitude: u64, diff: i128 },

    #[error("Block number cannot go back (current={current}, requested={requested})")]
    BlockNumberRegression { current: u32, requested: u32 },

    #[error("Block {block} plus delay {delay} overflows")]
    BlockNumberOverflow { block: u32, delay: u32 },

    #[error("Registrar error: {0}")]
    Registrar(#[from] RegistrarError),

    #[error("Delegation error: {0}")]
    Delegation(#[from] DelegationError),
}

pub type AllocationResult<T> = Result<T, AllocationError>;
