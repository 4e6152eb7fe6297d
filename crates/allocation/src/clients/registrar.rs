use alloy_primitives::{Address, Bytes};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RegistrarError {
    #[error("registrar rejected operator {operator}: {reason}")]
    Rejected { operator: Address, reason: String },

    #[error("registrar unavailable: {msg}")]
    Unavailable { msg: String },
}

pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Hooks an AVS uses to accept or observe membership changes.
#[cfg_attr(test, mockall::automock)]
pub trait AvsRegistrar {
    fn register_operator(
        &self,
        operator: &Address,
        avs: &Address,
        operator_set_ids: &[u32],
        data: &Bytes,
    ) -> RegistrarResult<()>;

    fn deregister_operator(
        &self,
        operator: &Address,
        avs: &Address,
        operator_set_ids: &[u32],
    ) -> RegistrarResult<()>;
}
