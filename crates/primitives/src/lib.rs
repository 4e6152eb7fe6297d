mod allocation;
mod entrypoint;
mod event;
pub mod log_util;
pub mod magnitude;
mod operator_set;
mod registration;
mod slashing;

pub use allocation::{AllocateParams, Allocation, AllocationDelayInfo, StrategyInfo};
pub use entrypoint::Entrypoint;
pub use event::LedgerEvent;
pub use magnitude::WAD;
pub use operator_set::{CreateSetParams, OperatorSet};
pub use registration::{DeregisterParams, RegisterParams, RegistrationStatus};
pub use slashing::{SlashOutcome, SlashingParams, StrategySlash};
