pub mod clients;
pub mod config;
mod delay;
mod error;
mod events;
mod journal;
mod ledger;
mod manager;
pub mod metrics;
mod operator_sets;
mod queue;
mod state;

mod allocation;
mod registration;
mod slashing;
mod views;

pub use config::AllocationConfig;
pub use error::{AllocationError, AllocationResult};
pub use manager::AllocationManager;
