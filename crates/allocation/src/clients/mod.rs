mod delegation;
pub mod local;
mod permissions;
mod registrar;

pub use delegation::{DelegationError, DelegationLedger, DelegationResult};
pub use permissions::PermissionController;
pub use registrar::{AvsRegistrar, RegistrarError, RegistrarResult};

#[cfg(test)]
pub use delegation::MockDelegationLedger;
#[cfg(test)]
pub use permissions::MockPermissionController;
#[cfg(test)]
pub use registrar::MockAvsRegistrar;
