//! In-process collaborators for hosts without an external delegation subsystem, and
//! for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use alloy_primitives::{Address, Bytes, U256};
use kunlun_primitives::Entrypoint;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{
    AvsRegistrar, DelegationError, DelegationLedger, DelegationResult, PermissionController,
    RegistrarError, RegistrarResult,
};

impl<T: DelegationLedger> DelegationLedger for Arc<T> {
    fn is_operator(&self, operator: &Address) -> bool {
        (**self).is_operator(operator)
    }

    fn operator_shares(&self, operator: &Address, strategies: &[Address]) -> Vec<U256> {
        (**self).operator_shares(operator, strategies)
    }

    fn slash_operator_shares(
        &self,
        operator: &Address,
        strategy: &Address,
        prev_max_magnitude: u64,
        new_max_magnitude: u64,
    ) -> DelegationResult<U256> {
        (**self).slash_operator_shares(operator, strategy, prev_max_magnitude, new_max_magnitude)
    }
}

impl<T: AvsRegistrar> AvsRegistrar for Arc<T> {
    fn register_operator(
        &self,
        operator: &Address,
        avs: &Address,
        operator_set_ids: &[u32],
        data: &Bytes,
    ) -> RegistrarResult<()> {
        (**self).register_operator(operator, avs, operator_set_ids, data)
    }

    fn deregister_operator(
        &self,
        operator: &Address,
        avs: &Address,
        operator_set_ids: &[u32],
    ) -> RegistrarResult<()> {
        (**self).deregister_operator(operator, avs, operator_set_ids)
    }
}

impl<T: PermissionController> PermissionController for Arc<T> {
    fn can_call(&self, principal: &Address, caller: &Address, entrypoint: Entrypoint) -> bool {
        (**self).can_call(principal, caller, entrypoint)
    }
}

/// Operator registry and share table kept in memory.
#[derive(Debug, Default)]
pub struct LocalDelegation {
    shares: RwLock<HashMap<Address, HashMap<Address, U256>>>,
}

impl LocalDelegation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_operator(&self, operator: Address) {
        self.shares.write().entry(operator).or_default();
    }

    /// Registers the operator if needed and sets its delegated shares in `strategy`.
    pub fn set_shares(&self, operator: Address, strategy: Address, shares: U256) {
        self.shares.write().entry(operator).or_default().insert(strategy, shares);
    }

    pub fn shares(&self, operator: &Address, strategy: &Address) -> U256 {
        self.shares
            .read()
            .get(operator)
            .and_then(|shares| shares.get(strategy))
            .copied()
            .unwrap_or_default()
    }
}

impl DelegationLedger for LocalDelegation {
    fn is_operator(&self, operator: &Address) -> bool {
        self.shares.read().contains_key(operator)
    }

    fn operator_shares(&self, operator: &Address, strategies: &[Address]) -> Vec<U256> {
        strategies.iter().map(|strategy| self.shares(operator, strategy)).collect()
    }

    fn slash_operator_shares(
        &self,
        operator: &Address,
        strategy: &Address,
        prev_max_magnitude: u64,
        new_max_magnitude: u64,
    ) -> DelegationResult<U256> {
        let mut shares = self.shares.write();
        let operator_shares =
            shares.get_mut(operator).ok_or(DelegationError::UnknownOperator(*operator))?;
        let Some(strategy_shares) = operator_shares.get_mut(strategy) else {
            return Ok(U256::ZERO);
        };
        if prev_max_magnitude == 0 {
            return Ok(U256::ZERO);
        }

        let lost = prev_max_magnitude.saturating_sub(new_max_magnitude);
        let slashed = *strategy_shares * U256::from(lost) / U256::from(prev_max_magnitude);
        *strategy_shares -= slashed;
        Ok(slashed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RegistrarCall {
    Register { operator: Address, avs: Address, operator_set_ids: Vec<u32> },
    Deregister { operator: Address, avs: Address, operator_set_ids: Vec<u32> },
}

/// Registrar that accepts everyone except explicitly rejected operators.
#[derive(Debug, Default)]
pub struct LocalRegistrar {
    rejected: RwLock<HashSet<Address>>,
    unavailable: RwLock<bool>,
    calls: RwLock<Vec<RegistrarCall>>,
}

impl LocalRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_operator(&self, operator: Address) {
        self.rejected.write().insert(operator);
    }

    pub fn accept_operator(&self, operator: &Address) {
        self.rejected.write().remove(operator);
    }

    /// Makes every hook call fail, as a reverting registrar would.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    pub fn calls(&self) -> Vec<RegistrarCall> {
        self.calls.read().clone()
    }
}

impl AvsRegistrar for LocalRegistrar {
    fn register_operator(
        &self,
        operator: &Address,
        avs: &Address,
        operator_set_ids: &[u32],
        _data: &Bytes,
    ) -> RegistrarResult<()> {
        self.calls.write().push(RegistrarCall::Register {
            operator: *operator,
            avs: *avs,
            operator_set_ids: operator_set_ids.to_vec(),
        });
        if *self.unavailable.read() {
            return Err(RegistrarError::Unavailable { msg: format!("registrar for {avs} is down") });
        }
        if self.rejected.read().contains(operator) {
            return Err(RegistrarError::Rejected {
                operator: *operator,
                reason: "operator not allowed".to_string(),
            });
        }
        Ok(())
    }

    fn deregister_operator(
        &self,
        operator: &Address,
        avs: &Address,
        operator_set_ids: &[u32],
    ) -> RegistrarResult<()> {
        self.calls.write().push(RegistrarCall::Deregister {
            operator: *operator,
            avs: *avs,
            operator_set_ids: operator_set_ids.to_vec(),
        });
        if *self.unavailable.read() {
            return Err(RegistrarError::Unavailable { msg: format!("registrar for {avs} is down") });
        }
        Ok(())
    }
}

/// Appointee grants per (principal, caller, entrypoint).
#[derive(Debug, Default)]
pub struct LocalPermissions {
    appointees: RwLock<HashSet<(Address, Address, Entrypoint)>>,
}

impl LocalPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_appointee(&self, principal: Address, appointee: Address, entrypoint: Entrypoint) {
        self.appointees.write().insert((principal, appointee, entrypoint));
    }

    pub fn remove_appointee(
        &self,
        principal: Address,
        appointee: Address,
        entrypoint: Entrypoint,
    ) {
        self.appointees.write().remove(&(principal, appointee, entrypoint));
    }
}

impl PermissionController for LocalPermissions {
    fn can_call(&self, principal: &Address, caller: &Address, entrypoint: Entrypoint) -> bool {
        self.appointees.read().contains(&(*principal, *caller, entrypoint))
    }
}
