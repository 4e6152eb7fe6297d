use std::collections::BTreeSet;

use alloy_primitives::Address;
use kunlun_primitives::{LedgerEvent, OperatorSet, RegistrationStatus};

use crate::{
    error::{AllocationError, AllocationResult},
    events::EventLog,
    journal::{Checkpoint, JournaledMap},
};

/// Operator sets per AVS, their slashable strategies and their members.
#[derive(Debug)]
pub struct OperatorSetRegistry {
    /// Set ids per AVS.
    avs_sets: JournaledMap<Address, BTreeSet<u32>>,
    strategies: JournaledMap<OperatorSet, BTreeSet<Address>>,
    members: JournaledMap<OperatorSet, BTreeSet<Address>>,
    registration: JournaledMap<(Address, OperatorSet), RegistrationStatus>,
    registered_sets: JournaledMap<Address, BTreeSet<OperatorSet>>,
    slash_ids: JournaledMap<OperatorSet, u64>,
    max_strategies: usize,
}

impl OperatorSetRegistry {
    pub fn new(max_strategies: usize) -> Self {
        Self {
            avs_sets: JournaledMap::new(),
            strategies: JournaledMap::new(),
            members: JournaledMap::new(),
            registration: JournaledMap::new(),
            registered_sets: JournaledMap::new(),
            slash_ids: JournaledMap::new(),
            max_strategies,
        }
    }

    pub fn is_operator_set(&self, operator_set: &OperatorSet) -> bool {
        self.strategies.contains_key(operator_set)
    }

    pub fn ensure_exists(&self, operator_set: &OperatorSet) -> AllocationResult<()> {
        if !self.is_operator_set(operator_set) {
            return Err(AllocationError::InvalidOperatorSet(*operator_set));
        }
        Ok(())
    }

    pub fn create(
        &mut self,
        operator_set: OperatorSet,
        strategies: &[Address],
        events: &mut EventLog,
    ) -> AllocationResult<()> {
        if self.is_operator_set(&operator_set) {
            return Err(AllocationError::OperatorSetAlreadyExists(operator_set));
        }
        self.avs_sets.get_mut_or_default(operator_set.avs).insert(operator_set.id);
        self.strategies.insert(operator_set, BTreeSet::new());
        events.emit(LedgerEvent::OperatorSetCreated { operator_set });
        self.add_strategies(operator_set, strategies, events)
    }

    pub fn add_strategies(
        &mut self,
        operator_set: OperatorSet,
        strategies: &[Address],
        events: &mut EventLog,
    ) -> AllocationResult<()> {
        self.ensure_exists(&operator_set)?;
        let max = self.max_strategies;
        for strategy in strategies {
            let set_strategies = self.strategies.get_mut_or_default(operator_set);
            if !set_strategies.insert(*strategy) {
                return Err(AllocationError::StrategyAlreadyInOperatorSet {
                    operator_set,
                    strategy: *strategy,
                });
            }
            if set_strategies.len() > max {
                return Err(AllocationError::MaxStrategiesExceeded { operator_set, max });
            }
            events.emit(LedgerEvent::StrategyAddedToOperatorSet {
                operator_set,
                strategy: *strategy,
            });
        }
        Ok(())
    }

    pub fn remove_strategies(
        &mut self,
        operator_set: OperatorSet,
        strategies: &[Address],
        events: &mut EventLog,
    ) -> AllocationResult<()> {
        self.ensure_exists(&operator_set)?;
        for strategy in strategies {
            if !self.strategies.get_mut_or_default(operator_set).remove(strategy) {
                return Err(AllocationError::StrategyNotInOperatorSet {
                    operator_set,
                    strategy: *strategy,
                });
            }
            events.emit(LedgerEvent::StrategyRemovedFromOperatorSet {
                operator_set,
                strategy: *strategy,
            });
        }
        Ok(())
    }

    pub fn mark_registered(
        &mut self,
        operator: Address,
        operator_set: OperatorSet,
        events: &mut EventLog,
    ) -> AllocationResult<()> {
        self.ensure_exists(&operator_set)?;
        if self.registration_status(&operator, &operator_set).is_registered() {
            return Err(AllocationError::AlreadyMemberOfSet { operator, operator_set });
        }
        self.registration.insert((operator, operator_set), RegistrationStatus::Registered);
        self.members.get_mut_or_default(operator_set).insert(operator);
        self.registered_sets.get_mut_or_default(operator).insert(operator_set);
        events.emit(LedgerEvent::OperatorAddedToOperatorSet { operator, operator_set });
        Ok(())
    }

    pub fn mark_deregistered(
        &mut self,
        operator: Address,
        operator_set: OperatorSet,
        slashable_until: u32,
        events: &mut EventLog,
    ) -> AllocationResult<()> {
        self.ensure_exists(&operator_set)?;
        if !self.registration_status(&operator, &operator_set).is_registered() {
            return Err(AllocationError::NotMemberOfSet { operator, operator_set });
        }
        self.registration
            .insert((operator, operator_set), RegistrationStatus::Deregistered { slashable_until });
        self.members.get_mut_or_default(operator_set).remove(&operator);
        self.registered_sets.get_mut_or_default(operator).remove(&operator_set);
        events.emit(LedgerEvent::OperatorRemovedFromOperatorSet { operator, operator_set });
        Ok(())
    }

    /// Increments and returns the slash counter of the set.
    pub fn next_slash_id(&mut self, operator_set: OperatorSet) -> u64 {
        let slash_id = self.slash_ids.get_mut_or_default(operator_set);
        *slash_id += 1;
        *slash_id
    }

    pub fn slash_count(&self, operator_set: &OperatorSet) -> u64 {
        self.slash_ids.get(operator_set).copied().unwrap_or_default()
    }

    pub fn operator_sets(&self, avs: &Address) -> Vec<OperatorSet> {
        self.avs_sets
            .get(avs)
            .map(|ids| ids.iter().map(|id| OperatorSet::new(*avs, *id)).collect())
            .unwrap_or_default()
    }

    pub fn operator_set_count(&self, avs: &Address) -> usize {
        self.avs_sets.get(avs).map(BTreeSet::len).unwrap_or_default()
    }

    pub fn strategies(&self, operator_set: &OperatorSet) -> Vec<Address> {
        self.strategies
            .get(operator_set)
            .map(|strategies| strategies.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains_strategy(&self, operator_set: &OperatorSet, strategy: &Address) -> bool {
        self.strategies.get(operator_set).is_some_and(|strategies| strategies.contains(strategy))
    }

    pub fn members(&self, operator_set: &OperatorSet) -> Vec<Address> {
        self.members
            .get(operator_set)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, operator_set: &OperatorSet) -> usize {
        self.members.get(operator_set).map(BTreeSet::len).unwrap_or_default()
    }

    pub fn is_member(&self, operator: &Address, operator_set: &OperatorSet) -> bool {
        self.registration_status(operator, operator_set).is_registered()
    }

    pub fn registered_sets(&self, operator: &Address) -> Vec<OperatorSet> {
        self.registered_sets
            .get(operator)
            .map(|sets| sets.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn registration_status(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
    ) -> RegistrationStatus {
        self.registration.get(&(*operator, *operator_set)).copied().unwrap_or_default()
    }

    pub fn is_operator_slashable(
        &self,
        operator: &Address,
        operator_set: &OperatorSet,
        block: u32,
    ) -> bool {
        self.registration_status(operator, operator_set).is_slashable(block)
    }
}

impl Checkpoint for OperatorSetRegistry {
    fn checkpoint(&mut self) {
        self.avs_sets.checkpoint();
        self.strategies.checkpoint();
        self.members.checkpoint();
        self.registration.checkpoint();
        self.registered_sets.checkpoint();
        self.slash_ids.checkpoint();
    }

    fn commit(&mut self) {
        self.avs_sets.commit();
        self.strategies.commit();
        self.members.commit();
        self.registration.commit();
        self.registered_sets.commit();
        self.slash_ids.commit();
    }

    fn revert(&mut self) {
        self.avs_sets.revert();
        self.strategies.revert();
        self.members.revert();
        self.registration.revert();
        self.registered_sets.revert();
        self.slash_ids.revert();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const OPERATOR: Address = address!("0x0000777735367b36bC9B61C50022d9D0700dB4Ec");
    const AVS: Address = address!("0x00000000000000000000000000000000000000aa");
    const STRATEGY_A: Address = address!("0x00000000000000000000000000000000000005a1");
    const STRATEGY_B: Address = address!("0x00000000000000000000000000000000000005b2");

    fn registry_with_set() -> (OperatorSetRegistry, OperatorSet, EventLog) {
        let mut registry = OperatorSetRegistry::new(2);
        let mut events = EventLog::default();
        let operator_set = OperatorSet::new(AVS, 1);
        registry.create(operator_set, &[STRATEGY_A], &mut events).unwrap();
        (registry, operator_set, events)
    }

    #[test]
    fn create_rejects_taken_id() {
        let (mut registry, operator_set, mut events) = registry_with_set();
        let err = registry.create(operator_set, &[], &mut events).unwrap_err();
        assert_eq!(err, AllocationError::OperatorSetAlreadyExists(operator_set));
        assert_eq!(registry.operator_set_count(&AVS), 1);
        assert_eq!(registry.operator_sets(&AVS), vec![operator_set]);
    }

    #[test]
    fn strategies_cannot_be_added_twice_or_removed_when_absent() {
        let (mut registry, operator_set, mut events) = registry_with_set();
        let err = registry.add_strategies(operator_set, &[STRATEGY_A], &mut events).unwrap_err();
        assert_eq!(
            err,
            AllocationError::StrategyAlreadyInOperatorSet { operator_set, strategy: STRATEGY_A }
        );

        let err = registry.remove_strategies(operator_set, &[STRATEGY_B], &mut events).unwrap_err();
        assert_eq!(
            err,
            AllocationError::StrategyNotInOperatorSet { operator_set, strategy: STRATEGY_B }
        );

        registry.add_strategies(operator_set, &[STRATEGY_B], &mut events).unwrap();
        assert_eq!(registry.strategies(&operator_set), vec![STRATEGY_A, STRATEGY_B]);
        registry.remove_strategies(operator_set, &[STRATEGY_A], &mut events).unwrap();
        assert!(!registry.contains_strategy(&operator_set, &STRATEGY_A));
    }

    #[test]
    fn strategy_list_is_bounded() {
        let (mut registry, operator_set, mut events) = registry_with_set();
        let extra = address!("0x00000000000000000000000000000000000005c3");
        let err =
            registry.add_strategies(operator_set, &[STRATEGY_B, extra], &mut events).unwrap_err();
        assert_eq!(err, AllocationError::MaxStrategiesExceeded { operator_set, max: 2 });
    }

    #[test]
    fn deregistration_opens_grace_window() {
        let (mut registry, operator_set, mut events) = registry_with_set();
        registry.mark_registered(OPERATOR, operator_set, &mut events).unwrap();
        assert!(registry.is_member(&OPERATOR, &operator_set));
        assert_eq!(registry.members(&operator_set), vec![OPERATOR]);

        let err = registry.mark_registered(OPERATOR, operator_set, &mut events).unwrap_err();
        assert_eq!(err, AllocationError::AlreadyMemberOfSet { operator: OPERATOR, operator_set });

        registry.mark_deregistered(OPERATOR, operator_set, 110, &mut events).unwrap();
        assert_eq!(registry.member_count(&operator_set), 0);
        assert!(registry.registered_sets(&OPERATOR).is_empty());
        assert!(registry.is_operator_slashable(&OPERATOR, &operator_set, 110));
        assert!(!registry.is_operator_slashable(&OPERATOR, &operator_set, 111));

        let err = registry.mark_deregistered(OPERATOR, operator_set, 120, &mut events).unwrap_err();
        assert_eq!(err, AllocationError::NotMemberOfSet { operator: OPERATOR, operator_set });
    }

    #[test]
    fn unknown_sets_are_rejected() {
        let mut registry = OperatorSetRegistry::new(2);
        let mut events = EventLog::default();
        let operator_set = OperatorSet::new(AVS, 9);
        let err = registry.mark_registered(OPERATOR, operator_set, &mut events).unwrap_err();
        assert_eq!(err, AllocationError::InvalidOperatorSet(operator_set));
    }

    #[test]
    fn slash_ids_increment_per_set() {
        let (mut registry, operator_set, _) = registry_with_set();
        assert_eq!(registry.next_slash_id(operator_set), 1);
        assert_eq!(registry.next_slash_id(operator_set), 2);
        assert_eq!(registry.slash_count(&operator_set), 2);
        assert_eq!(registry.slash_count(&OperatorSet::new(AVS, 2)), 0);
    }
}
