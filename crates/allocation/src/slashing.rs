use alloy_primitives::Address;
use kunlun_primitives::{
    magnitude::mul_wad, Entrypoint, LedgerEvent, OperatorSet, SlashOutcome, SlashingParams,
    StrategySlash, WAD,
};
use tracing::{debug, info};

use crate::{
    clients::{AvsRegistrar, DelegationLedger, PermissionController},
    error::{AllocationError, AllocationResult},
    manager::AllocationManager,
    metrics::AllocationMetrics,
};

impl<D, R, P> AllocationManager<D, R, P>
where
    D: DelegationLedger,
    R: AvsRegistrar,
    P: PermissionController,
{
    /// Slashes a proportion of the operator's current allocation to one of the
    /// AVS's operator sets, for each listed strategy.
    ///
    /// Slashed magnitude is removed from the allocation, from the encumbered magnitude
    /// and from the max magnitude, and the matching share loss is burned in the
    /// delegation ledger. A pending deallocation shrinks by the same proportion.
    /// Strategies outside the set, or with nothing allocated, are skipped. If the
    /// delegation ledger fails on any strategy, none of the call's effects are kept.
    pub fn slash_operator(
        &mut self,
        caller: Address,
        avs: Address,
        params: &SlashingParams,
    ) -> AllocationResult<SlashOutcome> {
        self.check_can_call(avs, caller, Entrypoint::SlashOperator)?;
        let operator_set = OperatorSet::new(avs, params.operator_set_id);
        let outcome = self.atomically(|manager| manager.apply_slash(operator_set, params))?;

        AllocationMetrics::slash(outcome.total_slashed_magnitude());
        info!(
            operator = %params.operator,
            %operator_set,
            slash_id = outcome.slash_id,
            description = %params.description,
            "operator slashed"
        );
        Ok(outcome)
    }

    fn validate_slash(
        &self,
        operator_set: OperatorSet,
        params: &SlashingParams,
    ) -> AllocationResult<()> {
        let registry = &self.state.operator_sets;
        registry.ensure_exists(&operator_set)?;
        if !registry.is_operator_slashable(&params.operator, &operator_set, self.block_number) {
            return Err(AllocationError::OperatorNotSlashable {
                operator: params.operator,
                operator_set,
            });
        }
        if params.strategies.len() != params.wads_to_slash.len() {
            return Err(AllocationError::InputArrayLengthMismatch {
                strategies: params.strategies.len(),
                values: params.wads_to_slash.len(),
            });
        }
        if params.strategies.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AllocationError::StrategiesNotInAscendingOrder);
        }

        if let Some(wad) = params.wads_to_slash.iter().find(|wad| **wad == 0 || **wad >= WAD) {
            return Err(AllocationError::InvalidWadToSlash(*wad));
        }
        Ok(())
    }

    fn apply_slash(
        &mut self,
        operator_set: OperatorSet,
        params: &SlashingParams,
    ) -> AllocationResult<SlashOutcome> {
        self.validate_slash(operator_set, params)?;

        let block = self.block_number;
        let operator = params.operator;
        let slash_id = self.state.operator_sets.next_slash_id(operator_set);

        let mut slashes = Vec::with_capacity(params.strategies.len());
        for (strategy, wad) in params.strategies.iter().zip(&params.wads_to_slash) {
            let state = &mut self.state;
            if !state.operator_sets.contains_strategy(&operator_set, strategy) {
                continue;
            }
            let (mut info, mut allocation) =
                state.ledger.updated_allocation(&operator, &operator_set, strategy, block)?;
            if allocation.current_magnitude == 0 {
                continue;
            }

            let slashed_magnitude = mul_wad(allocation.current_magnitude, *wad);
            let prev_max_magnitude = info.max_magnitude;
            allocation.current_magnitude -= slashed_magnitude;
            info.encumbered_magnitude =
                info.encumbered_magnitude.checked_sub(slashed_magnitude).ok_or(
                    AllocationError::MagnitudeOutOfRange {
                        magnitude: info.encumbered_magnitude,
                        diff: -i128::from(slashed_magnitude),
                    },
                )?;

            // the queued deallocation releases less, its encumbrance is already gone
            if allocation.is_deallocation_pending() {
                let pending = allocation.pending_diff.unsigned_abs();
                let pending = u64::try_from(pending).map_err(|_| {
                    AllocationError::MagnitudeOutOfRange {
                        magnitude: allocation.current_magnitude,
                        diff: allocation.pending_diff,
                    }
                })?;
                allocation.pending_diff += i128::from(mul_wad(pending, *wad));
            }

            let events = &mut state.events;
            state.ledger.store(operator, operator_set, *strategy, info, allocation, events);
            let new_max_magnitude = state.ledger.reduce_max_magnitude(
                operator,
                *strategy,
                slashed_magnitude,
                block,
                &mut state.events,
            );

            let slashed_shares = self.delegation.slash_operator_shares(
                &operator,
                strategy,
                prev_max_magnitude,
                new_max_magnitude,
            )?;
            debug!(
                %operator,
                %strategy,
                slashed_magnitude,
                prev_max_magnitude,
                new_max_magnitude,
                %slashed_shares,
                "strategy slashed"
            );
            slashes.push(StrategySlash { strategy: *strategy, slashed_magnitude, slashed_shares });
        }

        self.state.events.emit(LedgerEvent::OperatorSlashed {
            operator,
            operator_set,
            strategies: params.strategies.clone(),
            wads_slashed: params.wads_to_slash.clone(),
            description: params.description.clone(),
            slash_id,
        });
        Ok(SlashOutcome { slash_id, slashes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clients::{DelegationError, MockAvsRegistrar, MockDelegationLedger, MockPermissionController},
        config::AllocationConfig,
    };
    use alloy_primitives::{address, U256};
    use kunlun_primitives::{AllocateParams, Allocation, CreateSetParams, RegisterParams};

    const OPERATOR: Address = address!("0x0000777735367b36bC9B61C50022d9D0700dB4Ec");
    const AVS: Address = address!("0x00000000000000000000000000000000000000aa");
    const STRATEGY_A: Address = address!("0x00000000000000000000000000000000000005a1");
    const STRATEGY_B: Address = address!("0x00000000000000000000000000000000000005b2");
    const STRATEGY_C: Address = address!("0x00000000000000000000000000000000000005c3");

    type MockManager =
        AllocationManager<MockDelegationLedger, MockAvsRegistrar, MockPermissionController>;

    /// Registered operator with half of WAD allocated to set 1 in both strategies.
    fn setup(delegation: MockDelegationLedger) -> MockManager {
        let mut registrar = MockAvsRegistrar::new();
        registrar.expect_register_operator().returning(|_, _, _, _| Ok(()));
        let config = AllocationConfig {
            deallocation_delay: 50,
            allocation_configuration_delay: 0,
            ..AllocationConfig::default()
        };
        let mut permissions = MockPermissionController::new();
        permissions.expect_can_call().returning(|_, _, _| false);
        let mut manager = AllocationManager::new(config, delegation, registrar, permissions);

        manager.set_block_number(1).unwrap();
        manager.set_allocation_delay(OPERATOR, OPERATOR, 0).unwrap();
        manager
            .create_operator_sets(
                AVS,
                AVS,
                &[CreateSetParams { operator_set_id: 1, strategies: vec![STRATEGY_A, STRATEGY_B] }],
            )
            .unwrap();
        manager
            .register_for_operator_sets(
                OPERATOR,
                OPERATOR,
                &RegisterParams { avs: AVS, operator_set_ids: vec![1], data: Default::default() },
            )
            .unwrap();
        manager.set_block_number(2).unwrap();
        manager
            .modify_allocations(
                OPERATOR,
                OPERATOR,
                &[AllocateParams {
                    operator_set: OperatorSet::new(AVS, 1),
                    strategies: vec![STRATEGY_A, STRATEGY_B],
                    new_magnitudes: vec![WAD / 2, WAD / 2],
                }],
            )
            .unwrap();
        manager.set_block_number(3).unwrap();
        manager.take_events();
        manager
    }

    fn operator_delegation() -> MockDelegationLedger {
        let mut delegation = MockDelegationLedger::new();
        delegation.expect_is_operator().returning(|_| true);
        delegation
    }

    fn params(strategies: Vec<Address>, wads_to_slash: Vec<u64>) -> SlashingParams {
        SlashingParams {
            operator: OPERATOR,
            operator_set_id: 1,
            strategies,
            wads_to_slash,
            description: "double sign".to_string(),
        }
    }

    #[test]
    fn slash_reduces_allocation_encumbrance_and_max() {
        let mut delegation = operator_delegation();
        delegation
            .expect_slash_operator_shares()
            .withf(|operator, strategy, prev, new| {
                *operator == OPERATOR && *strategy == STRATEGY_A && *prev == WAD && *new == WAD / 4 * 3
            })
            .times(1)
            .returning(|_, _, _, _| Ok(U256::from(25)));
        let mut manager = setup(delegation);

        let outcome = manager.slash_operator(AVS, AVS, &params(vec![STRATEGY_A], vec![WAD / 2])).unwrap();
        assert_eq!(outcome.slash_id, 1);
        assert_eq!(
            outcome.slashes,
            vec![StrategySlash {
                strategy: STRATEGY_A,
                slashed_magnitude: WAD / 4,
                slashed_shares: U256::from(25)
            }]
        );

        let operator_set = OperatorSet::new(AVS, 1);
        assert_eq!(
            manager.allocation(&OPERATOR, &operator_set, &STRATEGY_A).current_magnitude,
            WAD / 4
        );
        assert_eq!(manager.encumbered_magnitude(&OPERATOR, &STRATEGY_A), WAD / 4);
        assert_eq!(manager.max_magnitudes(&OPERATOR, &[STRATEGY_A]), vec![WAD / 4 * 3]);
        assert_eq!(manager.max_magnitudes_at_block(&OPERATOR, &[STRATEGY_A], 2), vec![WAD]);
        assert_eq!(manager.slash_count(&operator_set), 1);
        assert!(manager
            .take_events()
            .iter()
            .any(|event| matches!(event, LedgerEvent::OperatorSlashed { slash_id: 1, .. })));
    }

    #[test]
    fn delegation_failure_reverts_earlier_strategies() {
        let mut delegation = operator_delegation();
        delegation
            .expect_slash_operator_shares()
            .withf(|_, strategy, _, _| *strategy == STRATEGY_A)
            .returning(|_, _, _, _| Ok(U256::from(1)));
        delegation
            .expect_slash_operator_shares()
            .withf(|_, strategy, _, _| *strategy == STRATEGY_B)
            .returning(|_, _, _, _| Err(DelegationError::SlashFailed { msg: "paused".to_string() }));
        let mut manager = setup(delegation);

        let err = manager
            .slash_operator(AVS, AVS, &params(vec![STRATEGY_A, STRATEGY_B], vec![WAD / 2, WAD / 2]))
            .unwrap_err();
        assert_eq!(
            err,
            AllocationError::Delegation(DelegationError::SlashFailed { msg: "paused".to_string() })
        );

        let operator_set = OperatorSet::new(AVS, 1);
        assert_eq!(
            manager.allocation(&OPERATOR, &operator_set, &STRATEGY_A),
            Allocation::new(WAD / 2, 0, 2)
        );
        assert_eq!(manager.max_magnitudes(&OPERATOR, &[STRATEGY_A]), vec![WAD]);
        assert_eq!(manager.slash_count(&operator_set), 0);
        assert!(manager.take_events().is_empty());
    }

    #[test]
    fn slash_shrinks_pending_deallocation() {
        let mut delegation = operator_delegation();
        delegation.expect_slash_operator_shares().returning(|_, _, _, _| Ok(U256::ZERO));
        let mut manager = setup(delegation);
        manager
            .modify_allocations(
                OPERATOR,
                OPERATOR,
                &[AllocateParams {
                    operator_set: OperatorSet::new(AVS, 1),
                    strategies: vec![STRATEGY_A],
                    new_magnitudes: vec![WAD / 4],
                }],
            )
            .unwrap();

        manager.slash_operator(AVS, AVS, &params(vec![STRATEGY_A], vec![WAD / 2])).unwrap();

        let allocation = manager.allocation(&OPERATOR, &OperatorSet::new(AVS, 1), &STRATEGY_A);
        assert_eq!(allocation.current_magnitude, WAD / 4);
        assert_eq!(allocation.pending_diff, -((WAD / 8) as i128));
        assert_eq!(manager.encumbered_magnitude(&OPERATOR, &STRATEGY_A), WAD / 4);

        manager.set_block_number(53).unwrap();
        manager.clear_deallocation_queue(OPERATOR, &[STRATEGY_A], &[1]).unwrap();
        assert_eq!(manager.encumbered_magnitude(&OPERATOR, &STRATEGY_A), WAD / 8);
    }

    #[test]
    fn strategies_outside_the_set_are_skipped() {
        let mut delegation = operator_delegation();
        delegation
            .expect_slash_operator_shares()
            .withf(|_, strategy, _, _| *strategy == STRATEGY_A)
            .times(1)
            .returning(|_, _, _, _| Ok(U256::from(10)));
        let mut manager = setup(delegation);

        let outcome = manager
            .slash_operator(AVS, AVS, &params(vec![STRATEGY_A, STRATEGY_C], vec![WAD / 2, WAD / 2]))
            .unwrap();
        assert_eq!(
            outcome.slashes,
            vec![StrategySlash {
                strategy: STRATEGY_A,
                slashed_magnitude: WAD / 4,
                slashed_shares: U256::from(10)
            }]
        );
        assert_eq!(
            manager.max_magnitudes(&OPERATOR, &[STRATEGY_A, STRATEGY_C]),
            vec![WAD / 4 * 3, WAD]
        );
        assert_eq!(manager.slash_count(&OperatorSet::new(AVS, 1)), 1);
    }

    #[test]
    fn removed_strategy_keeps_its_allocation() {
        let mut delegation = operator_delegation();
        delegation.expect_slash_operator_shares().times(0);
        let mut manager = setup(delegation);
        manager.remove_strategies_from_operator_set(AVS, AVS, 1, &[STRATEGY_B]).unwrap();

        let outcome =
            manager.slash_operator(AVS, AVS, &params(vec![STRATEGY_B], vec![WAD / 2])).unwrap();
        assert!(outcome.slashes.is_empty());
        assert_eq!(
            manager.allocation(&OPERATOR, &OperatorSet::new(AVS, 1), &STRATEGY_B).current_magnitude,
            WAD / 2
        );
    }

    #[test]
    fn invalid_slashes_are_rejected() {
        let mut manager = setup(operator_delegation());

        let err = manager.slash_operator(AVS, AVS, &params(vec![STRATEGY_A], vec![0])).unwrap_err();
        assert_eq!(err, AllocationError::InvalidWadToSlash(0));

        let err =
            manager.slash_operator(AVS, AVS, &params(vec![STRATEGY_A], vec![WAD])).unwrap_err();
        assert_eq!(err, AllocationError::InvalidWadToSlash(WAD));

        let err =
            manager.slash_operator(AVS, AVS, &params(vec![STRATEGY_A], vec![WAD + 1])).unwrap_err();
        assert_eq!(err, AllocationError::InvalidWadToSlash(WAD + 1));
        assert_eq!(manager.slash_count(&OperatorSet::new(AVS, 1)), 0);

        let err = manager
            .slash_operator(AVS, AVS, &params(vec![STRATEGY_B, STRATEGY_A], vec![1, 1]))
            .unwrap_err();
        assert_eq!(err, AllocationError::StrategiesNotInAscendingOrder);

        let err = manager
            .slash_operator(OPERATOR, AVS, &params(vec![STRATEGY_A], vec![1]))
            .unwrap_err();
        assert!(matches!(err, AllocationError::Unauthorized { .. }));

        let mut unknown = params(vec![STRATEGY_A], vec![1]);
        unknown.operator_set_id = 9;
        let err = manager.slash_operator(AVS, AVS, &unknown).unwrap_err();
        assert_eq!(err, AllocationError::InvalidOperatorSet(OperatorSet::new(AVS, 9)));
    }
}
