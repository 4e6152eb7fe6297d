use alloy_primitives::Address;
use kunlun_primitives::{AllocationDelayInfo, LedgerEvent};

use crate::{
    error::{AllocationError, AllocationResult},
    events::EventLog,
    journal::{Checkpoint, JournaledMap},
};

/// Per-operator delay before new allocations become slashable.
///
/// Changing the delay is itself delayed by the configuration delay, so an operator
/// cannot shorten it without giving delegators time to react.
#[derive(Debug)]
pub struct AllocationDelayRegistry {
    delays: JournaledMap<Address, AllocationDelayInfo>,
    configuration_delay: u32,
}

impl AllocationDelayRegistry {
    pub fn new(configuration_delay: u32) -> Self {
        Self { delays: JournaledMap::new(), configuration_delay }
    }

    pub fn info(&self, operator: &Address) -> AllocationDelayInfo {
        self.delays.get(operator).copied().unwrap_or_default()
    }

    pub fn set_delay(
        &mut self,
        operator: Address,
        delay: u32,
        block: u32,
        events: &mut EventLog,
    ) -> AllocationResult<AllocationDelayInfo> {
        let effect_block = block.checked_add(self.configuration_delay).ok_or(
            AllocationError::BlockNumberOverflow { block, delay: self.configuration_delay },
        )?;

        let mut info = self.info(&operator);
        if info.has_matured_pending(block) {
            info.delay = info.pending_delay;
            info.is_set = true;
        }
        info.pending_delay = delay;
        info.effect_block = effect_block;

        self.delays.insert(operator, info);
        events.emit(LedgerEvent::AllocationDelaySet { operator, delay, effect_block });
        Ok(info)
    }

    /// `(is_set, delay)` as seen at `block`.
    pub fn delay(&self, operator: &Address, block: u32) -> (bool, u32) {
        self.info(operator).resolve(block)
    }

    pub fn effective_delay(&self, operator: &Address, block: u32) -> AllocationResult<u32> {
        match self.delay(operator, block) {
            (true, delay) => Ok(delay),
            (false, _) => Err(AllocationError::UninitializedAllocationDelay(*operator)),
        }
    }
}

impl Checkpoint for AllocationDelayRegistry {
    fn checkpoint(&mut self) {
        self.delays.checkpoint();
    }

    fn commit(&mut self) {
        self.delays.commit();
    }

    fn revert(&mut self) {
        self.delays.revert();
    }
}
