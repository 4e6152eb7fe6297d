use crate::{
    config::AllocationConfig,
    delay::AllocationDelayRegistry,
    events::EventLog,
    journal::Checkpoint,
    ledger::MagnitudeLedger,
    operator_sets::OperatorSetRegistry,
    queue::DeallocationQueues,
};

/// Every piece of mutable accounting state, owned by the manager and handed to the
/// engines by reference.
#[derive(Debug)]
pub struct AllocationState {
    pub ledger: MagnitudeLedger,
    pub delays: AllocationDelayRegistry,
    pub queues: DeallocationQueues,
    pub operator_sets: OperatorSetRegistry,
    pub events: EventLog,
}

impl AllocationState {
    pub fn new(config: &AllocationConfig) -> Self {
        Self {
            ledger: MagnitudeLedger::new(),
            delays: AllocationDelayRegistry::new(config.allocation_configuration_delay),
            queues: DeallocationQueues::new(),
            operator_sets: OperatorSetRegistry::new(config.max_operator_set_strategies),
            events: EventLog::default(),
        }
    }
}

impl Checkpoint for AllocationState {
    fn checkpoint(&mut self) {
        self.ledger.checkpoint();
        self.delays.checkpoint();
        self.queues.checkpoint();
        self.operator_sets.checkpoint();
        self.events.checkpoint();
    }

    fn commit(&mut self) {
        self.ledger.commit();
        self.delays.commit();
        self.queues.commit();
        self.operator_sets.commit();
        self.events.commit();
    }

    fn revert(&mut self) {
        self.ledger.revert();
        self.delays.revert();
        self.queues.revert();
        self.operator_sets.revert();
        self.events.revert();
    }
}
