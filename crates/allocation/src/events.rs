use kunlun_primitives::LedgerEvent;
use tracing::debug;

use crate::journal::Checkpoint;

/// Events are held back until the call that produced them commits.
#[derive(Debug, Default)]
pub struct EventLog {
    pending: Vec<LedgerEvent>,
    committed: Vec<LedgerEvent>,
    in_checkpoint: bool,
}

impl EventLog {
    pub fn emit(&mut self, event: LedgerEvent) {
        debug!(?event, "ledger event");
        if self.in_checkpoint {
            self.pending.push(event);
        } else {
            self.committed.push(event);
        }
    }

    pub fn take(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.committed)
    }
}

impl Checkpoint for EventLog {
    fn checkpoint(&mut self) {
        self.pending.clear();
        self.in_checkpoint = true;
    }

    fn commit(&mut self) {
        self.committed.append(&mut self.pending);
        self.in_checkpoint = false;
    }

    fn revert(&mut self) {
        self.pending.clear();
        self.in_checkpoint = false;
    }
}
