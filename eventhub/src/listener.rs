use dashmap::DashMap;
use fabric_protos::common::TxValidationCode;
use tokio::sync::oneshot;

/// What a registered commit listener observes: the validation code a
/// block carried for its TxID. `VALID` (0) is the only success case.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommitOutcome {
    pub block_number: u64,
    pub validation_code: TxValidationCode,
}

impl CommitOutcome {
    pub fn is_success(&self) -> bool {
        self.validation_code == TxValidationCode::Valid
    }
}

/// Commit listeners keyed by TxID, dispatched exactly once then
/// removed. A concurrent map: insertion precedes broadcast, removal
/// happens on fulfilment or timeout.
#[derive(Default)]
pub struct CommitListeners {
    inner: DashMap<String, oneshot::Sender<CommitOutcome>>,
}

impl CommitListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `tx_id`. Must be called before the
    /// envelope carrying that TxID is handed to the orderer.
    pub fn register(&self, tx_id: String) -> oneshot::Receiver<CommitOutcome> {
        let (tx, rx) = oneshot::channel();
        self.inner.insert(tx_id, tx);
        rx
    }

    /// Remove and fire the listener for `tx_id`, if still registered.
    /// Returns `false` if there was no listener (already fired,
    /// timed out, or never registered) — not an error, blocks commonly
    /// carry TxIDs nobody is waiting on.
    pub fn dispatch(&self, tx_id: &str, outcome: CommitOutcome) -> bool {
        match self.inner.remove(tx_id) {
            Some((_, sender)) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Remove a listener without firing it (used on timeout cleanup).
    pub fn remove(&self, tx_id: &str) {
        self.inner.remove(tx_id);
    }

    /// Drop every outstanding listener's sender, so every waiter's
    /// receiver resolves to an error immediately (used on channel
    /// shutdown to surface `ShuttingDownError` rather than leaving
    /// waiters to time out).
    pub fn drain(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_resolves_the_registered_receiver() {
        let listeners = CommitListeners::new();
        let rx = listeners.register("tx1".to_string());
        let outcome = CommitOutcome {
            block_number: 7,
            validation_code: TxValidationCode::Valid,
        };
        assert!(listeners.dispatch("tx1", outcome));
        assert_eq!(rx.await.unwrap(), outcome);
        assert!(listeners.is_empty());
    }

    #[test]
    fn dispatch_on_unknown_tx_id_is_a_harmless_no_op() {
        let listeners = CommitListeners::new();
        let outcome = CommitOutcome {
            block_number: 1,
            validation_code: TxValidationCode::Valid,
        };
        assert!(!listeners.dispatch("nobody-waiting", outcome));
    }
}
