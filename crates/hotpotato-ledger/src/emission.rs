//! Shared record of every throw transaction an attached outbox emitted.
//!
//! The settlement layer only reads an outbox when it collects it, but a
//! proof request can arrive right after the throw. The emission log lets it
//! tell "emitted, not collected yet" (retry later) apart from a transaction
//! no chain ever emitted.
//!
//! Cloning the log shares it. Outboxes write, the settlement layer reads.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use hotpotato_types::TxHash;

/// Transaction → number of messages it emitted.
#[derive(Debug, Clone, Default)]
pub struct EmissionLog {
    emitted: Arc<RwLock<HashMap<TxHash, usize>>>,
}

impl EmissionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `tx_hash` emitted its message number `message_index`.
    /// Recording the same message twice is a no-op.
    pub fn record(&self, tx_hash: TxHash, message_index: usize) {
        let mut emitted = self.emitted.write().unwrap_or_else(PoisonError::into_inner);
        let count = emitted.entry(tx_hash).or_default();
        *count = (*count).max(message_index + 1);
    }

    /// How many messages `tx_hash` emitted (0 if unknown).
    #[must_use]
    pub fn emitted(&self, tx_hash: &TxHash) -> usize {
        self.emitted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tx_hash)
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct transactions recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emitted.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
