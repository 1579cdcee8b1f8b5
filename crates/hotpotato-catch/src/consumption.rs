//! Consumption record: prevents double-catching the same message.
//!
//! Each outbound message can be consumed once per destination chain.
//! Consuming the same [`MessageKey`] a second time returns
//! [`PotatoError::AlreadyConsumed`].
//!
//! The record grows monotonically and never evicts: forgetting a key would
//! let the message be replayed.

use std::collections::HashSet;

use hotpotato_types::{MessageKey, PotatoError, Result};

/// Set of message keys already consumed on one destination chain.
#[derive(Debug, Default)]
pub struct ConsumptionRecord {
    consumed: HashSet<MessageKey>,
}

impl ConsumptionRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`PotatoError::AlreadyConsumed`] if `key` was consumed before.
    pub fn ensure_unconsumed(&self, key: &MessageKey) -> Result<()> {
        if self.consumed.contains(key) {
            return Err(PotatoError::AlreadyConsumed(*key));
        }
        Ok(())
    }

    /// Record `key` as consumed.
    ///
    /// # Errors
    /// Returns [`PotatoError::AlreadyConsumed`] if `key` was consumed before.
    pub fn mark_consumed(&mut self, key: MessageKey) -> Result<()> {
        if !self.consumed.insert(key) {
            return Err(PotatoError::AlreadyConsumed(key));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_consumed(&self, key: &MessageKey) -> bool {
        self.consumed.contains(key)
    }

    /// Number of keys consumed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}
