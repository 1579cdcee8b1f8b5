//! Per-chain outbox of thrown messages.
//!
//! Every throw appends exactly one message. Sequence numbers come from a
//! single per-source-chain counter, so they are strictly increasing both per
//! chain and per (source, destination) pair. Committed messages stay in the
//! outbox; the settlement cursor only records how far the settlement layer
//! has read.
//!
//! An outbox attached to an [`EmissionLog`] also records every emitting
//! transaction there as soon as the message is appended.

use std::collections::HashMap;

use hotpotato_types::{
    AccountId, ChainId, MessageKey, OutboundMessage, ThrowReceipt, TokenId, TxHash,
};

use crate::emission::EmissionLog;

/// Sequence-tagged outbox of a single source chain.
pub struct OutboundMessenger {
    chain_id: ChainId,
    /// Messages in sequence order; index == sequence number.
    messages: Vec<OutboundMessage>,
    /// Emitting transaction of each message, parallel to `messages`.
    tx_hashes: Vec<TxHash>,
    /// Transaction → indices of the messages it emitted.
    by_tx: HashMap<TxHash, Vec<usize>>,
    /// Number of messages already handed to the settlement layer.
    committed: usize,
    log: Option<EmissionLog>,
}

impl OutboundMessenger {
    #[must_use]
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            messages: Vec::new(),
            tx_hashes: Vec::new(),
            by_tx: HashMap::new(),
            committed: 0,
            log: None,
        }
    }

    /// Report every emitted transaction to `log`, including the ones
    /// already in the outbox.
    pub fn attach(&mut self, log: EmissionLog) {
        for (tx_hash, indices) in &self.by_tx {
            for message_index in 0..indices.len() {
                log.record(*tx_hash, message_index);
            }
        }
        tracing::debug!(
            chain = self.chain_id.0,
            backfilled = self.by_tx.len(),
            "Emission log attached"
        );
        self.log = Some(log);
    }

    /// Append a message, assigning the next sequence number.
    ///
    /// Infallible: all validation happens in the ledger before the burn, so
    /// the burn and the append either both happen or neither does.
    pub fn append(
        &mut self,
        destination_chain_id: ChainId,
        token_id: TokenId,
        sender: AccountId,
        payload: Vec<u8>,
    ) -> ThrowReceipt {
        let sequence_number = self.next_sequence();
        let message = OutboundMessage {
            source_chain_id: self.chain_id,
            destination_chain_id,
            token_id,
            sequence_number,
            sender,
            payload,
        };
        let tx_hash = TxHash::for_throw(self.chain_id, sequence_number, &token_id);

        let index = self.messages.len();
        self.messages.push(message.clone());
        self.tx_hashes.push(tx_hash);
        let emitted = self.by_tx.entry(tx_hash).or_default();
        emitted.push(index);
        if let Some(log) = &self.log {
            log.record(tx_hash, emitted.len() - 1);
        }

        tracing::debug!(
            chain = self.chain_id.0,
            seq = sequence_number,
            token = %token_id,
            destination = destination_chain_id.0,
            tx = %tx_hash,
            "Outbound message appended"
        );

        ThrowReceipt { tx_hash, message }
    }

    /// The sequence number the next append will receive.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.messages.len() as u64
    }

    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Look up a message by sequence number.
    #[must_use]
    pub fn get(&self, sequence_number: u64) -> Option<&OutboundMessage> {
        usize::try_from(sequence_number)
            .ok()
            .and_then(|i| self.messages.get(i))
    }

    /// Look up a message by its unique key.
    #[must_use]
    pub fn find(&self, key: &MessageKey) -> Option<&OutboundMessage> {
        if key.source_chain_id != self.chain_id {
            return None;
        }
        self.get(key.sequence_number)
            .filter(|m| m.token_id == key.token_id)
    }

    /// Messages emitted by one transaction, in emission order.
    #[must_use]
    pub fn by_tx(&self, tx_hash: &TxHash) -> Vec<&OutboundMessage> {
        self.by_tx
            .get(tx_hash)
            .map(|indices| indices.iter().map(|&i| &self.messages[i]).collect())
            .unwrap_or_default()
    }

    /// Messages not yet handed to the settlement layer.
    #[must_use]
    pub fn pending(&self) -> &[OutboundMessage] {
        &self.messages[self.committed..]
    }

    /// Hand every pending message to the settlement layer and advance the
    /// cursor. The messages stay readable in the outbox.
    pub fn take_pending(&mut self) -> Vec<ThrowReceipt> {
        let receipts: Vec<ThrowReceipt> = self.messages[self.committed..]
            .iter()
            .zip(&self.tx_hashes[self.committed..])
            .map(|(message, tx_hash)| ThrowReceipt {
                tx_hash: *tx_hash,
                message: message.clone(),
            })
            .collect();
        self.committed = self.messages.len();
        receipts
    }

    /// Number of messages already handed to the settlement layer.
    #[must_use]
    pub fn committed_count(&self) -> usize {
        self.committed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
