//! Seams between a destination chain and the settlement layer.
//!
//! A catcher only ever sees the settlement layer through these two traits:
//! a [`ProofProvider`] that builds inclusion proofs on request, and a
//! [`RootFeed`] the [`crate::RootSynchronizer`] pulls signed roots from.

use std::future::Future;

use hotpotato_types::{BatchNumber, InclusionProof, MessageRoot, ProofRequest, Result};

/// Source of inclusion proofs.
pub trait ProofProvider {
    /// Build a proof for the message emitted by `request.tx_hash`.
    ///
    /// # Errors
    /// - `NotYetSettled` while the message is not covered by a published
    ///   root (retryable)
    /// - `TxNotFound` if no chain ever emitted the transaction
    fn inclusion_proof(
        &self,
        request: &ProofRequest,
    ) -> impl Future<Output = Result<InclusionProof>> + Send;
}

/// Source of signed message roots.
pub trait RootFeed {
    /// Every published root with a batch number above `after`, in
    /// increasing batch order. `None` asks for all of them.
    ///
    /// # Errors
    /// Returns a fault if the feed cannot be read.
    fn roots_after(&self, after: Option<BatchNumber>) -> Result<Vec<MessageRoot>>;
}
