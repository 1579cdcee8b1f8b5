//! Inbound verifier — turns an inclusion proof into a caught token.
//!
//! ```text
//!   InclusionProof
//!        │ verify()
//!        ├─ root_ref trusted?          no → RootNotSettled (retry)
//!        │                    never here → RootUnreachable
//!        ├─ destination == this chain? no → InvalidProof
//!        ├─ path hashes to the root?   no → InvalidProof
//!        ├─ key already consumed?     yes → AlreadyConsumed
//!        ▼
//!   VerifiedMessage
//!        │ consume()
//!        ├─ ledger can accept the id?  no → AlreadyExists
//!        ▼
//!   mint_from_catch + record key  ──▶ Token (ACTIVE, owner = catcher)
//! ```
//!
//! `verify` never mutates. `consume` runs every check before touching
//! either the ledger or the consumption record, so a failed catch leaves
//! both unchanged.

use hotpotato_ledger::TokenLedger;
use hotpotato_types::{
    AccountId, BatchNumber, ChainId, InclusionProof, MessageKey, OutboundMessage, PotatoError,
    Result, Token,
};

use crate::consumption::ConsumptionRecord;
use crate::root_sync::{RootStatus, RootSynchronizer};

/// A message whose inclusion proof has been checked against a trusted root.
///
/// Only [`InboundVerifier::verify`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedMessage {
    message: OutboundMessage,
    root_ref: BatchNumber,
    leaf_index: u64,
}

impl VerifiedMessage {
    #[must_use]
    pub fn message(&self) -> &OutboundMessage {
        &self.message
    }

    #[must_use]
    pub fn key(&self) -> MessageKey {
        self.message.key()
    }

    /// The trusted root the proof was checked against.
    #[must_use]
    pub fn root_ref(&self) -> BatchNumber {
        self.root_ref
    }

    #[must_use]
    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }
}

/// Proof validation and replay protection for one destination chain.
pub struct InboundVerifier {
    chain_id: ChainId,
    record: ConsumptionRecord,
}

impl InboundVerifier {
    #[must_use]
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            record: ConsumptionRecord::new(),
        }
    }

    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Read access to the consumption record.
    #[must_use]
    pub fn record(&self) -> &ConsumptionRecord {
        &self.record
    }

    /// Check `proof` against the trusted roots in `roots`. Read-only.
    ///
    /// # Errors
    /// - `RootNotSettled` if `proof.root_ref` is not imported yet, whatever
    ///   the proof contains
    /// - `RootUnreachable` if `proof.root_ref` predates every root imported
    ///   here
    /// - `InvalidProof` on a wrong destination or a path that does not hash
    ///   to the trusted root
    /// - `AlreadyConsumed` if the message was caught here before
    pub fn verify(
        &self,
        roots: &RootSynchronizer,
        proof: &InclusionProof,
    ) -> Result<VerifiedMessage> {
        let root = match roots.ensure_root_known(proof.root_ref) {
            RootStatus::Known(root) => root,
            RootStatus::Pending => {
                tracing::debug!(
                    chain = self.chain_id.0,
                    batch = proof.root_ref.0,
                    "Proof references a root not imported yet"
                );
                return Err(PotatoError::RootNotSettled(proof.root_ref));
            }
            RootStatus::Unreachable => {
                tracing::debug!(
                    chain = self.chain_id.0,
                    batch = proof.root_ref.0,
                    first = ?roots.first_batch().map(|b| b.0),
                    "Proof references a root older than the trusted set"
                );
                return Err(PotatoError::RootUnreachable(proof.root_ref));
            }
        };

        let message = &proof.message;
        if message.destination_chain_id != self.chain_id {
            return Err(self.reject(
                proof,
                PotatoError::invalid_proof(format!(
                    "message is addressed to {}, not {}",
                    message.destination_chain_id, self.chain_id
                )),
            ));
        }

        if let Err(err) = hotpotato_merkle::verify_inclusion(
            message,
            proof.leaf_index,
            &proof.path,
            &root.root,
            root.message_count,
        ) {
            return Err(self.reject(proof, err));
        }

        self.record.ensure_unconsumed(&message.key()).map_err(|err| {
            tracing::warn!(
                chain = self.chain_id.0,
                token = %message.token_id,
                seq = message.sequence_number,
                "Replay of consumed message rejected"
            );
            err
        })?;

        Ok(VerifiedMessage {
            message: message.clone(),
            root_ref: proof.root_ref,
            leaf_index: proof.leaf_index,
        })
    }

    fn reject(&self, proof: &InclusionProof, err: PotatoError) -> PotatoError {
        tracing::warn!(
            chain = self.chain_id.0,
            token = %proof.message.token_id,
            batch = proof.root_ref.0,
            error = %err,
            "Inclusion proof rejected"
        );
        err
    }

    /// Consume a verified message: record its key and mint the token to
    /// `caller` on `ledger`.
    ///
    /// # Errors
    /// - `AlreadyConsumed` if the key was consumed since `verify`
    /// - `AlreadyExists` if the ledger cannot accept the id
    /// - `Internal` if `ledger` belongs to another chain
    pub fn consume(
        &mut self,
        ledger: &mut TokenLedger,
        verified: VerifiedMessage,
        caller: AccountId,
    ) -> Result<Token> {
        if ledger.chain_id() != self.chain_id {
            return Err(PotatoError::Internal(format!(
                "verifier of {} cannot mint on {}",
                self.chain_id,
                ledger.chain_id()
            )));
        }
        let key = verified.key();
        self.record.ensure_unconsumed(&key)?;
        ledger.can_mint_from_catch(key.token_id)?;

        let token = ledger.mint_from_catch(key.token_id, caller, key.source_chain_id)?;
        self.record.mark_consumed(key)?;

        tracing::info!(
            chain = self.chain_id.0,
            token = %key.token_id,
            source = key.source_chain_id.0,
            seq = key.sequence_number,
            batch = verified.root_ref.0,
            "Message consumed"
        );
        Ok(token)
    }

    /// [`Self::verify`] then [`Self::consume`].
    ///
    /// # Errors
    /// Any error of either step. Nothing is mutated on failure.
    pub fn verify_and_consume(
        &mut self,
        roots: &RootSynchronizer,
        ledger: &mut TokenLedger,
        proof: &InclusionProof,
        caller: AccountId,
    ) -> Result<Token> {
        let verified = self.verify(roots, proof)?;
        self.consume(ledger, verified, caller)
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use hotpotato_merkle::MerkleTree;
    use hotpotato_types::{MessageRoot, TokenId, TokenPhase};
    use rand::rngs::OsRng;

    use super::*;

    const SRC: u64 = 271;
    const DST: u64 = 260;

    struct Fixture {
        roots: RootSynchronizer,
        ledger: TokenLedger,
        verifier: InboundVerifier,
        proofs: Vec<InclusionProof>,
    }

    fn setup() -> Fixture {
        let key = SigningKey::generate(&mut OsRng);
        let messages: Vec<_> = (0..3)
            .map(|seq| OutboundMessage::dummy(SRC, DST, seq))
            .collect();
        let tree = MerkleTree::from_messages(&messages);
        let proofs = messages
            .iter()
            .enumerate()
            .map(|(i, m)| InclusionProof {
                root_ref: BatchNumber(1),
                message: m.clone(),
                leaf_index: i as u64,
                path: tree.path(i).unwrap(),
            })
            .collect();

        let mut roots = RootSynchronizer::new(key.verifying_key());
        roots
            .import(MessageRoot::signed(BatchNumber(1), tree.root(), 3, &key))
            .unwrap();

        Fixture {
            roots,
            ledger: TokenLedger::new(ChainId(DST)),
            verifier: InboundVerifier::new(ChainId(DST)),
            proofs,
        }
    }

    #[test]
    fn valid_proof_mints_to_caller() {
        let mut f = setup();
        let catcher = AccountId::random();
        let proof = f.proofs[1].clone();

        let token = f
            .verifier
            .verify_and_consume(&f.roots, &mut f.ledger, &proof, catcher)
            .unwrap();
        assert_eq!(token.id, proof.message.token_id);
        assert!(token.is_owned_by(&catcher));
        assert_eq!(token.origin, ChainId(SRC));
        assert!(f.verifier.record().is_consumed(&proof.message.key()));
    }

    #[test]
    fn replay_rejected_and_state_unchanged() {
        let mut f = setup();
        let catcher = AccountId::random();
        let proof = f.proofs[0].clone();
        f.verifier
            .verify_and_consume(&f.roots, &mut f.ledger, &proof, catcher)
            .unwrap();

        let err = f
            .verifier
            .verify_and_consume(&f.roots, &mut f.ledger, &proof, AccountId::random())
            .unwrap_err();
        assert!(matches!(err, PotatoError::AlreadyConsumed(_)));
        assert_eq!(f.ledger.owner_of(&proof.message.token_id).unwrap(), catcher);
        assert_eq!(f.verifier.record().len(), 1);
    }

    #[test]
    fn unknown_root_is_not_settled_even_for_garbage() {
        let f = setup();
        let mut proof = f.proofs[0].clone();
        proof.root_ref = BatchNumber(2);
        proof.path[0] = [0xff; 32];
        let err = f.verifier.verify(&f.roots, &proof).unwrap_err();
        assert!(matches!(err, PotatoError::RootNotSettled(BatchNumber(2))));
        assert!(err.is_retryable());
    }

    #[test]
    fn root_before_first_import_is_unreachable() {
        let f = setup();
        let mut proof = f.proofs[0].clone();
        proof.root_ref = BatchNumber(0);
        let err = f.verifier.verify(&f.roots, &proof).unwrap_err();
        assert!(matches!(err, PotatoError::RootUnreachable(BatchNumber(0))));
        assert!(!err.is_retryable());
    }

    #[test]
    fn wrong_destination_rejected() {
        let f = setup();
        let other = InboundVerifier::new(ChainId(999));
        let err = other.verify(&f.roots, &f.proofs[0]).unwrap_err();
        assert!(matches!(err, PotatoError::InvalidProof { .. }));
    }

    #[test]
    fn tampered_proof_rejected_without_mutation() {
        let mut f = setup();
        let mut proof = f.proofs[2].clone();
        proof.message.payload.push(0);

        let err = f
            .verifier
            .verify_and_consume(&f.roots, &mut f.ledger, &proof, AccountId::random())
            .unwrap_err();
        assert!(matches!(err, PotatoError::InvalidProof { .. }));
        assert!(f.verifier.record().is_empty());
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn ledger_conflict_leaves_record_untouched() {
        let mut f = setup();
        let proof = f.proofs[0].clone();
        let squatter = AccountId::random();
        f.ledger
            .mint(Some(proof.message.token_id), squatter)
            .unwrap();

        let err = f
            .verifier
            .verify_and_consume(&f.roots, &mut f.ledger, &proof, AccountId::random())
            .unwrap_err();
        assert!(matches!(err, PotatoError::AlreadyExists(_)));
        assert!(!f.verifier.record().is_consumed(&proof.message.key()));
        assert_eq!(f.ledger.owner_of(&proof.message.token_id).unwrap(), squatter);
    }

    #[test]
    fn verified_message_survives_for_consume() {
        let mut f = setup();
        let verified = f.verifier.verify(&f.roots, &f.proofs[1]).unwrap();
        assert_eq!(verified.root_ref(), BatchNumber(1));
        assert_eq!(verified.leaf_index(), 1);

        let token = f
            .verifier
            .consume(&mut f.ledger, verified.clone(), AccountId::random())
            .unwrap();
        assert_eq!(f.ledger.phase_of(&token.id), Some(TokenPhase::Active));

        let err = f
            .verifier
            .consume(&mut f.ledger, verified, AccountId::random())
            .unwrap_err();
        assert!(matches!(err, PotatoError::AlreadyConsumed(_)));
    }

    #[test]
    fn foreign_ledger_rejected() {
        let mut f = setup();
        let verified = f.verifier.verify(&f.roots, &f.proofs[0]).unwrap();
        let mut foreign = TokenLedger::new(ChainId(SRC));
        assert!(matches!(
            f.verifier
                .consume(&mut foreign, verified, AccountId::random()),
            Err(PotatoError::Internal(_))
        ));
        assert!(foreign.get(&TokenId::from_bytes([0; 32])).is_none());
        assert!(f.verifier.record().is_empty());
    }
}
