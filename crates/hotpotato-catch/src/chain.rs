//! One participating chain: its ledger, outbox, trusted roots and verifier.
//!
//! Each `Chain` owns all of its mutable state. Nothing here is shared with
//! other chains; they only ever exchange messages, roots and proofs.

use ed25519_dalek::VerifyingKey;
use hotpotato_ledger::{OutboundMessenger, TokenLedger};
use hotpotato_types::{
    AccountId, ChainId, InclusionProof, ProtocolConfig, Result, ThrowReceipt, Token, TokenId,
};

use crate::provider::RootFeed;
use crate::root_sync::RootSynchronizer;
use crate::verifier::{InboundVerifier, VerifiedMessage};

/// A chain participating in the protocol.
pub struct Chain {
    id: ChainId,
    ledger: TokenLedger,
    outbox: OutboundMessenger,
    roots: RootSynchronizer,
    verifier: InboundVerifier,
}

impl Chain {
    /// Create a chain trusting roots signed by `settlement_key`.
    #[must_use]
    pub fn new(id: ChainId, settlement_key: VerifyingKey) -> Self {
        Self::with_config(id, settlement_key, &ProtocolConfig::default())
    }

    #[must_use]
    pub fn with_config(id: ChainId, settlement_key: VerifyingKey, config: &ProtocolConfig) -> Self {
        Self {
            id,
            ledger: TokenLedger::with_max_payload(id, config.max_payload_len),
            outbox: OutboundMessenger::new(id),
            roots: RootSynchronizer::new(settlement_key),
            verifier: InboundVerifier::new(id),
        }
    }

    #[must_use]
    pub fn id(&self) -> ChainId {
        self.id
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Mint a fresh token for `owner`.
    ///
    /// # Errors
    /// See [`TokenLedger::mint`].
    pub fn mint(&mut self, owner: AccountId) -> Result<Token> {
        self.ledger.mint(None, owner)
    }

    /// Burn `token_id` here and throw it to `destination`.
    ///
    /// # Errors
    /// See [`TokenLedger::burn_and_throw`].
    pub fn throw(
        &mut self,
        token_id: TokenId,
        caller: AccountId,
        destination: ChainId,
        payload: Vec<u8>,
    ) -> Result<ThrowReceipt> {
        self.ledger
            .burn_and_throw(&mut self.outbox, token_id, caller, destination, payload)
    }

    /// Pull new roots from `feed`.
    ///
    /// # Errors
    /// See [`RootSynchronizer::sync_from`].
    pub fn sync_roots<F: RootFeed + ?Sized>(&mut self, feed: &F) -> Result<usize> {
        self.roots.sync_from(feed)
    }

    /// Verify `proof` and mint the caught token to `caller`.
    ///
    /// # Errors
    /// See [`InboundVerifier::verify_and_consume`].
    pub fn catch(&mut self, proof: &InclusionProof, caller: AccountId) -> Result<Token> {
        self.verifier
            .verify_and_consume(&self.roots, &mut self.ledger, proof, caller)
    }

    /// Check `proof` against this chain's trusted roots. Read-only.
    ///
    /// # Errors
    /// See [`InboundVerifier::verify`].
    pub fn verify(&self, proof: &InclusionProof) -> Result<VerifiedMessage> {
        self.verifier.verify(&self.roots, proof)
    }

    /// Mint a verified message to `caller`.
    ///
    /// # Errors
    /// See [`InboundVerifier::consume`].
    pub fn consume(&mut self, verified: VerifiedMessage, caller: AccountId) -> Result<Token> {
        self.verifier.consume(&mut self.ledger, verified, caller)
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    #[must_use]
    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut TokenLedger {
        &mut self.ledger
    }

    #[must_use]
    pub fn outbox(&self) -> &OutboundMessenger {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut OutboundMessenger {
        &mut self.outbox
    }

    #[must_use]
    pub fn roots(&self) -> &RootSynchronizer {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut RootSynchronizer {
        &mut self.roots
    }

    #[must_use]
    pub fn verifier(&self) -> &InboundVerifier {
        &self.verifier
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use hotpotato_types::{PotatoError, ProofRequest, RootKind, TokenPhase};
    use rand::rngs::OsRng;

    use super::*;
    use crate::SettlementLayer;

    #[test]
    fn throw_and_catch_between_two_chains() {
        let mut layer = SettlementLayer::new(SigningKey::generate(&mut OsRng));
        let mut a = Chain::new(ChainId(1), layer.verifying_key());
        let mut b = Chain::new(ChainId(2), layer.verifying_key());
        let alice = AccountId::random();
        let bob = AccountId::random();

        let token = a.mint(alice).unwrap();
        let receipt = a.throw(token.id, alice, b.id(), vec![]).unwrap();
        layer.settle(&mut [a.outbox_mut()]);
        let proof = layer
            .prove(&ProofRequest::new(receipt.tx_hash, RootKind::Inclusion))
            .unwrap();

        assert!(matches!(
            b.catch(&proof, bob),
            Err(PotatoError::RootNotSettled(_))
        ));
        assert_eq!(b.sync_roots(&layer).unwrap(), 1);
        b.catch(&proof, bob).unwrap();

        assert_eq!(b.ledger().owner_of(&token.id).unwrap(), bob);
        assert_eq!(a.ledger().phase_of(&token.id), Some(TokenPhase::Thrown));
        assert_eq!(b.verifier().record().len(), 1);
    }

    #[test]
    fn config_payload_limit_applies() {
        let layer = SettlementLayer::new(SigningKey::generate(&mut OsRng));
        let config = ProtocolConfig {
            max_payload_len: 2,
            ..ProtocolConfig::default()
        };
        let mut a = Chain::with_config(ChainId(1), layer.verifying_key(), &config);
        let alice = AccountId::random();
        let token = a.mint(alice).unwrap();
        assert!(matches!(
            a.throw(token.id, alice, ChainId(2), vec![0; 3]),
            Err(PotatoError::PayloadTooLarge { .. })
        ));
        assert!(a.outbox().is_empty());
    }
}
