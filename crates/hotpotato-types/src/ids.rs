//! Identifiers used throughout Hot Potato.
//!
//! Token ids, account references and transaction hashes are fixed-width
//! byte strings so they hash identically on every chain. Chain ids and batch
//! numbers are plain integers.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants;

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// Numeric identifier of a chain participating in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// Opaque 32-byte token identifier, globally unique at mint time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Fresh identifier for the `nonce`-th mint on `chain_id`.
    ///
    /// Including the chain id keeps ids minted on different chains disjoint,
    /// so a freshly minted id can never collide with one that is in flight.
    #[must_use]
    pub fn derive(chain_id: ChainId, nonce: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::TOKEN_ID_DOMAIN);
        hasher.update(chain_id.0.to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "potato:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A 20-byte account reference (token owner, thrower, catcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// Hash of the source-chain transaction that emitted a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Hash of the throw transaction that emitted `sequence_number` on
    /// `chain_id` for `token_id`.
    #[must_use]
    pub fn for_throw(chain_id: ChainId, sequence_number: u64, token_id: &TokenId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::TX_HASH_DOMAIN);
        hasher.update(chain_id.0.to_be_bytes());
        hasher.update(sequence_number.to_be_bytes());
        hasher.update(token_id.as_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// BatchNumber
// ---------------------------------------------------------------------------

/// Monotonically increasing settlement-layer checkpoint. Also serves as the
/// reference to the [`crate::MessageRoot`] published for that checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchNumber(pub u64);

impl BatchNumber {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MessageKey
// ---------------------------------------------------------------------------

/// Unique key of an outbound message: `(source chain, token, sequence)`.
///
/// This is what replay protection records, and what proof providers use to
/// locate a message. Log positions inside a transaction are never part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MessageKey {
    pub source_chain_id: ChainId,
    pub token_id: TokenId,
    pub sequence_number: u64,
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/seq:{}",
            self.source_chain_id, self.token_id, self.sequence_number
        )
    }
}

/// Random identifiers for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl TokenId {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
