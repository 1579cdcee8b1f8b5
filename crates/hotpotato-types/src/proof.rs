//! Settlement-layer commitments and inclusion proofs.
//!
//! A [`MessageRoot`] is published by the settlement layer for every sealed
//! batch. Roots are cumulative: the root of batch `N` commits to every
//! message settled in batches up to and including `N`. Each root is signed
//! by the settlement layer's ed25519 key so destination chains can
//! authenticate the feed they import from.
//!
//! An [`InclusionProof`] is pure evidence: it never mutates state by itself.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::wire::Reader;
use crate::{BatchNumber, OutboundMessage, PotatoError, Result, TxHash, constants};

/// Which published root a proof should be built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RootKind {
    /// The first root that covered the message. Verifiable as soon as the
    /// destination has imported that batch.
    #[default]
    Inclusion,
    /// The newest root published so far.
    Latest,
}

impl std::fmt::Display for RootKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inclusion => write!(f, "INCLUSION"),
            Self::Latest => write!(f, "LATEST"),
        }
    }
}

/// Arguments of a proof-provider lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Hash of the transaction that emitted the message.
    pub tx_hash: TxHash,
    /// Optional batch hint. If set, the proof is built against exactly this
    /// root (which must already cover the message).
    pub block_tag: Option<BatchNumber>,
    /// Which message of the transaction to prove. Defaults to the first.
    pub message_index: Option<usize>,
    pub root_kind: RootKind,
}

impl ProofRequest {
    #[must_use]
    pub fn new(tx_hash: TxHash, root_kind: RootKind) -> Self {
        Self {
            tx_hash,
            block_tag: None,
            message_index: None,
            root_kind,
        }
    }
}

// ---------------------------------------------------------------------------
// MessageRoot
// ---------------------------------------------------------------------------

/// A settlement-layer commitment over all messages settled up to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRoot {
    pub batch_number: BatchNumber,
    /// Merkle root over every committed message, in commitment order.
    pub root: [u8; 32],
    /// Number of leaves the root commits to.
    pub message_count: u64,
    pub published_at: DateTime<Utc>,
    /// Ed25519 public key of the publishing settlement layer.
    pub signer: [u8; 32],
    /// Ed25519 signature over [`MessageRoot::signing_bytes`].
    pub signature: Vec<u8>,
}

impl MessageRoot {
    /// Build and sign a root.
    #[must_use]
    pub fn signed(
        batch_number: BatchNumber,
        root: [u8; 32],
        message_count: u64,
        key: &SigningKey,
    ) -> Self {
        let bytes = Self::commitment_bytes(batch_number, &root, message_count);
        Self {
            batch_number,
            root,
            message_count,
            published_at: Utc::now(),
            signer: key.verifying_key().to_bytes(),
            signature: key.sign(&bytes).to_bytes().to_vec(),
        }
    }

    fn commitment_bytes(batch_number: BatchNumber, root: &[u8; 32], message_count: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(constants::ROOT_SIGNING_DOMAIN.len() + 48);
        out.extend_from_slice(constants::ROOT_SIGNING_DOMAIN);
        out.extend_from_slice(&batch_number.0.to_be_bytes());
        out.extend_from_slice(&message_count.to_be_bytes());
        out.extend_from_slice(root);
        out
    }

    /// The bytes the settlement layer signs:
    /// `"hotpotato:root:v1:" || batch || message_count || root`.
    #[must_use]
    pub fn signing_bytes(&self) -> Vec<u8> {
        Self::commitment_bytes(self.batch_number, &self.root, self.message_count)
    }

    /// `true` if the root was signed by `trusted`.
    #[must_use]
    pub fn verify_signature(&self, trusted: &VerifyingKey) -> bool {
        if self.signer != trusted.to_bytes() {
            return false;
        }
        let Ok(signature) = Signature::from_slice(&self.signature) else {
            return false;
        };
        trusted.verify(&self.signing_bytes(), &signature).is_ok()
    }

    /// Whether two roots commit to the same thing (ignores publication time).
    #[must_use]
    pub fn same_commitment(&self, other: &Self) -> bool {
        self.batch_number == other.batch_number
            && self.root == other.root
            && self.message_count == other.message_count
    }
}

// ---------------------------------------------------------------------------
// InclusionProof
// ---------------------------------------------------------------------------

/// Evidence that `message` is leaf `leaf_index` of the root published for
/// `root_ref`.
///
/// Wire layout (big-endian):
/// `root_ref u64 | leaf_index u64 | msg_len u32 | message | path_len u32 | path [32]*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub root_ref: BatchNumber,
    pub message: OutboundMessage,
    pub leaf_index: u64,
    /// Sibling hashes from the leaf up to the root.
    pub path: Vec<[u8; 32]>,
}

impl InclusionProof {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let message = self.message.encode();
        let mut out = Vec::with_capacity(24 + message.len() + 32 * self.path.len());
        out.extend_from_slice(&self.root_ref.0.to_be_bytes());
        out.extend_from_slice(&self.leaf_index.to_be_bytes());
        let msg_len = u32::try_from(message.len()).unwrap_or(u32::MAX);
        out.extend_from_slice(&msg_len.to_be_bytes());
        out.extend_from_slice(&message);
        let path_len = u32::try_from(self.path.len()).unwrap_or(u32::MAX);
        out.extend_from_slice(&path_len.to_be_bytes());
        for sibling in &self.path {
            out.extend_from_slice(sibling);
        }
        out
    }

    /// # Errors
    /// Returns `Serialization` on malformed input, a message-length prefix
    /// that disagrees with the message, or a path deeper than
    /// [`constants::MAX_PATH_DEPTH`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let root_ref = BatchNumber(reader.u64("root reference")?);
        let leaf_index = reader.u64("leaf index")?;
        let msg_len = reader.u32("message length")? as usize;
        let message = OutboundMessage::decode(reader.take(msg_len, "message")?)?;
        let path_len = reader.u32("path length")? as usize;
        if path_len > constants::MAX_PATH_DEPTH {
            return Err(PotatoError::Serialization(format!(
                "path depth {path_len} exceeds {}",
                constants::MAX_PATH_DEPTH
            )));
        }
        let path = (0..path_len)
            .map(|_| reader.array::<32>("path element"))
            .collect::<Result<Vec<_>>>()?;
        reader.finish()?;
        Ok(Self {
            root_ref,
            message,
            leaf_index,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn sample_proof() -> InclusionProof {
        InclusionProof {
            root_ref: BatchNumber(4),
            message: OutboundMessage::dummy(271, 260, 1),
            leaf_index: 2,
            path: vec![[1; 32], [2; 32], [3; 32]],
        }
    }

    #[test]
    fn signed_root_verifies() {
        let key = key();
        let root = MessageRoot::signed(BatchNumber(1), [9; 32], 3, &key);
        assert!(root.verify_signature(&key.verifying_key()));
    }

    #[test]
    fn tampered_root_fails_signature() {
        let key = key();
        let mut root = MessageRoot::signed(BatchNumber(1), [9; 32], 3, &key);
        root.root[0] ^= 0x01;
        assert!(!root.verify_signature(&key.verifying_key()));

        let mut root = MessageRoot::signed(BatchNumber(1), [9; 32], 3, &key);
        root.message_count = 4;
        assert!(!root.verify_signature(&key.verifying_key()));
    }

    #[test]
    fn foreign_signer_rejected() {
        let other = SigningKey::from_bytes(&[7u8; 32]);
        let root = MessageRoot::signed(BatchNumber(1), [9; 32], 3, &other);
        assert!(!root.verify_signature(&key().verifying_key()));
    }

    #[test]
    fn garbage_signature_rejected() {
        let key = key();
        let mut root = MessageRoot::signed(BatchNumber(1), [9; 32], 3, &key);
        root.signature.truncate(10);
        assert!(!root.verify_signature(&key.verifying_key()));
    }

    #[test]
    fn same_commitment_ignores_time() {
        let key = key();
        let a = MessageRoot::signed(BatchNumber(1), [9; 32], 3, &key);
        let mut b = a.clone();
        b.published_at = a.published_at + chrono::Duration::seconds(5);
        assert!(a.same_commitment(&b));
        b.root = [8; 32];
        assert!(!a.same_commitment(&b));
    }

    #[test]
    fn proof_wire_decode_matches_fields() {
        let proof = sample_proof();
        let back = InclusionProof::decode(&proof.encode()).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn proof_decode_rejects_deep_path() {
        let mut proof = sample_proof();
        proof.path = vec![[0; 32]; constants::MAX_PATH_DEPTH + 1];
        let err = InclusionProof::decode(&proof.encode()).unwrap_err();
        assert!(format!("{err}").contains("path depth"));
    }

    #[test]
    fn proof_decode_rejects_truncation() {
        let bytes = sample_proof().encode();
        for cut in [0, 7, 20, bytes.len() - 1] {
            assert!(InclusionProof::decode(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn root_kind_default_is_inclusion() {
        assert_eq!(RootKind::default(), RootKind::Inclusion);
        assert_eq!(format!("{}", RootKind::Latest), "LATEST");
    }
}
