//! Settlement layer — commits outbound messages and serves proofs.
//!
//! The settlement layer collects pending messages from chain outboxes,
//! seals them into numbered batches and publishes one signed
//! [`MessageRoot`] per batch. Roots are cumulative: batch `N` commits to
//! every message settled in batches `1..=N`, in commitment order.
//!
//! ```text
//!   outbox.append() ──▶ EmissionLog
//!        │                   │
//!   outbox.take_pending() ─collect─▶ queue ─seal_batch─▶ leaves ──▶ MessageRoot(N)
//!                                      │                   │
//!                          NotYetSettled                   └─▶ inclusion_proof()
//! ```
//!
//! Outboxes [`connect`](SettlementLayer::connect)ed to the layer report each
//! throw as it happens, so a proof request for a throw that has not been
//! collected yet is `NotYetSettled` rather than `TxNotFound`.
//!
//! The merkle tree of every distinct leaf count is kept after sealing, so
//! proofs never rebuild a tree.

use std::collections::{BTreeMap, HashMap};
use std::future::{Future, ready};
use std::sync::RwLock;

use ed25519_dalek::{SigningKey, VerifyingKey};
use hotpotato_ledger::{EmissionLog, OutboundMessenger};
use hotpotato_merkle::{MerkleTree, leaf_hash};
use hotpotato_types::{
    BatchNumber, InclusionProof, MessageRoot, OutboundMessage, PotatoError, ProofRequest, Result,
    RootKind, ThrowReceipt, TxHash,
};

use crate::provider::{ProofProvider, RootFeed};

/// A message committed under a root.
struct Committed {
    message: OutboundMessage,
    /// First batch whose root covers this message.
    batch: BatchNumber,
}

/// Simulated settlement layer shared by every chain.
pub struct SettlementLayer {
    signing_key: SigningKey,
    /// Collected messages waiting for the next seal.
    queue: Vec<ThrowReceipt>,
    /// Leaf hashes in commitment order.
    leaves: Vec<[u8; 32]>,
    /// Committed messages, parallel to `leaves`.
    committed: Vec<Committed>,
    /// Transaction → leaf position of each message it emitted
    /// (`None` while still queued).
    txs: HashMap<TxHash, Vec<Option<usize>>>,
    /// Published roots; `roots[i]` is batch `i + 1`.
    roots: Vec<MessageRoot>,
    /// Sealed trees keyed by the number of leaves they commit to.
    trees: BTreeMap<u64, MerkleTree>,
    /// Throws reported by connected outboxes.
    emitted: EmissionLog,
}

impl SettlementLayer {
    /// Create a settlement layer signing its roots with `signing_key`.
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            queue: Vec::new(),
            leaves: Vec::new(),
            committed: Vec::new(),
            txs: HashMap::new(),
            roots: Vec::new(),
            trees: BTreeMap::new(),
            emitted: EmissionLog::new(),
        }
    }

    /// Have `outbox` report its throws to this layer as they happen.
    pub fn connect(&self, outbox: &mut OutboundMessenger) {
        outbox.attach(self.emitted.clone());
    }

    /// The log connected outboxes write to.
    #[must_use]
    pub fn emission_log(&self) -> &EmissionLog {
        &self.emitted
    }

    /// The key destination chains must trust.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    // -----------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------

    /// Take every pending message of `outbox` into the queue of the next
    /// batch. Returns how many were collected.
    pub fn collect(&mut self, outbox: &mut OutboundMessenger) -> usize {
        let receipts = outbox.take_pending();
        for receipt in &receipts {
            self.txs.entry(receipt.tx_hash).or_default().push(None);
        }
        let n = receipts.len();
        self.queue.extend(receipts);
        if n > 0 {
            tracing::debug!(
                chain = outbox.chain_id().0,
                collected = n,
                queued = self.queue.len(),
                "Outbox collected"
            );
        }
        n
    }

    /// Seal the queue into the next batch and publish its signed root.
    ///
    /// 1. Append every queued message as a leaf, in collection order
    /// 2. Recompute the root over all leaves committed so far
    /// 3. Sign and publish it as batch `latest + 1`
    ///
    /// Sealing an empty queue still publishes a root (same commitment,
    /// next batch number).
    pub fn seal_batch(&mut self) -> MessageRoot {
        let batch = BatchNumber(self.roots.len() as u64 + 1);

        for receipt in std::mem::take(&mut self.queue) {
            let position = self.leaves.len();
            self.leaves.push(leaf_hash(&receipt.message));
            self.committed.push(Committed {
                message: receipt.message,
                batch,
            });
            if let Some(slot) = self
                .txs
                .get_mut(&receipt.tx_hash)
                .and_then(|slots| slots.iter_mut().find(|s| s.is_none()))
            {
                *slot = Some(position);
            }
        }

        let count = self.leaves.len() as u64;
        let leaves = &self.leaves;
        let tree = self
            .trees
            .entry(count)
            .or_insert_with(|| MerkleTree::from_leaves(leaves.clone()));
        let root = MessageRoot::signed(batch, tree.root(), count, &self.signing_key);

        tracing::info!(
            batch = batch.0,
            messages = root.message_count,
            root = %hex::encode(root.root),
            "Batch sealed"
        );
        self.roots.push(root.clone());
        root
    }

    /// Collect every outbox, then seal.
    pub fn settle(&mut self, outboxes: &mut [&mut OutboundMessenger]) -> MessageRoot {
        for outbox in outboxes.iter_mut() {
            self.collect(outbox);
        }
        self.seal_batch()
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The published root of `batch`.
    #[must_use]
    pub fn root(&self, batch: BatchNumber) -> Option<&MessageRoot> {
        let index = usize::try_from(batch.0.checked_sub(1)?).ok()?;
        self.roots.get(index)
    }

    #[must_use]
    pub fn latest_root(&self) -> Option<&MessageRoot> {
        self.roots.last()
    }

    /// Messages collected but not sealed yet.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Messages committed under some root.
    #[must_use]
    pub fn committed_count(&self) -> usize {
        self.leaves.len()
    }

    /// Build an inclusion proof for `request`.
    ///
    /// # Errors
    /// - `TxNotFound` if no connected outbox emitted the transaction (or
    ///   the requested message of it) and it was never collected
    /// - `NotYetSettled` while the message is uncollected or queued, or
    ///   `block_tag` names a batch not published yet
    /// - `InvalidProof` if `block_tag` names a published root that does
    ///   not cover the message
    pub fn prove(&self, request: &ProofRequest) -> Result<InclusionProof> {
        let index = request.message_index.unwrap_or(0);
        let slot = self.txs.get(&request.tx_hash).and_then(|slots| slots.get(index));
        let position = match slot {
            Some(Some(position)) => *position,
            Some(None) => return Err(PotatoError::NotYetSettled(request.tx_hash)),
            None if index < self.emitted.emitted(&request.tx_hash) => {
                tracing::debug!(tx = %request.tx_hash, "Proof requested before collection");
                return Err(PotatoError::NotYetSettled(request.tx_hash));
            }
            None => return Err(PotatoError::TxNotFound(request.tx_hash)),
        };
        let committed = self
            .committed
            .get(position)
            .ok_or_else(|| PotatoError::Internal(format!("leaf {position} missing")))?;

        let root = match (request.block_tag, request.root_kind) {
            (Some(tag), _) => {
                let root = self
                    .root(tag)
                    .ok_or(PotatoError::NotYetSettled(request.tx_hash))?;
                if root.message_count <= position as u64 {
                    return Err(PotatoError::invalid_proof(format!(
                        "root of {tag} does not cover {}",
                        request.tx_hash
                    )));
                }
                Some(root)
            }
            (None, RootKind::Inclusion) => self.root(committed.batch),
            (None, RootKind::Latest) => self.latest_root(),
        }
        .ok_or_else(|| PotatoError::Internal(format!("no root covers leaf {position}")))?;

        let tree = self.trees.get(&root.message_count).ok_or_else(|| {
            PotatoError::Internal(format!("no sealed tree for {}", root.batch_number))
        })?;
        let path = tree
            .path(position)
            .ok_or_else(|| PotatoError::Internal(format!("no path for leaf {position}")))?;

        Ok(InclusionProof {
            root_ref: root.batch_number,
            message: committed.message.clone(),
            leaf_index: position as u64,
            path,
        })
    }

    /// Published roots with a batch number above `after`.
    #[must_use]
    pub fn published_after(&self, after: Option<BatchNumber>) -> Vec<MessageRoot> {
        self.roots
            .iter()
            .filter(|r| after.is_none_or(|a| r.batch_number > a))
            .cloned()
            .collect()
    }
}

impl ProofProvider for SettlementLayer {
    fn inclusion_proof(
        &self,
        request: &ProofRequest,
    ) -> impl Future<Output = Result<InclusionProof>> + Send {
        ready(self.prove(request))
    }
}

impl RootFeed for SettlementLayer {
    fn roots_after(&self, after: Option<BatchNumber>) -> Result<Vec<MessageRoot>> {
        Ok(self.published_after(after))
    }
}

fn poisoned() -> PotatoError {
    PotatoError::Internal("settlement layer lock poisoned".into())
}

/// Shared settlement layer: chains keep sealing through the write lock
/// while catchers read proofs and roots.
impl ProofProvider for RwLock<SettlementLayer> {
    fn inclusion_proof(
        &self,
        request: &ProofRequest,
    ) -> impl Future<Output = Result<InclusionProof>> + Send {
        let result = self
            .read()
            .map_err(|_| poisoned())
            .and_then(|layer| layer.prove(request));
        ready(result)
    }
}

impl RootFeed for RwLock<SettlementLayer> {
    fn roots_after(&self, after: Option<BatchNumber>) -> Result<Vec<MessageRoot>> {
        let layer = self.read().map_err(|_| poisoned())?;
        Ok(layer.published_after(after))
    }
}
