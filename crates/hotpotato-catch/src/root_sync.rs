//! Root synchronizer — a destination chain's view of the settlement layer.
//!
//! Destination chains only trust roots they have explicitly imported. The
//! imported set is an asynchronously-updated replica of the settlement
//! layer's commitments, never a live read:
//!
//! ```text
//!   settlement layer ──publish──▶ RootFeed ──sync_from──▶ RootSynchronizer
//!                                                            │
//!                                   ensure_root_known(N) ◀───┘
//!                           Known(root) | Pending | Unreachable
//! ```
//!
//! Rules:
//! - every root must carry a valid signature of the trusted settlement key
//! - the first import sets the starting point; afterwards batches arrive
//!   strictly in order without gaps
//! - the set is append-only; nothing is ever revoked
//! - batches below the first import are never trusted here, so refs to
//!   them are `Unreachable` rather than `Pending`

use std::collections::BTreeMap;

use ed25519_dalek::VerifyingKey;
use hotpotato_types::{BatchNumber, MessageRoot, PotatoError, Result};

use crate::provider::RootFeed;

/// Answer of [`RootSynchronizer::ensure_root_known`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStatus<'a> {
    /// The root is trusted here.
    Known(&'a MessageRoot),
    /// The local view has not advanced to that batch yet. Wait and retry.
    Pending,
    /// The batch precedes the first imported root and will never be
    /// imported. Only a proof against a newer root can be checked here.
    Unreachable,
}

/// Append-only set of trusted message roots.
pub struct RootSynchronizer {
    trusted_key: VerifyingKey,
    roots: BTreeMap<BatchNumber, MessageRoot>,
}

impl RootSynchronizer {
    /// Create an empty synchronizer trusting roots signed by `trusted_key`.
    #[must_use]
    pub fn new(trusted_key: VerifyingKey) -> Self {
        Self {
            trusted_key,
            roots: BTreeMap::new(),
        }
    }

    /// Import a signed root.
    ///
    /// Returns `Ok(true)` if the root was added, `Ok(false)` if an identical
    /// root was already known.
    ///
    /// # Errors
    /// - `UntrustedRoot` if the signature does not verify
    /// - `RootConflict` if a different root is already trusted for the batch
    /// - `RootOutOfOrder` if the batch is not `latest + 1`
    pub fn import(&mut self, root: MessageRoot) -> Result<bool> {
        let batch = root.batch_number;
        if !root.verify_signature(&self.trusted_key) {
            tracing::warn!(batch = batch.0, "Rejected root with untrusted signature");
            return Err(PotatoError::UntrustedRoot(batch));
        }

        if let Some(known) = self.roots.get(&batch) {
            if known.same_commitment(&root) {
                tracing::debug!(batch = batch.0, "Root already known");
                return Ok(false);
            }
            tracing::warn!(
                batch = batch.0,
                known = %hex::encode(known.root),
                offered = %hex::encode(root.root),
                "Conflicting root for trusted batch"
            );
            return Err(PotatoError::RootConflict(batch));
        }

        if let Some(latest) = self.latest_batch() {
            let expected = latest.next();
            if batch != expected {
                return Err(PotatoError::RootOutOfOrder {
                    expected,
                    actual: batch,
                });
            }
        }

        tracing::info!(
            batch = batch.0,
            messages = root.message_count,
            root = %hex::encode(root.root),
            "Root imported"
        );
        self.roots.insert(batch, root);
        Ok(true)
    }

    /// Pull and import every root `feed` has beyond the latest known batch.
    /// Returns how many roots were added.
    ///
    /// # Errors
    /// Propagates feed errors and the first import error. Roots imported
    /// before the failure stay imported.
    pub fn sync_from<F: RootFeed + ?Sized>(&mut self, feed: &F) -> Result<usize> {
        let mut added = 0;
        for root in feed.roots_after(self.latest_batch())? {
            if self.import(root)? {
                added += 1;
            }
        }
        if added > 0 {
            tracing::debug!(added, latest = ?self.latest_batch().map(|b| b.0), "Roots synced");
        }
        Ok(added)
    }

    /// Is the root for `batch` trusted here yet?
    #[must_use]
    pub fn ensure_root_known(&self, batch: BatchNumber) -> RootStatus<'_> {
        match self.roots.get(&batch) {
            Some(root) => RootStatus::Known(root),
            None if self.first_batch().is_some_and(|first| batch < first) => {
                RootStatus::Unreachable
            }
            None => RootStatus::Pending,
        }
    }

    /// The oldest trusted batch, i.e. the first one imported.
    #[must_use]
    pub fn first_batch(&self) -> Option<BatchNumber> {
        self.roots.keys().next().copied()
    }

    /// The newest trusted root.
    #[must_use]
    pub fn latest(&self) -> Option<&MessageRoot> {
        self.roots.values().next_back()
    }

    #[must_use]
    pub fn latest_batch(&self) -> Option<BatchNumber> {
        self.roots.keys().next_back().copied()
    }

    /// The key roots must be signed with.
    #[must_use]
    pub fn trusted_key(&self) -> &VerifyingKey {
        &self.trusted_key
    }

    /// Number of trusted roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
