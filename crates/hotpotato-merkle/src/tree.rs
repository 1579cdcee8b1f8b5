//! Binary Merkle tree over committed messages.
//!
//! Leaves are padded with [`empty_leaf`] up to the next power of two, so the
//! path length of every leaf equals [`depth_for`] of the leaf count. An empty
//! tree has the empty-leaf hash as its root.

use hotpotato_types::OutboundMessage;

use crate::hash::{empty_leaf, leaf_hash, node_hash};

/// Tree depth (= proof path length) for `leaf_count` leaves.
#[must_use]
pub fn depth_for(leaf_count: u64) -> usize {
    if leaf_count <= 1 {
        0
    } else {
        leaf_count
            .checked_next_power_of_two()
            .map_or(64, |width| width.trailing_zeros() as usize)
    }
}

/// A fully materialized tree. `levels[0]` are the padded leaves, the last
/// level holds the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<[u8; 32]>>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree from leaf hashes, in order.
    #[must_use]
    pub fn from_leaves(leaves: Vec<[u8; 32]>) -> Self {
        let leaf_count = leaves.len();
        let width = leaf_count.max(1).next_power_of_two();
        let mut level = leaves;
        level.resize(width, empty_leaf());

        let mut levels = vec![level];
        while levels.last().is_some_and(|l| l.len() > 1) {
            let next: Vec<[u8; 32]> = levels
                .last()
                .map(|l| l.chunks(2).map(|pair| node_hash(&pair[0], &pair[1])).collect())
                .unwrap_or_default();
            levels.push(next);
        }
        Self { levels, leaf_count }
    }

    /// Build a tree over messages, in commitment order.
    #[must_use]
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a OutboundMessage>) -> Self {
        Self::from_leaves(messages.into_iter().map(leaf_hash).collect())
    }

    #[must_use]
    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|l| l.first().copied())
            .unwrap_or_else(empty_leaf)
    }

    /// Number of real (unpadded) leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Sibling path for the leaf at `index`, or `None` if out of range.
    #[must_use]
    pub fn path(&self, index: usize) -> Option<Vec<[u8; 32]>> {
        if index >= self.leaf_count {
            return None;
        }
        let mut idx = index;
        let mut path = Vec::with_capacity(self.depth());
        for level in &self.levels[..self.depth()] {
            path.push(level[idx ^ 1]);
            idx >>= 1;
        }
        Some(path)
    }
}
