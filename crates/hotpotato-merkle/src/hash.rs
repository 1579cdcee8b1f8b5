//! Domain-separated hashing of leaves and interior nodes.

use hotpotato_types::{OutboundMessage, constants};
use sha2::{Digest, Sha256};

/// Hash of a committed message.
#[must_use]
pub fn leaf_hash(message: &OutboundMessage) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([constants::LEAF_PREFIX]);
    hasher.update(message.encode());
    hasher.finalize().into()
}

/// Hash of an interior node. Order matters: `left` is the lower index.
#[must_use]
pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([constants::NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Padding leaf. No encoded message is empty, so no real leaf can equal it.
#[must_use]
pub fn empty_leaf() -> [u8; 32] {
    Sha256::digest([constants::LEAF_PREFIX]).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_node_domains_differ() {
        let msg = OutboundMessage::dummy(1, 2, 0);
        let leaf = leaf_hash(&msg);
        // A node over the same bytes must not collide with the leaf.
        assert_ne!(leaf, node_hash(&leaf, &leaf));
        assert_ne!(leaf, empty_leaf());
    }

    #[test]
    fn node_hash_is_ordered() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(node_hash(&a, &b), node_hash(&b, &a));
    }

    #[test]
    fn leaf_hash_binds_payload() {
        let msg = OutboundMessage::dummy(1, 2, 0);
        let mut other = msg.clone();
        other.payload.push(0);
        assert_ne!(leaf_hash(&msg), leaf_hash(&other));
    }
}
