//! Inclusion-path verification.
//!
//! Recomputes a root from a leaf, its index and its sibling path, and
//! compares it by equality to a trusted root. No state is read or written.

use hotpotato_types::{OutboundMessage, PotatoError, Result, constants};

use crate::hash::{leaf_hash, node_hash};
use crate::tree::depth_for;

/// Recompute the root reached by hashing `leaf` up `path`.
///
/// Bit `i` of `index` says whether the running hash is the right (1) or
/// left (0) child at height `i`.
///
/// # Errors
/// Returns `InvalidProof` if the path is deeper than
/// [`constants::MAX_PATH_DEPTH`] or `index` does not fit in the path.
pub fn compute_root(leaf: [u8; 32], index: u64, path: &[[u8; 32]]) -> Result<[u8; 32]> {
    if path.len() > constants::MAX_PATH_DEPTH {
        return Err(PotatoError::invalid_proof(format!(
            "path depth {} exceeds {}",
            path.len(),
            constants::MAX_PATH_DEPTH
        )));
    }
    if index >> path.len() != 0 {
        return Err(PotatoError::invalid_proof(format!(
            "leaf index {index} does not fit a path of depth {}",
            path.len()
        )));
    }

    let mut current = leaf;
    let mut idx = index;
    for sibling in path {
        current = if idx & 1 == 0 {
            node_hash(&current, sibling)
        } else {
            node_hash(sibling, &current)
        };
        idx >>= 1;
    }
    Ok(current)
}

/// Check that `message` is leaf `index` of a tree with `leaf_count` leaves
/// and root `expected_root`.
///
/// # Errors
/// Returns `InvalidProof` on any mismatch.
pub fn verify_inclusion(
    message: &OutboundMessage,
    index: u64,
    path: &[[u8; 32]],
    expected_root: &[u8; 32],
    leaf_count: u64,
) -> Result<()> {
    if index >= leaf_count {
        return Err(PotatoError::invalid_proof(format!(
            "leaf index {index} outside root of {leaf_count} messages"
        )));
    }
    let depth = depth_for(leaf_count);
    if path.len() != depth {
        return Err(PotatoError::invalid_proof(format!(
            "path depth {} does not match tree depth {depth}",
            path.len()
        )));
    }
    let computed = compute_root(leaf_hash(message), index, path)?;
    if computed != *expected_root {
        return Err(PotatoError::invalid_proof(format!(
            "computed root {} != trusted root {}",
            hex::encode(computed),
            hex::encode(expected_root)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MerkleTree;

    fn setup(n: u64) -> (Vec<OutboundMessage>, MerkleTree) {
        let msgs: Vec<_> = (0..n).map(|seq| OutboundMessage::dummy(271, 260, seq)).collect();
        let tree = MerkleTree::from_messages(&msgs);
        (msgs, tree)
    }

    #[test]
    fn every_leaf_verifies() {
        for n in [1u64, 2, 3, 7, 8, 9] {
            let (msgs, tree) = setup(n);
            for (i, msg) in msgs.iter().enumerate() {
                let path = tree.path(i).unwrap();
                verify_inclusion(msg, i as u64, &path, &tree.root(), n)
                    .unwrap_or_else(|e| panic!("n={n} i={i}: {e}"));
            }
        }
    }

    #[test]
    fn flipped_path_bit_rejected() {
        let (msgs, tree) = setup(6);
        let path = tree.path(4).unwrap();
        for level in 0..path.len() {
            for bit in [0usize, 13, 255] {
                let mut bad = path.clone();
                bad[level][bit / 8] ^= 1 << (bit % 8);
                let err = verify_inclusion(&msgs[4], 4, &bad, &tree.root(), 6).unwrap_err();
                assert!(matches!(err, PotatoError::InvalidProof { .. }));
            }
        }
    }

    #[test]
    fn tampered_message_rejected() {
        let (msgs, tree) = setup(4);
        let path = tree.path(1).unwrap();

        let mut bad = msgs[1].clone();
        bad.payload[0] ^= 0x01;
        assert!(verify_inclusion(&bad, 1, &path, &tree.root(), 4).is_err());

        let mut bad = msgs[1].clone();
        bad.destination_chain_id.0 += 1;
        assert!(verify_inclusion(&bad, 1, &path, &tree.root(), 4).is_err());
    }

    #[test]
    fn wrong_index_rejected() {
        let (msgs, tree) = setup(4);
        let path = tree.path(1).unwrap();
        assert!(verify_inclusion(&msgs[1], 0, &path, &tree.root(), 4).is_err());
    }

    #[test]
    fn index_beyond_leaf_count_rejected() {
        let (msgs, tree) = setup(3);
        // Leaf 3 is padding; even a self-consistent path must be refused.
        let path = tree.path(2).unwrap();
        let err = verify_inclusion(&msgs[2], 3, &path, &tree.root(), 3).unwrap_err();
        assert!(format!("{err}").contains("outside root"));
    }

    #[test]
    fn path_length_must_match_depth() {
        let (msgs, tree) = setup(4);
        let mut path = tree.path(0).unwrap();
        path.push([0; 32]);
        let err = verify_inclusion(&msgs[0], 0, &path, &tree.root(), 4).unwrap_err();
        assert!(format!("{err}").contains("does not match tree depth"));
    }

    #[test]
    fn compute_root_rejects_oversized_index() {
        let err = compute_root([0; 32], 4, &[[0; 32], [0; 32]]).unwrap_err();
        assert!(matches!(err, PotatoError::InvalidProof { .. }));
        assert!(compute_root([0; 32], 0, &vec![[0; 32]; constants::MAX_PATH_DEPTH + 1]).is_err());
    }

    #[test]
    fn compute_root_is_pure() {
        let (msgs, tree) = setup(5);
        let path = tree.path(3).unwrap();
        let a = compute_root(leaf_hash(&msgs[3]), 3, &path).unwrap();
        let b = compute_root(leaf_hash(&msgs[3]), 3, &path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, tree.root());
    }
}
