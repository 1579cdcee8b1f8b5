//! # hotpotato-merkle
//!
//! **Pure commitment scheme for Hot Potato messages.**
//!
//! Everything here is a side-effect-free function of its inputs:
//!
//! - **Leaf hashing**: `SHA-256(0x00 || canonical message bytes)`
//! - **Node hashing**: `SHA-256(0x01 || left || right)`
//! - **Trees**: leaves padded to a power of two with the empty-leaf hash
//! - **Verification**: recompute a root from a leaf, its index and sibling path
//!
//! The same functions run on the settlement side (building roots) and the
//! destination side (checking proofs), so both hash the same bytes.

pub mod hash;
pub mod tree;
pub mod verify;

pub use hash::{empty_leaf, leaf_hash, node_hash};
pub use tree::{MerkleTree, depth_for};
pub use verify::{compute_root, verify_inclusion};
