//! System-wide constants for the Hot Potato protocol.

/// Domain tag for fresh token identifiers.
pub const TOKEN_ID_DOMAIN: &[u8] = b"hotpotato:token_id:v1:";

/// Domain tag for throw transaction hashes.
pub const TX_HASH_DOMAIN: &[u8] = b"hotpotato:tx:v1:";

/// Domain tag prepended to the bytes a settlement layer signs for a root.
pub const ROOT_SIGNING_DOMAIN: &[u8] = b"hotpotato:root:v1:";

/// Prefix byte for Merkle leaf hashes.
pub const LEAF_PREFIX: u8 = 0x00;

/// Prefix byte for Merkle interior node hashes.
pub const NODE_PREFIX: u8 = 0x01;

/// Width of a token identifier in bytes.
pub const TOKEN_ID_LEN: usize = 32;

/// Width of an account reference in bytes.
pub const ACCOUNT_ID_LEN: usize = 20;

/// Maximum opaque payload carried by one outbound message.
pub const MAX_PAYLOAD_LEN: usize = 4096;

/// Maximum number of sibling hashes in an inclusion proof (2^32 leaves).
pub const MAX_PATH_DEPTH: usize = 32;

/// Default delay before the first catch retry, in milliseconds.
pub const DEFAULT_RETRY_INITIAL_MS: u64 = 1000;

/// Default upper bound for a single retry delay, in milliseconds.
pub const DEFAULT_RETRY_MAX_INTERVAL_MS: u64 = 30_000;

/// Default backoff multiplier between consecutive retries.
pub const DEFAULT_RETRY_MULTIPLIER: u32 = 2;

/// Default maximum number of catch attempts before giving up.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 20;

/// Default overall catch timeout, in milliseconds.
pub const DEFAULT_RETRY_TIMEOUT_MS: u64 = 600_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name.
pub const PROTOCOL_NAME: &str = "HotPotato";
