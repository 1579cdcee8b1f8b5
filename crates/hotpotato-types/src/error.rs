//! Error types for the Hot Potato protocol.
//!
//! All errors use the `HP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Token ledger errors (caller errors, non-retryable)
//! - 2xx: Settlement lag (transient, retryable)
//! - 3xx: Inbound verification errors (terminal, non-retryable)
//! - 4xx: Root synchronization errors
//! - 5xx: Protocol orchestration errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, BatchNumber, ChainId, MessageKey, TokenId, TokenPhase, TxHash};

/// Central error enum for all Hot Potato operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PotatoError {
    // =================================================================
    // Ledger Errors (1xx)
    // =================================================================
    /// The token id is already in use on this chain.
    #[error("HP_ERR_100: Token already exists: {0}")]
    AlreadyExists(TokenId),

    /// No token with this id has ever existed on this chain.
    #[error("HP_ERR_101: Token not found: {0}")]
    NotFound(TokenId),

    /// The caller does not own the token.
    #[error("HP_ERR_102: {caller} is not the owner of {token_id}")]
    NotOwner { token_id: TokenId, caller: AccountId },

    /// The token exists but is not in a phase that allows the operation.
    #[error("HP_ERR_103: Token {token_id} is {phase}, expected ACTIVE")]
    InvalidPhase { token_id: TokenId, phase: TokenPhase },

    /// A token cannot be thrown to the chain it is already on.
    #[error("HP_ERR_104: Invalid destination {0}")]
    InvalidDestination(ChainId),

    /// The referenced transaction is unknown to the proof provider.
    #[error("HP_ERR_105: Transaction not found: {0}")]
    TxNotFound(TxHash),

    /// The token metadata payload is larger than the configured limit.
    #[error("HP_ERR_106: Payload of {len} bytes exceeds limit {max}")]
    PayloadTooLarge { len: usize, max: usize },

    // =================================================================
    // Settlement Lag (2xx) — retryable
    // =================================================================
    /// The batch carrying the message has not been committed yet.
    #[error("HP_ERR_200: Message from {0} not yet settled")]
    NotYetSettled(TxHash),

    /// The destination chain has not imported the referenced root yet.
    #[error("HP_ERR_201: Root {0} not yet imported")]
    RootNotSettled(BatchNumber),

    // =================================================================
    // Verification Errors (3xx) — terminal
    // =================================================================
    /// The proof does not hash-chain to the trusted root.
    #[error("HP_ERR_300: Invalid inclusion proof: {reason}")]
    InvalidProof { reason: String },

    /// The message has already been consumed on this chain (replay).
    #[error("HP_ERR_301: Message already consumed: {0}")]
    AlreadyConsumed(MessageKey),

    // =================================================================
    // Root Synchronization Errors (4xx)
    // =================================================================
    /// The root's signature does not come from the trusted settlement key.
    #[error("HP_ERR_400: Untrusted root for {0}")]
    UntrustedRoot(BatchNumber),

    /// Roots must be imported in increasing order without gaps.
    #[error("HP_ERR_401: Root out of order: expected {expected}, got {actual}")]
    RootOutOfOrder {
        expected: BatchNumber,
        actual: BatchNumber,
    },

    /// A different root was presented for an already-trusted batch.
    #[error("HP_ERR_402: Conflicting root for {0}")]
    RootConflict(BatchNumber),

    /// The referenced batch precedes the first root this chain imported and
    /// can never become trusted here. Ask for a proof against a newer root.
    #[error("HP_ERR_403: Root {0} predates the trusted root set")]
    RootUnreachable(BatchNumber),

    // =================================================================
    // Protocol Errors (5xx)
    // =================================================================
    /// The retry policy gave up while the catch was still pending.
    #[error("HP_ERR_500: Catch abandoned after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// A token was observed ACTIVE on more than one chain. Critical safety alert.
    #[error("HP_ERR_501: Custody invariant violation: {reason}")]
    CustodyViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("HP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Wire encoding / decoding error.
    #[error("HP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("HP_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Broad classification used by retry loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller error against local state. Surface immediately.
    Local,
    /// Settlement lag. The only class a retry loop may act on.
    Transient,
    /// Malicious or duplicate submission. Surface immediately.
    Terminal,
    /// Feed, configuration or internal failure.
    Fault,
}

impl PotatoError {
    /// Classify this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AlreadyExists(_)
            | Self::NotFound(_)
            | Self::NotOwner { .. }
            | Self::InvalidPhase { .. }
            | Self::InvalidDestination(_)
            | Self::TxNotFound(_)
            | Self::PayloadTooLarge { .. } => ErrorClass::Local,
            Self::NotYetSettled(_) | Self::RootNotSettled(_) => ErrorClass::Transient,
            Self::InvalidProof { .. } | Self::AlreadyConsumed(_) | Self::RootUnreachable(_) => {
                ErrorClass::Terminal
            }
            Self::UntrustedRoot(_)
            | Self::RootOutOfOrder { .. }
            | Self::RootConflict(_)
            | Self::RetriesExhausted { .. }
            | Self::CustodyViolation { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Configuration(_) => ErrorClass::Fault,
        }
    }

    /// Whether an automated retry loop may act on this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Shorthand for [`PotatoError::InvalidProof`].
    pub fn invalid_proof(reason: impl Into<String>) -> Self {
        Self::InvalidProof {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PotatoError>;

impl From<serde_json::Error> for PotatoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
