//! # hotpotato-types
//!
//! Shared types, errors, and configuration for the **Hot Potato** protocol.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ChainId`], [`TokenId`], [`AccountId`], [`TxHash`], [`BatchNumber`], [`MessageKey`]
//! - **Token model**: [`Token`], [`TokenPhase`]
//! - **Message model**: [`OutboundMessage`], [`ThrowReceipt`] and the canonical wire codec
//! - **Settlement model**: [`MessageRoot`], [`InclusionProof`], [`ProofRequest`], [`RootKind`]
//! - **Configuration**: [`ProtocolConfig`], [`RetryPolicy`]
//! - **Errors**: [`PotatoError`] with `HP_ERR_` prefix codes
//! - **Constants**: domain tags, limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod message;
pub mod proof;
pub mod token;
mod wire;

// Re-export all primary types at crate root for ergonomic imports:
//   use hotpotato_types::{Token, TokenPhase, OutboundMessage, ...};

pub use config::*;
pub use error::*;
pub use ids::*;
pub use message::*;
pub use proof::*;
pub use token::*;

// Constants are accessed via `hotpotato_types::constants::FOO`
// (not re-exported to avoid name collisions).
