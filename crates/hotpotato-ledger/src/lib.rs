//! # hotpotato-ledger
//!
//! **Source-side chain state**: the authoritative token ledger and the
//! outbox of burn-and-throw messages.
//!
//! ## Architecture
//!
//! 1. **TokenLedger**: which token ids exist on this chain, who owns them,
//!    and their lifecycle phase
//! 2. **OutboundMessenger**: sequence-tagged outbox whose contents the
//!    settlement layer commits into its message roots
//! 3. **EmissionLog**: shared record of emitted throw transactions, so a
//!    proof provider can tell an uncollected throw from an unknown one
//!
//! ## Throw Flow
//!
//! ```text
//! TokenLedger.mint() → TokenLedger.burn_and_throw() → OutboundMessenger.append()
//!     → settlement layer seals the outbox into a MessageRoot
//! ```
//!
//! A throw either burns the token **and** emits exactly one message, or
//! changes nothing.

pub mod emission;
pub mod ledger;
pub mod outbox;

pub use emission::EmissionLog;
pub use ledger::TokenLedger;
pub use outbox::OutboundMessenger;
