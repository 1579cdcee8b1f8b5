//! # hotpotato-catch
//!
//! **Catch plane**: everything a destination chain needs to accept a
//! thrown potato, plus the settlement layer that connects the chains.
//!
//! ## Architecture
//!
//! 1. **RootSynchronizer**: the destination's append-only replica of the
//!    settlement layer's signed message roots
//! 2. **ConsumptionRecord**: every message key ever consumed here
//! 3. **InboundVerifier**: proof validation + replay protection + mint
//! 4. **Chain**: one chain's ledger, outbox, roots and verifier
//! 5. **SettlementLayer**: seals outboxes into signed cumulative roots and
//!    serves inclusion proofs ([`ProofProvider`], [`RootFeed`])
//! 6. **CatchAndMint**: the per-catch state machine and its retry loop
//! 7. **custody**: cross-chain single-custody invariant checker
//!
//! ## Catch Flow
//!
//! ```text
//! ProofProvider.inclusion_proof() → RootSynchronizer.ensure_root_known()
//!     → InboundVerifier.verify() → InboundVerifier.consume()
//!     → TokenLedger.mint_from_catch()
//! ```

pub mod chain;
pub mod consumption;
pub mod custody;
pub mod protocol;
pub mod provider;
pub mod root_sync;
pub mod settlement;
pub mod verifier;

pub use chain::Chain;
pub use consumption::ConsumptionRecord;
pub use custody::{active_holder, assert_single_custody, audit_custody};
pub use protocol::{CatchAndMint, CatchState, StepOutcome};
pub use provider::{ProofProvider, RootFeed};
pub use root_sync::{RootStatus, RootSynchronizer};
pub use settlement::SettlementLayer;
pub use verifier::{InboundVerifier, VerifiedMessage};
