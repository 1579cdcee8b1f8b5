//! # Token — the potato
//!
//! A `Token` is a chain-local record of a non-fungible potato. The ledger of
//! each chain owns its records exclusively; the same `TokenId` may have a
//! record on several chains, but at most one of them is ACTIVE.
//!
//! ## State Machine
//!
//! ```text
//!                 burn_and_throw
//!   ┌────────┐ ─────────────────▶ ┌────────┐
//!   │ ACTIVE │                    │ THROWN │
//!   └───┬────┘ ◀───────────────── └────────┘
//!       │        mint_from_catch
//!       │ burn
//!       ▼
//!   ┌──────────┐
//!   │ CONSUMED │
//!   └──────────┘
//! ```
//!
//! - `Thrown → Active` is only reachable through a verified catch, never
//!   through a plain mint.
//! - `Consumed` is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, ChainId, PotatoError, Result, TokenId};

/// Lifecycle phase of a token record on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPhase {
    /// Live on this chain and owned by someone.
    Active,
    /// Burned here and sent to another chain. Owner cleared.
    Thrown,
    /// Burned here without a throw. **Irreversible.**
    Consumed,
}

impl TokenPhase {
    /// Can a record move from this phase to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Thrown | Self::Consumed) | (Self::Thrown, Self::Active)
        )
    }
}

impl std::fmt::Display for TokenPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Thrown => write!(f, "THROWN"),
            Self::Consumed => write!(f, "CONSUMED"),
        }
    }
}

/// A chain-local token record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Globally unique id, fixed at the original mint.
    pub id: TokenId,
    /// Current owner. `None` once the token leaves the ACTIVE phase.
    pub owner: Option<AccountId>,
    /// Current lifecycle phase on this chain.
    pub phase: TokenPhase,
    /// Where this record came from: this chain for a fresh mint, the
    /// throwing chain for a catch.
    pub origin: ChainId,
    /// Number of successful catches this record has gone through.
    pub catches: u32,
    /// When this record last became ACTIVE.
    pub activated_at: DateTime<Utc>,
}

impl Token {
    /// A freshly minted ACTIVE token.
    #[must_use]
    pub fn new_active(id: TokenId, owner: AccountId, origin: ChainId) -> Self {
        Self {
            id,
            owner: Some(owner),
            phase: TokenPhase::Active,
            origin,
            catches: 0,
            activated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == TokenPhase::Active
    }

    /// `true` if `account` currently owns this ACTIVE token.
    #[must_use]
    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        self.is_active() && self.owner.as_ref() == Some(account)
    }

    fn transition(&mut self, target: TokenPhase) -> Result<()> {
        if !self.phase.can_transition_to(target) {
            return Err(PotatoError::InvalidPhase {
                token_id: self.id,
                phase: self.phase,
            });
        }
        self.phase = target;
        Ok(())
    }

    /// ACTIVE → THROWN. Clears the owner.
    ///
    /// # Errors
    /// Returns `InvalidPhase` if the token is not ACTIVE.
    pub fn mark_thrown(&mut self) -> Result<()> {
        self.transition(TokenPhase::Thrown)?;
        self.owner = None;
        Ok(())
    }

    /// ACTIVE → CONSUMED. Clears the owner.
    ///
    /// # Errors
    /// Returns `InvalidPhase` if the token is not ACTIVE.
    pub fn mark_consumed(&mut self) -> Result<()> {
        self.transition(TokenPhase::Consumed)?;
        self.owner = None;
        Ok(())
    }

    /// THROWN → ACTIVE after a verified catch of a message from `origin`.
    ///
    /// # Errors
    /// Returns `InvalidPhase` if the token is not THROWN.
    pub fn reactivate(&mut self, owner: AccountId, origin: ChainId) -> Result<()> {
        self.transition(TokenPhase::Active)?;
        self.owner = Some(owner);
        self.origin = origin;
        self.catches += 1;
        self.activated_at = Utc::now();
        Ok(())
    }
}
