//! Single-custody invariant checker.
//!
//! Invariant enforced across every participating chain:
//! ```text
//! ∀ token_id: |{ chain : ledger(chain)[token_id].phase == ACTIVE }| ≤ 1
//! ```
//!
//! A token in flight (THROWN at the source, not yet caught) is ACTIVE
//! nowhere, which is allowed. Two ACTIVE copies mean a proof was forged or
//! replayed, and is reported as a critical [`PotatoError::CustodyViolation`].

use std::collections::{BTreeMap, BTreeSet};

use hotpotato_ledger::TokenLedger;
use hotpotato_types::{ChainId, PotatoError, Result, TokenId};

/// The chain on which `token_id` is ACTIVE, if any.
///
/// # Errors
/// Returns `CustodyViolation` if it is ACTIVE on more than one chain.
pub fn active_holder<'a>(
    ledgers: impl IntoIterator<Item = &'a TokenLedger>,
    token_id: &TokenId,
) -> Result<Option<ChainId>> {
    let holders: Vec<ChainId> = ledgers
        .into_iter()
        .filter(|ledger| ledger.is_active(token_id))
        .map(TokenLedger::chain_id)
        .collect();
    match holders.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some(*one)),
        many => Err(violation(token_id, many)),
    }
}

/// Check the single-custody invariant for one token.
///
/// # Errors
/// Returns `CustodyViolation` if the token is ACTIVE on more than one chain.
pub fn assert_single_custody<'a>(
    ledgers: impl IntoIterator<Item = &'a TokenLedger>,
    token_id: &TokenId,
) -> Result<()> {
    active_holder(ledgers, token_id).map(|_| ())
}

/// Check the single-custody invariant for every token any ledger has ever
/// seen. Returns how many tokens are ACTIVE somewhere.
///
/// # Errors
/// Returns `CustodyViolation` for the first token (in id order) that is
/// ACTIVE on more than one chain.
pub fn audit_custody(ledgers: &[&TokenLedger]) -> Result<usize> {
    let mut active: BTreeMap<TokenId, BTreeSet<ChainId>> = BTreeMap::new();
    for ledger in ledgers {
        for token in ledger.iter().filter(|t| t.is_active()) {
            active.entry(token.id).or_default().insert(ledger.chain_id());
        }
    }

    for (token_id, chains) in &active {
        if chains.len() > 1 {
            let chains: Vec<ChainId> = chains.iter().copied().collect();
            return Err(violation(token_id, &chains));
        }
    }
    tracing::debug!(chains = ledgers.len(), active = active.len(), "Custody audit passed");
    Ok(active.len())
}

fn violation(token_id: &TokenId, chains: &[ChainId]) -> PotatoError {
    let chains = chains
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    tracing::error!(token = %token_id, chains = %chains, "Custody invariant violated");
    PotatoError::CustodyViolation {
        reason: format!("{token_id} is ACTIVE on {chains}"),
    }
}
