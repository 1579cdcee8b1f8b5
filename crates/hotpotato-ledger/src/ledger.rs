//! Token ledger — the authoritative record of which potatoes live on a chain.
//!
//! The ledger owns every token record of its chain. Records are never
//! removed: a thrown or burned token keeps its id reserved, so a plain
//! `mint` can never resurrect it. The only way back to ACTIVE for a thrown
//! record is [`TokenLedger::mint_from_catch`], after the inbound verifier
//! has accepted a proof.

use std::collections::HashMap;

use hotpotato_types::{
    AccountId, ChainId, PotatoError, Result, ThrowReceipt, Token, TokenId, TokenPhase, constants,
};

use crate::outbox::OutboundMessenger;

/// Per-chain token ledger.
pub struct TokenLedger {
    chain_id: ChainId,
    /// All token records ever created on this chain, by id.
    tokens: HashMap<TokenId, Token>,
    /// Counter feeding [`TokenId::derive`] for fresh ids.
    mint_nonce: u64,
    max_payload_len: usize,
}

impl TokenLedger {
    /// Create an empty ledger for `chain_id`.
    #[must_use]
    pub fn new(chain_id: ChainId) -> Self {
        Self::with_max_payload(chain_id, constants::MAX_PAYLOAD_LEN)
    }

    /// Create an empty ledger with a custom payload limit.
    #[must_use]
    pub fn with_max_payload(chain_id: ChainId, max_payload_len: usize) -> Self {
        Self {
            chain_id,
            tokens: HashMap::new(),
            mint_nonce: 0,
            max_payload_len,
        }
    }

    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    // -----------------------------------------------------------------
    // Mint / burn
    // -----------------------------------------------------------------

    /// Mint a new ACTIVE token owned by `owner`.
    ///
    /// With `token_id == None` a fresh id is derived from this chain's id
    /// and the mint nonce.
    ///
    /// # Errors
    /// Returns `AlreadyExists` if the id has a record here in any phase.
    pub fn mint(&mut self, token_id: Option<TokenId>, owner: AccountId) -> Result<Token> {
        let id = match token_id {
            Some(id) => {
                if self.tokens.contains_key(&id) {
                    return Err(PotatoError::AlreadyExists(id));
                }
                id
            }
            None => self.fresh_id(),
        };

        let token = Token::new_active(id, owner, self.chain_id);
        self.tokens.insert(id, token.clone());

        tracing::info!(
            chain = self.chain_id.0,
            token = %id,
            owner = %owner,
            "Token minted"
        );
        Ok(token)
    }

    fn fresh_id(&mut self) -> TokenId {
        loop {
            let id = TokenId::derive(self.chain_id, self.mint_nonce);
            self.mint_nonce += 1;
            if !self.tokens.contains_key(&id) {
                return id;
            }
        }
    }

    /// Burn an ACTIVE token locally without throwing it. Terminal.
    ///
    /// # Errors
    /// `NotFound`, `InvalidPhase` or `NotOwner`.
    pub fn burn(&mut self, token_id: TokenId, caller: AccountId) -> Result<()> {
        self.check_owned(token_id, caller)?;
        let token = self.token_mut(token_id)?;
        token.mark_consumed()?;

        tracing::info!(chain = self.chain_id.0, token = %token_id, "Token burned");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Throw
    // -----------------------------------------------------------------

    /// Atomically burn `token_id` and emit one outbound message to
    /// `destination`.
    ///
    /// 1. Validate destination, payload size, phase and ownership
    /// 2. Move the token to THROWN (owner cleared)
    /// 3. Append the message to `messenger`
    ///
    /// Every check runs before step 2, and step 3 cannot fail, so either
    /// both effects happen or nothing changes.
    ///
    /// # Errors
    /// - `InvalidDestination` if `destination` is this chain
    /// - `Internal` if `messenger` belongs to another chain
    /// - `PayloadTooLarge` if `payload` exceeds the configured limit
    /// - `NotFound`, `InvalidPhase`, `NotOwner` from the ownership check
    pub fn burn_and_throw(
        &mut self,
        messenger: &mut OutboundMessenger,
        token_id: TokenId,
        caller: AccountId,
        destination: ChainId,
        payload: Vec<u8>,
    ) -> Result<ThrowReceipt> {
        if destination == self.chain_id {
            return Err(PotatoError::InvalidDestination(destination));
        }
        if messenger.chain_id() != self.chain_id {
            return Err(PotatoError::Internal(format!(
                "outbox of {} cannot emit for {}",
                messenger.chain_id(),
                self.chain_id
            )));
        }
        if payload.len() > self.max_payload_len {
            return Err(PotatoError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload_len,
            });
        }
        self.check_owned(token_id, caller)?;

        self.token_mut(token_id)?.mark_thrown()?;
        let receipt = messenger.append(destination, token_id, caller, payload);

        tracing::info!(
            chain = self.chain_id.0,
            token = %token_id,
            destination = destination.0,
            seq = receipt.message.sequence_number,
            "Token thrown"
        );
        Ok(receipt)
    }

    // -----------------------------------------------------------------
    // Catch
    // -----------------------------------------------------------------

    /// Side-effect-free precheck for [`Self::mint_from_catch`].
    ///
    /// # Errors
    /// Returns `AlreadyExists` if the id is ACTIVE or CONSUMED here.
    pub fn can_mint_from_catch(&self, token_id: TokenId) -> Result<()> {
        match self.tokens.get(&token_id).map(|t| t.phase) {
            None | Some(TokenPhase::Thrown) => Ok(()),
            Some(TokenPhase::Active | TokenPhase::Consumed) => {
                Err(PotatoError::AlreadyExists(token_id))
            }
        }
    }

    /// Mint a caught token for `owner`. Only the inbound verifier calls
    /// this, after a proof has been accepted.
    ///
    /// A token thrown away from this chain earlier is re-activated in
    /// place; an unknown id gets a new record with `origin` as its source.
    ///
    /// # Errors
    /// Returns `AlreadyExists` if the id is ACTIVE or CONSUMED here.
    pub fn mint_from_catch(
        &mut self,
        token_id: TokenId,
        owner: AccountId,
        origin: ChainId,
    ) -> Result<Token> {
        self.can_mint_from_catch(token_id)?;

        let token = match self.tokens.get_mut(&token_id) {
            Some(existing) => {
                existing.reactivate(owner, origin)?;
                existing.clone()
            }
            None => {
                let mut token = Token::new_active(token_id, owner, origin);
                token.catches = 1;
                self.tokens.insert(token_id, token.clone());
                token
            }
        };

        tracing::info!(
            chain = self.chain_id.0,
            token = %token_id,
            owner = %owner,
            origin = origin.0,
            "Token caught"
        );
        Ok(token)
    }

    // -----------------------------------------------------------------
    // Transfer
    // -----------------------------------------------------------------

    /// Move an ACTIVE token from `from` to `to` on this chain.
    ///
    /// # Errors
    /// `NotFound`, `InvalidPhase` or `NotOwner`.
    pub fn transfer(&mut self, token_id: TokenId, from: AccountId, to: AccountId) -> Result<()> {
        self.check_owned(token_id, from)?;
        self.token_mut(token_id)?.owner = Some(to);

        tracing::debug!(
            chain = self.chain_id.0,
            token = %token_id,
            from = %from,
            to = %to,
            "Token transferred"
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Look up a token record in any phase.
    #[must_use]
    pub fn get(&self, token_id: &TokenId) -> Option<&Token> {
        self.tokens.get(token_id)
    }

    #[must_use]
    pub fn phase_of(&self, token_id: &TokenId) -> Option<TokenPhase> {
        self.tokens.get(token_id).map(|t| t.phase)
    }

    /// Current owner of an ACTIVE token.
    ///
    /// # Errors
    /// `NotFound` if there is no record, `InvalidPhase` if it is not ACTIVE.
    pub fn owner_of(&self, token_id: &TokenId) -> Result<AccountId> {
        let token = self
            .tokens
            .get(token_id)
            .ok_or(PotatoError::NotFound(*token_id))?;
        token.owner.ok_or(PotatoError::InvalidPhase {
            token_id: *token_id,
            phase: token.phase,
        })
    }

    /// Number of ACTIVE tokens owned by `owner`.
    #[must_use]
    pub fn balance_of(&self, owner: &AccountId) -> usize {
        self.tokens.values().filter(|t| t.is_owned_by(owner)).count()
    }

    /// Number of ACTIVE tokens on this chain.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tokens.values().filter(|t| t.is_active()).count()
    }

    /// `true` if `token_id` is ACTIVE here.
    #[must_use]
    pub fn is_active(&self, token_id: &TokenId) -> bool {
        self.tokens.get(token_id).is_some_and(Token::is_active)
    }

    /// Every record on this chain, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    /// Number of records in any phase.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    // -----------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------

    fn check_owned(&self, token_id: TokenId, caller: AccountId) -> Result<()> {
        let token = self
            .tokens
            .get(&token_id)
            .ok_or(PotatoError::NotFound(token_id))?;
        if !token.is_active() {
            return Err(PotatoError::InvalidPhase {
                token_id,
                phase: token.phase,
            });
        }
        if token.owner != Some(caller) {
            return Err(PotatoError::NotOwner { token_id, caller });
        }
        Ok(())
    }

    fn token_mut(&mut self, token_id: TokenId) -> Result<&mut Token> {
        self.tokens
            .get_mut(&token_id)
            .ok_or(PotatoError::NotFound(token_id))
    }
}
