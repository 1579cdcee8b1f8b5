//! Catch-and-mint orchestration.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────────┐  proof   ┌────────────────────┐  valid   ┌──────────┐  mint  ┌────────┐
//!   │ AwaitingProof │ ───────▶ │ AwaitingSettlement │ ───────▶ │ Verified │ ─────▶ │ Minted │
//!   └──┬─────────▲──┘          └──┬──────────▲──────┘          └────┬─────┘        └────────┘
//!      │         │ NotYetSettled  │          │ RootNotSettled       │
//!      │         └──              │          └──                    │
//!      │ error                    │ InvalidProof / AlreadyConsumed  │ AlreadyExists
//!      ▼                          ▼                                 ▼
//!   ┌────────────────────────────────────────────────────────────────────┐
//!   │ Rejected                           (also: retry policy exhausted)  │
//!   └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`CatchAndMint::step`] performs exactly one transition. The only
//! transitions that loop are the two "not ready yet" waits; everything else
//! is decided by the proof and the destination's state.
//!
//! A proof against a root older than anything the destination imported
//! (`RootUnreachable`) can never verify there. The catch then goes back to
//! `AwaitingProof` once, asking for a [`RootKind::Latest`] proof instead.
//!
//! [`CatchAndMint::run`] drives `step` with the configured [`RetryPolicy`],
//! pulling new roots from a [`RootFeed`] between attempts. Giving up does
//! **not** un-throw anything: the token stays THROWN on its source chain
//! until somebody holding the proof submits the catch.

use hotpotato_types::{
    AccountId, BatchNumber, InclusionProof, PotatoError, ProofRequest, ProtocolConfig, Result,
    RetryPolicy, RootKind, ThrowReceipt, Token,
};
use tokio::time::{Instant, sleep};

use crate::chain::Chain;
use crate::provider::{ProofProvider, RootFeed};
use crate::verifier::VerifiedMessage;

/// Where a catch currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchState {
    /// Holding a transaction reference, no proof yet.
    AwaitingProof,
    /// Holding a proof whose root the destination may not trust yet.
    AwaitingSettlement(InclusionProof),
    /// Proof accepted; ready to mint.
    Verified(VerifiedMessage),
    /// Terminal success.
    Minted(Token),
    /// Terminal failure.
    Rejected(PotatoError),
}

impl CatchState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Minted(_) | Self::Rejected(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingProof => "AWAITING_PROOF",
            Self::AwaitingSettlement(_) => "AWAITING_SETTLEMENT",
            Self::Verified(_) => "VERIFIED",
            Self::Minted(_) => "MINTED",
            Self::Rejected(_) => "REJECTED",
        }
    }
}

impl std::fmt::Display for CatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single [`CatchAndMint::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to a new non-terminal state.
    Advanced,
    /// Stayed put on a retryable "not ready yet" signal.
    Waiting(PotatoError),
    /// The catch is in a terminal state.
    Finished,
}

/// One catch of one thrown token.
pub struct CatchAndMint {
    request: ProofRequest,
    caller: AccountId,
    policy: RetryPolicy,
    state: CatchState,
    /// Number of attempts that ended waiting.
    attempts: u32,
}

impl CatchAndMint {
    /// Start a catch of the message emitted by `request.tx_hash`, minting
    /// to `caller`.
    #[must_use]
    pub fn new(request: ProofRequest, caller: AccountId, policy: RetryPolicy) -> Self {
        Self {
            request,
            caller,
            policy,
            state: CatchState::AwaitingProof,
            attempts: 0,
        }
    }

    /// Start a catch of `receipt` using `config`'s root kind and retry policy.
    #[must_use]
    pub fn for_receipt(receipt: &ThrowReceipt, caller: AccountId, config: &ProtocolConfig) -> Self {
        Self::new(
            ProofRequest::new(receipt.tx_hash, config.root_kind),
            caller,
            config.retry.clone(),
        )
    }

    #[must_use]
    pub fn state(&self) -> &CatchState {
        &self.state
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Perform one transition against the destination `chain`.
    pub async fn step<P: ProofProvider>(
        &mut self,
        chain: &mut Chain,
        provider: &P,
    ) -> StepOutcome {
        let state = std::mem::replace(&mut self.state, CatchState::AwaitingProof);
        let was_terminal = state.is_terminal();
        let (next, outcome) = match state {
            CatchState::AwaitingProof => match provider.inclusion_proof(&self.request).await {
                Ok(proof) => (CatchState::AwaitingSettlement(proof), StepOutcome::Advanced),
                Err(err) if err.is_retryable() => {
                    (CatchState::AwaitingProof, StepOutcome::Waiting(err))
                }
                Err(err) => (CatchState::Rejected(err), StepOutcome::Finished),
            },
            CatchState::AwaitingSettlement(proof) => match chain.verify(&proof) {
                Ok(verified) => (CatchState::Verified(verified), StepOutcome::Advanced),
                Err(err) if err.is_retryable() => (
                    CatchState::AwaitingSettlement(proof),
                    StepOutcome::Waiting(err),
                ),
                Err(PotatoError::RootUnreachable(batch)) if self.can_retarget() => {
                    self.retarget_latest(chain, batch);
                    (CatchState::AwaitingProof, StepOutcome::Advanced)
                }
                Err(err) => (CatchState::Rejected(err), StepOutcome::Finished),
            },
            CatchState::Verified(verified) => match chain.consume(verified, self.caller) {
                Ok(token) => (CatchState::Minted(token), StepOutcome::Finished),
                Err(err) => (CatchState::Rejected(err), StepOutcome::Finished),
            },
            terminal @ (CatchState::Minted(_) | CatchState::Rejected(_)) => {
                (terminal, StepOutcome::Finished)
            }
        };

        match &next {
            _ if was_terminal => {}
            CatchState::Minted(token) => tracing::info!(
                chain = chain.id().0,
                token = %token.id,
                owner = %self.caller,
                "Catch minted"
            ),
            CatchState::Rejected(err) => tracing::warn!(
                chain = chain.id().0,
                tx = %self.request.tx_hash,
                error = %err,
                "Catch rejected"
            ),
            _ => {}
        }
        self.state = next;
        outcome
    }

    /// Drive the catch to a terminal state.
    ///
    /// Retries only on `NotYetSettled` / `RootNotSettled`, waiting
    /// [`RetryPolicy::delay_after`] between attempts and syncing roots from
    /// `feed` before each retry. Any other error is returned immediately.
    ///
    /// # Errors
    /// - the terminal error that rejected the catch
    /// - `RetriesExhausted` once the policy gives up
    pub async fn run<P, F>(&mut self, chain: &mut Chain, provider: &P, feed: &F) -> Result<Token>
    where
        P: ProofProvider,
        F: RootFeed + ?Sized,
    {
        let started = Instant::now();
        if !self.state.is_terminal() {
            chain.sync_roots(feed).map_err(|err| self.abort(err))?;
        }

        loop {
            match self.step(chain, provider).await {
                StepOutcome::Advanced => {}
                StepOutcome::Finished => return self.outcome(),
                StepOutcome::Waiting(pending) => {
                    self.attempts += 1;
                    let delay = self.policy.delay_after(self.attempts);
                    let out_of_time = self
                        .policy
                        .timeout
                        .is_some_and(|limit| started.elapsed() + delay > limit);

                    if self.attempts >= self.policy.max_attempts || out_of_time {
                        tracing::warn!(
                            chain = chain.id().0,
                            tx = %self.request.tx_hash,
                            attempts = self.attempts,
                            last = %pending,
                            "Catch abandoned; token stays THROWN on its source chain until the proof is submitted"
                        );
                        return Err(self.abort(PotatoError::RetriesExhausted {
                            attempts: self.attempts,
                            last: pending.to_string(),
                        }));
                    }

                    tracing::debug!(
                        chain = chain.id().0,
                        state = %self.state,
                        attempt = self.attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Catch waiting for settlement"
                    );
                    sleep(delay).await;

                    chain.sync_roots(feed).map_err(|err| self.abort(err))?;
                }
            }
        }
    }

    /// The request still pins an old root.
    fn can_retarget(&self) -> bool {
        self.request.root_kind != RootKind::Latest || self.request.block_tag.is_some()
    }

    fn retarget_latest(&mut self, chain: &Chain, stale: BatchNumber) {
        tracing::info!(
            chain = chain.id().0,
            tx = %self.request.tx_hash,
            stale = stale.0,
            first_trusted = ?chain.roots().first_batch().map(|b| b.0),
            "Proof root predates the trusted set; requesting a proof against the latest root"
        );
        self.request.root_kind = RootKind::Latest;
        self.request.block_tag = None;
    }

    fn abort(&mut self, err: PotatoError) -> PotatoError {
        self.state = CatchState::Rejected(err.clone());
        err
    }

    fn outcome(&self) -> Result<Token> {
        match &self.state {
            CatchState::Minted(token) => Ok(token.clone()),
            CatchState::Rejected(err) => Err(err.clone()),
            other => Err(PotatoError::Internal(format!(
                "catch finished in non-terminal state {other}"
            ))),
        }
    }
}
