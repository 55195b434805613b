use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;
use crate::auth::AuthContext;
use crate::core::{error::EngineError, ledger, matcher, scoring};
use crate::models::{Preference, Profile, SwipeOutcome, UserId};
use crate::services::{Store, StoreUnit};

/// Lifecycle of one swipe transaction
///
/// `Started -> LedgerWritten -> [ScoreUpdated] -> [MatchChecked] -> Committed`,
/// with `Aborted` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeState {
    Started,
    LedgerWritten,
    ScoreUpdated,
    MatchChecked,
    Committed,
    Aborted,
}

impl SwipeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SwipeState::Committed | SwipeState::Aborted)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(self, next: SwipeState) -> bool {
        use SwipeState::*;

        match (self, next) {
            (s, Aborted) => !s.is_terminal(),
            (Started, LedgerWritten) => true,
            (LedgerWritten, ScoreUpdated | Committed) => true,
            (ScoreUpdated, MatchChecked) => true,
            (MatchChecked, Committed) => true,
            _ => false,
        }
    }

    fn advance(&mut self, next: SwipeState) {
        debug_assert!(
            self.can_advance_to(next),
            "illegal swipe transition {:?} -> {:?}",
            self,
            next
        );
        tracing::trace!(from = ?self, to = ?next, "Swipe state transition");
        *self = next;
    }
}

/// One attempt at recording a swipe inside a single unit of work
///
/// The unit rolls itself back when dropped uncommitted, which covers early
/// returns and unwinding as well as `abort`.
struct SwipeTransaction {
    unit: Box<dyn StoreUnit>,
    state: SwipeState,
}

impl SwipeTransaction {
    async fn open(store: &dyn Store) -> Result<Self, EngineError> {
        let unit = store.begin().await?;
        Ok(Self {
            unit,
            state: SwipeState::Started,
        })
    }

    async fn run(
        &mut self,
        actor: UserId,
        target: UserId,
        preference: Preference,
    ) -> Result<SwipeOutcome, EngineError> {
        ledger::lock_pair(self.unit.as_mut(), actor, target).await?;

        let swipe = ledger::record(self.unit.as_mut(), actor, target, preference).await?;
        self.state.advance(SwipeState::LedgerWritten);

        if !preference.is_yes() {
            return Ok(SwipeOutcome {
                swipe_id: swipe.id,
                matched: false,
                matched_user: None,
            });
        }

        scoring::bump(self.unit.as_mut(), target, preference).await?;
        self.state.advance(SwipeState::ScoreUpdated);

        let matched = matcher::check_mutual(self.unit.as_mut(), actor, target, preference).await?;
        self.state.advance(SwipeState::MatchChecked);

        let matched_user = if matched {
            Some(self.matched_profile(target).await?)
        } else {
            None
        };

        Ok(SwipeOutcome {
            swipe_id: swipe.id,
            matched,
            matched_user,
        })
    }

    async fn matched_profile(&mut self, user: UserId) -> Result<Profile, EngineError> {
        self.unit
            .fetch_profile(user)
            .await?
            .ok_or_else(|| EngineError::user_not_found(user))
    }

    async fn commit(self) -> Result<(), EngineError> {
        let SwipeTransaction { unit, mut state } = self;

        match unit.commit().await {
            Ok(()) => {
                state.advance(SwipeState::Committed);
                Ok(())
            }
            Err(e) => {
                state.advance(SwipeState::Aborted);
                Err(e.into())
            }
        }
    }

    fn abort(mut self) {
        tracing::debug!(state = ?self.state, "Rolling back swipe transaction");
        self.state.advance(SwipeState::Aborted);
    }
}

/// Records swipes and detects mutual matches atomically
#[derive(Clone)]
pub struct SwipeEngine {
    store: Arc<dyn Store>,
    max_serialization_retries: u32,
    retry_backoff: Duration,
}

impl SwipeEngine {
    pub fn new(store: Arc<dyn Store>, max_serialization_retries: u32) -> Self {
        Self {
            store,
            max_serialization_retries,
            retry_backoff: Duration::from_millis(20),
        }
    }

    /// Base delay before a retry; the n-th retry waits n times this long
    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Record `preference` from the authenticated user about `target`
    ///
    /// Writes the swipe, bumps the target's score on YES, checks for a
    /// reverse YES and commits, all in one unit of work. Both users' rows
    /// are locked first, so swipes sharing a user run one after the other.
    /// Any failure rolls the whole unit back before the error is returned.
    ///
    /// A serialization failure can only come from a store opened at
    /// `repeatable_read` or `serializable`. It re-runs the unit from scratch
    /// after a short backoff, up to the configured number of retries. No
    /// other error is retried.
    pub async fn execute(
        &self,
        auth: &AuthContext,
        target: UserId,
        preference: Preference,
    ) -> Result<SwipeOutcome, EngineError> {
        let actor = auth.user_id();
        if actor == target {
            return Err(EngineError::Validation("cannot swipe on yourself".to_string()));
        }

        let span = tracing::debug_span!(
            "swipe",
            txn = %Uuid::new_v4(),
            actor,
            target,
            %preference
        );

        async move {
            let mut attempt = 0;
            loop {
                match self.attempt(actor, target, preference).await {
                    Err(e) if e.is_serialization_failure() && attempt < self.max_serialization_retries => {
                        attempt += 1;
                        tracing::warn!(attempt, "Swipe transaction not serializable, retrying");
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                    Err(e) => {
                        match &e {
                            EngineError::Storage(err) => tracing::error!(%err, "Swipe transaction failed"),
                            other => tracing::debug!(%other, "Swipe rejected"),
                        }
                        return Err(e);
                    }
                    Ok(outcome) => {
                        if outcome.matched {
                            tracing::info!(actor, target, "Mutual match");
                        }
                        return Ok(outcome);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn attempt(
        &self,
        actor: UserId,
        target: UserId,
        preference: Preference,
    ) -> Result<SwipeOutcome, EngineError> {
        let mut txn = SwipeTransaction::open(self.store.as_ref()).await?;

        match txn.run(actor, target, preference).await {
            Ok(outcome) => {
                txn.commit().await?;
                Ok(outcome)
            }
            Err(e) => {
                txn.abort();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SwipeState::*;

    #[test]
    fn test_yes_path_transitions() {
        assert!(Started.can_advance_to(LedgerWritten));
        assert!(LedgerWritten.can_advance_to(ScoreUpdated));
        assert!(ScoreUpdated.can_advance_to(MatchChecked));
        assert!(MatchChecked.can_advance_to(Committed));
    }

    #[test]
    fn test_no_path_skips_scoring() {
        assert!(LedgerWritten.can_advance_to(Committed));
        assert!(!Started.can_advance_to(Committed));
        assert!(!ScoreUpdated.can_advance_to(Committed));
    }

    #[test]
    fn test_abort_only_from_non_terminal() {
        for state in [Started, LedgerWritten, ScoreUpdated, MatchChecked] {
            assert!(state.can_advance_to(Aborted), "{:?}", state);
        }
        assert!(!Committed.can_advance_to(Aborted));
        assert!(!Aborted.can_advance_to(Aborted));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!LedgerWritten.can_advance_to(Started));
        assert!(!Committed.can_advance_to(Started));
        assert!(!MatchChecked.can_advance_to(ScoreUpdated));
    }
}
