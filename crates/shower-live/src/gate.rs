use tracing::warn;

use shower_core::ValidationError;
use shower_core::validate::{ValidVote, validate_vote};
use shower_types::Vote;
use shower_types::api::VoteInput;

use crate::error::SubmitError;
use crate::reveal::RevealHandle;
use crate::store::VoteStore;

/// Front door for guesses: validation, the open/closed check and the
/// hand-off to the vote store, in that order.
///
/// There is no one-vote-per-person rule; the same name may guess twice.
#[derive(Clone)]
pub struct SubmissionGate {
    store: VoteStore,
    reveal: RevealHandle,
}

impl SubmissionGate {
    pub fn new(store: VoteStore, reveal: RevealHandle) -> Self {
        Self { store, reveal }
    }

    /// Follows the configured late-submission policy.
    pub fn can_submit(&self) -> bool {
        self.reveal.accepting_votes()
    }

    pub fn validate(&self, name: &str, choice: &str) -> Result<ValidVote, ValidationError> {
        validate_vote(name, choice)
    }

    /// The closed check and the vote's timestamp use the same instant, so
    /// under the closed policy nothing stamped at or after the target is
    /// stored, even between timer ticks.
    pub async fn submit(&self, input: VoteInput) -> Result<Vote, SubmitError> {
        self.validate(&input.name, input.choice())?;

        let now = self.store.now();
        if !self.reveal.accepts_at(now) {
            warn!("Guess from '{}' refused: guessing is closed", input.name.trim());
            return Err(SubmitError::Closed);
        }

        Ok(self.store.append_at(input, now).await?)
    }
}
