//! At-most-once rating gate.
//!
//! ```text
//! Unrated ──first accepted vote──▶ Rated(vote)
//! Rated   ──any vote──▶ Rated (rejected: AlreadyRated)
//! any     ──new submission──▶ Unrated
//! ```
//!
//! The gate only decides; the caller performs the store update between
//! [`RatingGate::check`] and [`RatingGate::commit`], so a failed update
//! leaves the gate `Unrated`.

use thiserror::Error;

use crate::store::{RecordKey, Vote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Unrated,
    Rated(Vote),
}

/// Why a rating action was refused.  Neither case touches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("a rating was already submitted for this result")]
    AlreadyRated,

    #[error("there is no result to rate yet")]
    NothingToRate,
}

#[derive(Debug, Clone, Default)]
pub struct RatingGate {
    state: GateState,
}

impl RatingGate {
    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, GateState::Rated(_))
    }

    /// Back to `Unrated` for a new submission.
    pub fn reset(&mut self) {
        self.state = GateState::Unrated;
    }

    /// Decide whether a vote for `key` may go to the store.
    ///
    /// Checked in order: an earlier accepted vote, then a missing key or
    /// empty output.  Returns the key to update.
    pub fn check(&self, key: Option<&RecordKey>, has_output: bool) -> Result<RecordKey, RatingError> {
        if self.is_submitted() {
            return Err(RatingError::AlreadyRated);
        }
        match key {
            Some(key) if has_output => Ok(key.clone()),
            _ => Err(RatingError::NothingToRate),
        }
    }

    /// Record that `vote` was persisted.
    pub fn commit(&mut self, vote: Vote) {
        debug_assert!(!self.is_submitted(), "commit after an accepted vote");
        self.state = GateState::Rated(vote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_gate_without_output_has_nothing_to_rate() {
        let gate = RatingGate::default();
        assert_eq!(gate.check(None, false), Err(RatingError::NothingToRate));
    }

    #[test]
    fn key_without_output_has_nothing_to_rate() {
        let gate = RatingGate::default();
        let key = RecordKey::generate();
        assert_eq!(gate.check(Some(&key), false), Err(RatingError::NothingToRate));
    }

    #[test]
    fn unrated_with_output_returns_key() {
        let gate = RatingGate::default();
        let key = RecordKey::generate();
        assert_eq!(gate.check(Some(&key), true), Ok(key));
    }

    #[test]
    fn second_vote_is_rejected_either_direction() {
        let mut gate = RatingGate::default();
        let key = RecordKey::generate();

        gate.check(Some(&key), true).unwrap();
        gate.commit(Vote::Up);

        assert_eq!(gate.state(), GateState::Rated(Vote::Up));
        assert_eq!(gate.check(Some(&key), true), Err(RatingError::AlreadyRated));
        assert_eq!(gate.check(Some(&key), true), Err(RatingError::AlreadyRated));
    }

    #[test]
    fn already_rated_wins_over_nothing_to_rate() {
        let mut gate = RatingGate::default();
        gate.commit(Vote::Down);
        assert_eq!(gate.check(None, false), Err(RatingError::AlreadyRated));
    }

    #[test]
    fn reset_reopens_the_gate() {
        let mut gate = RatingGate::default();
        gate.commit(Vote::Down);
        gate.reset();

        assert!(!gate.is_submitted());
        assert_eq!(gate.state(), GateState::Unrated);
    }
}
