use std::fmt;

use crate::skland::types::Award;

/// States of one character's check-in.
///
/// Each character flows through: PENDING → ATTEMPTING → {SUCCEEDED, ALREADY_DONE, GAVE_UP}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInState {
    Pending,
    Attempting,
    Succeeded,
    AlreadyDone,
    GaveUp,
}

impl CheckInState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckInState::Succeeded | CheckInState::AlreadyDone | CheckInState::GaveUp
        )
    }
}

impl fmt::Display for CheckInState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInState::Pending => write!(f, "PENDING"),
            CheckInState::Attempting => write!(f, "ATTEMPTING"),
            CheckInState::Succeeded => write!(f, "SUCCEEDED"),
            CheckInState::AlreadyDone => write!(f, "ALREADY_DONE"),
            CheckInState::GaveUp => write!(f, "GAVE_UP"),
        }
    }
}

/// Classified result of a single check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(Vec<Award>),
    AlreadyCheckedIn,
    /// Structured rejection; `raw` is the payload for diagnosis.
    Failure { message: String, raw: String },
    NetworkError(String),
}

/// The result of evaluating an attempt outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Try again; `attempt` is the number of failed attempts so far.
    Retry { attempt: u32 },
    /// Stop in the given terminal state.
    Complete(CheckInState),
}

/// Retry bookkeeping for one character. Owned exclusively by that
/// character's task.
#[derive(Debug, Clone)]
pub struct CharacterRun {
    pub state: CheckInState,
    pub state_history: Vec<CheckInState>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl CharacterRun {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: CheckInState::Pending,
            state_history: Vec::new(),
            retry_count: 0,
            max_retries,
        }
    }

    /// Marks the start of an attempt.
    pub fn begin_attempt(&mut self) {
        if self.state != CheckInState::Attempting && !self.state.is_terminal() {
            self.enter(CheckInState::Attempting);
        }
    }

    /// Computes and applies the transition for `outcome`.
    ///
    /// - `Success` and `AlreadyCheckedIn` complete immediately.
    /// - `Failure` and `NetworkError` increment the retry counter and retry
    ///   until `max_retries` failed attempts, then complete as `GaveUp`.
    /// - Terminal states absorb any further outcome.
    pub fn next(&mut self, outcome: &AttemptOutcome) -> Transition {
        if self.state.is_terminal() {
            return Transition::Complete(self.state);
        }

        let transition = match outcome {
            AttemptOutcome::Success(_) => Transition::Complete(CheckInState::Succeeded),
            AttemptOutcome::AlreadyCheckedIn => Transition::Complete(CheckInState::AlreadyDone),
            AttemptOutcome::Failure { .. } | AttemptOutcome::NetworkError(_) => {
                self.retry_count += 1;
                if self.retry_count < self.max_retries {
                    Transition::Retry {
                        attempt: self.retry_count,
                    }
                } else {
                    Transition::Complete(CheckInState::GaveUp)
                }
            }
        };

        if let Transition::Complete(state) = transition {
            self.enter(state);
        }
        transition
    }

    fn enter(&mut self, state: CheckInState) {
        self.state_history.push(self.state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> AttemptOutcome {
        AttemptOutcome::Failure {
            message: "busy".into(),
            raw: "{}".into(),
        }
    }

    #[test]
    fn success_completes_on_first_attempt() {
        let mut run = CharacterRun::new(3);
        run.begin_attempt();
        let t = run.next(&AttemptOutcome::Success(vec![Award::new("龙门币", 100)]));
        assert_eq!(t, Transition::Complete(CheckInState::Succeeded));
        assert_eq!(
            run.state_history,
            vec![CheckInState::Pending, CheckInState::Attempting]
        );
        assert_eq!(run.retry_count, 0);
    }

    #[test]
    fn already_checked_in_never_retries() {
        let mut run = CharacterRun::new(3);
        run.begin_attempt();
        let t = run.next(&AttemptOutcome::AlreadyCheckedIn);
        assert_eq!(t, Transition::Complete(CheckInState::AlreadyDone));
        assert_eq!(run.retry_count, 0);
    }

    #[test]
    fn failures_retry_until_exhausted() {
        let mut run = CharacterRun::new(3);
        run.begin_attempt();
        assert_eq!(run.next(&failure()), Transition::Retry { attempt: 1 });
        run.begin_attempt();
        assert_eq!(
            run.next(&AttemptOutcome::NetworkError("reset".into())),
            Transition::Retry { attempt: 2 }
        );
        run.begin_attempt();
        assert_eq!(run.next(&failure()), Transition::Complete(CheckInState::GaveUp));
        assert_eq!(run.retry_count, 3);
        assert_eq!(run.state, CheckInState::GaveUp);
    }

    #[test]
    fn retry_then_succeed() {
        let mut run = CharacterRun::new(3);
        run.begin_attempt();
        assert!(matches!(run.next(&failure()), Transition::Retry { .. }));
        run.begin_attempt();
        assert_eq!(
            run.next(&AttemptOutcome::Success(vec![])),
            Transition::Complete(CheckInState::Succeeded)
        );
        assert_eq!(run.retry_count, 1);
    }

    #[test]
    fn zero_retries_gives_up_after_first_failure() {
        let mut run = CharacterRun::new(0);
        run.begin_attempt();
        assert_eq!(run.next(&failure()), Transition::Complete(CheckInState::GaveUp));
    }

    #[test]
    fn terminal_state_absorbs_outcomes() {
        let mut run = CharacterRun::new(1);
        run.begin_attempt();
        run.next(&AttemptOutcome::AlreadyCheckedIn);
        assert_eq!(
            run.next(&failure()),
            Transition::Complete(CheckInState::AlreadyDone)
        );
        assert_eq!(run.retry_count, 0);
    }

    #[test]
    fn state_display() {
        assert_eq!(CheckInState::Pending.to_string(), "PENDING");
        assert_eq!(CheckInState::AlreadyDone.to_string(), "ALREADY_DONE");
        assert_eq!(CheckInState::GaveUp.to_string(), "GAVE_UP");
    }
}
