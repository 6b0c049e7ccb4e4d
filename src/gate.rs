//! Level progression gate.
//!
//! One state per level index. The first level is always open; any other move
//! is free only while the latest recorded score clears the unlock bar, and
//! needs an explicit confirmation otherwise. Confirming forces the move.
//! There is no terminal state: the rule is re-evaluated from the latest
//! score every time the selector is used.
//!
//! Gate state is per session and per problem; it is never persisted.

use crate::verdict::Verdict;

/// Minimum score on the latest attempt that unlocks free navigation.
pub const UNLOCK_SCORE: i64 = 70;

/// Outcome of a selection attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
  /// The requested level is already active.
  Stayed,
  /// The gate moved to the requested level.
  Moved { index: usize },
  /// The move is withheld until the user confirms it.
  ConfirmationRequired { target: usize },
}

#[derive(Clone, Debug, Default)]
pub struct LevelGate {
  current_index: usize,
  last_result: Option<Verdict>,
}

impl LevelGate {
  /// Fresh gate: first level active, nothing graded yet.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn current_index(&self) -> usize {
    self.current_index
  }

  /// The result shown for the active level, if one was recorded since the
  /// last transition.
  pub fn last_result(&self) -> Option<&Verdict> {
    self.last_result.as_ref()
  }

  /// Record the grading result of the latest submission on the active level.
  pub fn record_result(&mut self, verdict: Verdict) {
    self.last_result = Some(verdict);
  }

  /// Ask to activate `target`. Index bounds are the caller's concern (the
  /// selector only offers indices that exist).
  pub fn select(&mut self, target: usize) -> Transition {
    if target == self.current_index {
      return Transition::Stayed;
    }

    let unlocked = target == 0
      || self
        .last_result
        .as_ref()
        .map(|v| v.score >= UNLOCK_SCORE)
        .unwrap_or(false);

    if unlocked {
      self.move_to(target);
      Transition::Moved { index: target }
    } else {
      Transition::ConfirmationRequired { target }
    }
  }

  /// Force a previously withheld move, regardless of score.
  pub fn confirm(&mut self, target: usize) -> Transition {
    if target == self.current_index {
      return Transition::Stayed;
    }
    self.move_to(target);
    Transition::Moved { index: target }
  }

  fn move_to(&mut self, target: usize) {
    self.current_index = target;
    // Each level's result display is independent; drop it on every move.
    self.last_result = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn graded(score: i64) -> Verdict {
    Verdict { score, feedback: "graded".into() }
  }

  #[test]
  fn first_level_never_needs_confirmation() {
    for score in [0, 30, 69, 70, 100] {
      let mut gate = LevelGate::new();
      gate.confirm(2);
      gate.record_result(graded(score));
      assert_eq!(gate.select(0), Transition::Moved { index: 0 });
    }
  }

  #[test]
  fn selecting_the_active_level_is_a_noop_and_keeps_the_result() {
    let mut gate = LevelGate::new();
    gate.record_result(graded(95));
    assert_eq!(gate.select(0), Transition::Stayed);
    assert_eq!(gate.last_result().map(|v| v.score), Some(95));
  }

  #[test]
  fn unlock_threshold_is_exactly_seventy() {
    for score in 0..UNLOCK_SCORE {
      let mut gate = LevelGate::new();
      gate.record_result(graded(score));
      assert_eq!(
        gate.select(1),
        Transition::ConfirmationRequired { target: 1 },
        "score {score} must not unlock"
      );
    }
    for score in UNLOCK_SCORE..=100 {
      let mut gate = LevelGate::new();
      gate.record_result(graded(score));
      assert_eq!(gate.select(1), Transition::Moved { index: 1 }, "score {score} must unlock");
    }
  }

  #[test]
  fn moving_with_no_recorded_result_needs_confirmation() {
    let mut gate = LevelGate::new();
    assert_eq!(gate.select(1), Transition::ConfirmationRequired { target: 1 });
    assert_eq!(gate.current_index(), 0);
  }

  #[test]
  fn confirming_forces_the_move_regardless_of_score() {
    let mut gate = LevelGate::new();
    gate.record_result(graded(12));
    assert_eq!(gate.select(3), Transition::ConfirmationRequired { target: 3 });
    assert_eq!(gate.confirm(3), Transition::Moved { index: 3 });
    assert_eq!(gate.current_index(), 3);
  }

  #[test]
  fn every_move_clears_the_pending_result() {
    let mut gate = LevelGate::new();
    gate.record_result(graded(88));
    assert_eq!(gate.select(1), Transition::Moved { index: 1 });
    assert!(gate.last_result().is_none());

    gate.record_result(graded(65));
    gate.confirm(3);
    assert!(gate.last_result().is_none());
  }
}
