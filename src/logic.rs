//! Core behaviors shared by the HTTP handlers.
//!
//! This includes:
//!   - Account provisioning (sign-up creates the profile row)
//!   - The submission pipeline (build context → grade → parse → append)
//!   - Driving the level gate
//!   - Submission listing with display enrichment
//!   - Idempotent problem-bank insertion (config bank and built-in samples)

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::config::ProblemCfg;
use crate::domain::{Difficulty, EvaluationContext, Problem, ProblemLevel, Profile, Submission};
use crate::gate::Transition;
use crate::seeds::sample_problems;
use crate::state::AppState;
use crate::store::{Store, SubmissionRow};
use crate::verdict::{parse_verdict, Verdict};

/// Ways a submission attempt can fail. Grading-content problems are absent
/// on purpose: the verdict parser always recovers those.
#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("unknown problem: {0}")]
  UnknownProblem(String),
  #[error("this problem has no levels to grade against")]
  NoLevels,
  #[error("A submission is already being evaluated for this session.")]
  Busy,
  #[error("AI grading is not configured on this server.")]
  GraderUnavailable,
  #[error("Failed to evaluate your design: {0}")]
  Grading(String),
  /// Grading succeeded; only the append failed. The score travels with the
  /// error so the caller can tell the user what was computed.
  #[error("Your design was graded ({score}/100) but saving the submission failed: {message}")]
  Persist { score: i64, message: String },
}

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("unknown problem: {0}")]
  UnknownProblem(String),
  #[error("level {0} already exists for this problem")]
  DuplicateLevel(u32),
  #[error("level index {index} is out of range (problem has {len} levels)")]
  LevelOutOfRange { index: usize, len: usize },
}

/// Gate state as seen right after a selection attempt.
#[derive(Clone, Debug)]
pub struct GateView {
  pub transition: Transition,
  pub current_index: usize,
  pub last_result: Option<Verdict>,
}

/// Sign-up provisions the account and its profile row (zero points).
#[instrument(level = "info", skip(state, password), fields(%email, %username))]
pub async fn sign_up(
  state: &AppState,
  email: &str,
  password: &str,
  username: &str,
) -> Result<String, AuthError> {
  let user_id = state.auth.sign_up(email, password).await?;
  state
    .store
    .insert_profile(Profile { id: user_id.clone(), username: username.to_string(), points: 0 })
    .await;
  Ok(user_id)
}

/// The full submission pipeline for the session's current level of one
/// problem. Sequential by design; the in-flight mark blocks a second
/// submission for the same session until this one settles.
#[instrument(level = "info", skip(state, token, diagram), fields(%problem_id, user_id = %user_id))]
pub async fn submit_design(
  state: &AppState,
  token: &str,
  user_id: &str,
  problem_id: &str,
  diagram: serde_json::Value,
) -> Result<Verdict, SubmitError> {
  if !state.try_begin_submission(token).await {
    return Err(SubmitError::Busy);
  }
  let result = run_pipeline(state, token, user_id, problem_id, diagram).await;
  state.finish_submission(token).await;
  result
}

async fn run_pipeline(
  state: &AppState,
  token: &str,
  user_id: &str,
  problem_id: &str,
  diagram: serde_json::Value,
) -> Result<Verdict, SubmitError> {
  let problem = state
    .store
    .problem_by_id(problem_id)
    .await
    .ok_or_else(|| SubmitError::UnknownProblem(problem_id.to_string()))?;
  let levels = state.store.levels_for_problem(problem_id).await;
  if levels.is_empty() {
    return Err(SubmitError::NoLevels);
  }

  let current_index = state
    .gate_snapshot(token, problem_id)
    .await
    .current_index()
    .min(levels.len() - 1);
  let ctx = EvaluationContext::build(&problem, &levels, current_index);

  let grader = state.grader.as_ref().ok_or(SubmitError::GraderUnavailable)?;
  let raw = grader
    .grade_design(&state.prompts, &ctx, &diagram)
    .await
    .map_err(SubmitError::Grading)?;
  let verdict = parse_verdict(&raw);

  let submission = Submission {
    id: Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    level_id: levels[current_index].id.clone(),
    diagram_json: diagram,
    score: verdict.score,
    feedback: verdict.feedback.clone(),
    created_at: Utc::now(),
  };
  state
    .store
    .insert_submission(submission)
    .await
    .map_err(|message| SubmitError::Persist { score: verdict.score, message })?;

  state
    .with_gate(token, problem_id, |g| g.record_result(verdict.clone()))
    .await;

  info!(
    target: "grading",
    %problem_id,
    level_number = levels[current_index].level_number,
    score = verdict.score,
    "Submission graded and recorded"
  );
  Ok(verdict)
}

/// Drive the level gate for one (session, problem) pair.
#[instrument(level = "info", skip(state, token), fields(%problem_id))]
pub async fn select_level(
  state: &AppState,
  token: &str,
  problem_id: &str,
  target: usize,
  confirm: bool,
) -> Result<GateView, CatalogError> {
  if state.store.problem_by_id(problem_id).await.is_none() {
    return Err(CatalogError::UnknownProblem(problem_id.to_string()));
  }
  let len = state.store.levels_for_problem(problem_id).await.len();
  if target >= len {
    return Err(CatalogError::LevelOutOfRange { index: target, len });
  }

  let view = state
    .with_gate(token, problem_id, |g| {
      let transition = if confirm { g.confirm(target) } else { g.select(target) };
      GateView {
        transition,
        current_index: g.current_index(),
        last_result: g.last_result().cloned(),
      }
    })
    .await;

  info!(target: "gate", %problem_id, ?view.transition, "Level selection handled");
  Ok(view)
}

/// One user's submissions for one problem, newest first, optionally
/// restricted to a single resolved level number.
pub async fn list_submissions(
  state: &AppState,
  user_id: &str,
  problem_id: &str,
  level_number: Option<u32>,
) -> Result<Vec<SubmissionRow>, CatalogError> {
  let level_ids = problem_level_ids(state, problem_id).await?;
  let mut rows = state.store.submissions_for_user(user_id, &level_ids).await;
  if let Some(n) = level_number {
    rows.retain(|r| r.level_number == n);
  }
  Ok(rows)
}

pub async fn count_submissions(
  state: &AppState,
  user_id: &str,
  problem_id: &str,
) -> Result<usize, CatalogError> {
  let level_ids = problem_level_ids(state, problem_id).await?;
  Ok(state.store.submission_count_for_user(user_id, &level_ids).await)
}

async fn problem_level_ids(state: &AppState, problem_id: &str) -> Result<Vec<String>, CatalogError> {
  if state.store.problem_by_id(problem_id).await.is_none() {
    return Err(CatalogError::UnknownProblem(problem_id.to_string()));
  }
  Ok(
    state
      .store
      .levels_for_problem(problem_id)
      .await
      .into_iter()
      .map(|l| l.id)
      .collect(),
  )
}

/// Admin surface: create one problem.
pub async fn create_problem(
  store: &Store,
  title: &str,
  description: &str,
  difficulty: Difficulty,
) -> Problem {
  let problem = Problem {
    id: Uuid::new_v4().to_string(),
    title: title.to_string(),
    description: description.to_string(),
    difficulty,
  };
  store.insert_problem(problem.clone()).await;
  problem
}

/// Admin surface: add one level to an existing problem. Duplicate level
/// numbers are rejected.
pub async fn create_level(
  store: &Store,
  problem_id: &str,
  level_number: u32,
  level_description: &str,
  evaluation_criteria: crate::domain::Criteria,
) -> Result<ProblemLevel, CatalogError> {
  if store.problem_by_id(problem_id).await.is_none() {
    return Err(CatalogError::UnknownProblem(problem_id.to_string()));
  }
  let existing = store.levels_for_problem(problem_id).await;
  if existing.iter().any(|l| l.level_number == level_number) {
    return Err(CatalogError::DuplicateLevel(level_number));
  }

  let level = ProblemLevel {
    id: Uuid::new_v4().to_string(),
    problem_id: problem_id.to_string(),
    level_number,
    level_description: level_description.to_string(),
    evaluation_criteria,
  };
  store.insert_level(level.clone()).await;
  Ok(level)
}

/// Insert a bank of problems with levels, skipping what already exists
/// (problems by title, levels by number). Returns (problems, levels) added.
#[instrument(level = "info", skip(store, bank), fields(bank_len = bank.len()))]
pub async fn insert_bank(store: &Store, bank: &[ProblemCfg]) -> (usize, usize) {
  let mut added_problems = 0usize;
  let mut added_levels = 0usize;

  for cfg in bank {
    let problem_id = match store.problem_by_title(&cfg.title).await {
      Some(existing) => {
        debug!(target: "designgym_backend", title = %cfg.title, "Problem already exists, keeping it");
        existing.id
      }
      None => {
        let id = cfg.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        store
          .insert_problem(Problem {
            id: id.clone(),
            title: cfg.title.clone(),
            description: cfg.description.clone(),
            difficulty: cfg.difficulty,
          })
          .await;
        added_problems += 1;
        id
      }
    };

    let existing_numbers: Vec<u32> = store
      .levels_for_problem(&problem_id)
      .await
      .iter()
      .map(|l| l.level_number)
      .collect();
    for level in &cfg.levels {
      if existing_numbers.contains(&level.level_number) {
        debug!(
          target: "designgym_backend",
          title = %cfg.title,
          level = level.level_number,
          "Level already exists, skipping"
        );
        continue;
      }
      store
        .insert_level(ProblemLevel {
          id: Uuid::new_v4().to_string(),
          problem_id: problem_id.clone(),
          level_number: level.level_number,
          level_description: level.level_description.clone(),
          evaluation_criteria: level.evaluation_criteria.clone(),
        })
        .await;
      added_levels += 1;
    }
  }

  (added_problems, added_levels)
}

/// Insert the built-in sample catalog.
pub async fn insert_sample_bank(state: &AppState) -> (usize, usize) {
  insert_bank(&state.store, &sample_problems()).await
}
