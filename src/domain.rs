//! Domain models used by the backend: problems, leveled rubrics, submissions,
//! profiles, and the evaluation context assembled per submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How hard a problem is, as shown in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

/// Schema-free rubric document attached to a level. Never validated; only
/// serialized verbatim into the grading prompt.
pub type Criteria = serde_json::Map<String, serde_json::Value>;

/// A design problem. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
  pub id: String,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
}

/// One stage of a multi-stage problem. `level_number` is positive, unique per
/// problem, and defines the ordering of the stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProblemLevel {
  pub id: String,
  pub problem_id: String,
  pub level_number: u32,
  pub level_description: String,
  #[serde(default)]
  pub evaluation_criteria: Criteria,
}

/// A graded attempt at one level. Append-only: never updated or deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
  pub id: String,
  pub user_id: String,
  pub level_id: String,
  /// Opaque scene graph from the diagram editor. Forwarded, never inspected.
  pub diagram_json: serde_json::Value,
  pub score: i64,
  pub feedback: String,
  pub created_at: DateTime<Utc>,
}

/// One per user, created at sign-up. `points` is reserved for future
/// awarding logic and is never mutated by the submission flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
  pub id: String,
  pub username: String,
  pub points: i64,
}

/// Ephemeral payload handed to the grading proxy. Field names follow the
/// grading wire contract, so serialization is camelCase where it matters.
#[derive(Clone, Debug, Serialize)]
pub struct EvaluationContext {
  pub problem: ContextProblem,
  #[serde(rename = "currentLevel")]
  pub current_level: ContextLevel,
  #[serde(rename = "allLevels")]
  pub all_levels: Vec<ContextLevel>,
  /// 1-based level the user is attempting.
  #[serde(rename = "userLevel")]
  pub user_level: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContextProblem {
  pub title: String,
  pub description: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContextLevel {
  pub number: u32,
  pub description: String,
  pub criteria: Criteria,
}

impl EvaluationContext {
  /// Assemble the context for one submission. `levels` must be ordered by
  /// `level_number` and contain `current_index`; both hold for data coming
  /// out of the store, so this has no error path.
  pub fn build(problem: &Problem, levels: &[ProblemLevel], current_index: usize) -> Self {
    let as_ctx = |l: &ProblemLevel| ContextLevel {
      number: l.level_number,
      description: l.level_description.clone(),
      criteria: l.evaluation_criteria.clone(),
    };

    Self {
      problem: ContextProblem {
        title: problem.title.clone(),
        description: problem.description.clone(),
      },
      current_level: as_ctx(&levels[current_index]),
      all_levels: levels.iter().map(as_ctx).collect(),
      user_level: current_index as u32 + 1,
    }
  }
}
