//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Criteria, Difficulty, Problem, ProblemLevel};
use crate::logic::GateView;
use crate::gate::Transition;
use crate::store::SubmissionRow;
use crate::verdict::Verdict;

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

/// General error body. The submit endpoint uses `GradeErrorOut` instead, so
/// its failures match the grading wire contract.
#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct GradeErrorOut {
    pub feedback: String,
}

//
// Auth
//

#[derive(Debug, Deserialize)]
pub struct SignupIn {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct SignupOut {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginIn {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionOut {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct MeOut {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub points: i64,
}

//
// Catalog
//

#[derive(Serialize)]
pub struct ProblemOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
}

#[derive(Serialize)]
pub struct LevelOut {
    pub id: String,
    pub level_number: u32,
    pub level_description: String,
    pub evaluation_criteria: Criteria,
}

#[derive(Serialize)]
pub struct ProblemDetailOut {
    pub problem: ProblemOut,
    pub levels: Vec<LevelOut>,
}

#[derive(Debug, Deserialize)]
pub struct NewProblemIn {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct NewLevelIn {
    pub level_number: u32,
    pub level_description: String,
    #[serde(default)]
    pub evaluation_criteria: Criteria,
}

#[derive(Serialize)]
pub struct SeedOut {
    pub problems_added: usize,
    pub levels_added: usize,
}

//
// Level gate
//

#[derive(Debug, Deserialize)]
pub struct SelectLevelIn {
    #[serde(rename = "targetIndex")]
    pub target_index: usize,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize)]
pub struct SelectLevelOut {
    pub moved: bool,
    #[serde(rename = "requiresConfirmation")]
    pub requires_confirmation: bool,
    #[serde(rename = "currentIndex")]
    pub current_index: usize,
    #[serde(rename = "lastResult")]
    pub last_result: Option<SubmitOut>,
}

//
// Submissions
//

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub diagram_json: serde_json::Value,
}

#[derive(Serialize)]
pub struct SubmitOut {
    pub score: i64,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionsQuery {
    pub level: Option<u32>,
}

#[derive(Serialize)]
pub struct SubmissionOut {
    pub id: String,
    pub level_id: String,
    pub level_number: u32,
    pub level_description: String,
    pub problem_title: String,
    pub score: i64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CountOut {
    pub count: usize,
}

//
// Conversions from internal types to the public DTOs.
//

pub fn to_problem_out(p: &Problem) -> ProblemOut {
    ProblemOut {
        id: p.id.clone(),
        title: p.title.clone(),
        description: p.description.clone(),
        difficulty: p.difficulty,
    }
}

pub fn to_level_out(l: &ProblemLevel) -> LevelOut {
    LevelOut {
        id: l.id.clone(),
        level_number: l.level_number,
        level_description: l.level_description.clone(),
        evaluation_criteria: l.evaluation_criteria.clone(),
    }
}

pub fn to_submit_out(v: &Verdict) -> SubmitOut {
    SubmitOut {
        score: v.score,
        feedback: v.feedback.clone(),
    }
}

pub fn to_submission_out(row: &SubmissionRow) -> SubmissionOut {
    SubmissionOut {
        id: row.submission.id.clone(),
        level_id: row.submission.level_id.clone(),
        level_number: row.level_number,
        level_description: row.level_description.clone(),
        problem_title: row.problem_title.clone(),
        score: row.submission.score,
        feedback: row.submission.feedback.clone(),
        created_at: row.submission.created_at,
    }
}

pub fn to_select_level_out(view: &GateView) -> SelectLevelOut {
    SelectLevelOut {
        moved: matches!(view.transition, Transition::Moved { .. }),
        requires_confirmation: matches!(view.transition, Transition::ConfirmationRequired { .. }),
        current_index: view.current_index,
        last_result: view.last_result.as_ref().map(to_submit_out),
    }
}
