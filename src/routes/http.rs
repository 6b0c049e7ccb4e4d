//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors map onto status codes here and
//! nowhere else.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{header::AUTHORIZATION, HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::auth::AuthError;
use crate::logic::{self, CatalogError, SubmitError};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

// --- auth plumbing ---

fn bearer_token(headers: &HeaderMap) -> Option<String> {
  headers
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(|t| t.trim().to_string())
}

/// Resolve the bearer session or fail with 401.
async fn require_session(
  state: &AppState,
  headers: &HeaderMap,
) -> Result<(String, String), (StatusCode, Json<ErrorOut>)> {
  let unauthorized = || {
    (
      StatusCode::UNAUTHORIZED,
      Json(ErrorOut { message: "Not signed in".into() }),
    )
  };
  let token = bearer_token(headers).ok_or_else(unauthorized)?;
  let user_id = state.auth.current_user(&token).await.ok_or_else(unauthorized)?;
  Ok((token, user_id))
}

fn auth_error(e: AuthError) -> (StatusCode, Json<ErrorOut>) {
  let status = match e {
    AuthError::InvalidEmail | AuthError::PasswordTooShort => StatusCode::BAD_REQUEST,
    AuthError::EmailTaken => StatusCode::CONFLICT,
    AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
    AuthError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
  };
  (status, Json(ErrorOut { message: e.to_string() }))
}

fn catalog_error(e: CatalogError) -> (StatusCode, Json<ErrorOut>) {
  let status = match e {
    CatalogError::UnknownProblem(_) => StatusCode::NOT_FOUND,
    CatalogError::DuplicateLevel(_) => StatusCode::CONFLICT,
    CatalogError::LevelOutOfRange { .. } => StatusCode::BAD_REQUEST,
  };
  (status, Json(ErrorOut { message: e.to_string() }))
}

/// Submission failures use the grading wire shape: the message rides in
/// `feedback` so clients show it where feedback normally goes.
fn submit_error(e: SubmitError) -> (StatusCode, Json<GradeErrorOut>) {
  let status = match e {
    SubmitError::UnknownProblem(_) => StatusCode::NOT_FOUND,
    SubmitError::NoLevels => StatusCode::CONFLICT,
    SubmitError::Busy => StatusCode::CONFLICT,
    SubmitError::GraderUnavailable | SubmitError::Grading(_) => StatusCode::BAD_GATEWAY,
    SubmitError::Persist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
  };
  (status, Json(GradeErrorOut { feedback: e.to_string() }))
}

// --- identity ---

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_signup(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SignupIn>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let user_id = logic::sign_up(&state, &body.email, &body.password, &body.username)
    .await
    .map_err(auth_error)?;
  Ok((StatusCode::CREATED, Json(SignupOut { user_id })))
}

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let session = state
    .auth
    .sign_in(&body.email, &body.password)
    .await
    .map_err(auth_error)?;
  let username = state
    .store
    .profile_by_id(&session.user_id)
    .await
    .map(|p| p.username)
    .unwrap_or_default();
  Ok(Json(SessionOut { token: session.token, user_id: session.user_id, username }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_logout(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let (token, _) = require_session(&state, &headers).await?;
  state.auth.sign_out(&token).await;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip_all)]
pub async fn http_me(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let (_, user_id) = require_session(&state, &headers).await?;
  let email = state.auth.email_for(&user_id).await.unwrap_or_default();
  let profile = state.store.profile_by_id(&user_id).await;
  Ok(Json(MeOut {
    user_id,
    email,
    username: profile.as_ref().map(|p| p.username.clone()).unwrap_or_default(),
    points: profile.map(|p| p.points).unwrap_or(0),
  }))
}

// --- catalog ---

#[instrument(level = "info", skip(state))]
pub async fn http_list_problems(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let problems = state.store.list_problems().await;
  Json(problems.iter().map(to_problem_out).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_problem(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let problem = state
    .store
    .problem_by_id(&id)
    .await
    .ok_or_else(|| catalog_error(CatalogError::UnknownProblem(id.clone())))?;
  let levels = state.store.levels_for_problem(&id).await;
  Ok(Json(ProblemDetailOut {
    problem: to_problem_out(&problem),
    levels: levels.iter().map(to_level_out).collect(),
  }))
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title))]
pub async fn http_create_problem(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NewProblemIn>,
) -> impl IntoResponse {
  let problem =
    logic::create_problem(&state.store, &body.title, &body.description, body.difficulty).await;
  (StatusCode::CREATED, Json(to_problem_out(&problem)))
}

#[instrument(level = "info", skip(state, body), fields(%id, level = body.level_number))]
pub async fn http_create_level(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<NewLevelIn>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let level = logic::create_level(
    &state.store,
    &id,
    body.level_number,
    &body.level_description,
    body.evaluation_criteria,
  )
  .await
  .map_err(catalog_error)?;
  Ok((StatusCode::CREATED, Json(to_level_out(&level))))
}

#[instrument(level = "info", skip(state))]
pub async fn http_seed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (problems_added, levels_added) = logic::insert_sample_bank(&state).await;
  info!(target: "designgym_backend", problems_added, levels_added, "Sample bank inserted");
  Json(SeedOut { problems_added, levels_added })
}

// --- level gate + submissions ---

#[instrument(level = "info", skip(state, headers, body), fields(%id, target = body.target_index, confirm = body.confirm))]
pub async fn http_select_level(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(body): Json<SelectLevelIn>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let (token, _) = require_session(&state, &headers).await?;
  let view = logic::select_level(&state, &token, &id, body.target_index, body.confirm)
    .await
    .map_err(catalog_error)?;
  Ok(Json(to_select_level_out(&view)))
}

#[instrument(level = "info", skip(state, headers, body), fields(%id))]
pub async fn http_submit(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(body): Json<SubmitIn>,
) -> Result<impl IntoResponse, axum::response::Response> {
  let (token, user_id) = require_session(&state, &headers)
    .await
    .map_err(|e| e.into_response())?;
  let verdict = logic::submit_design(&state, &token, &user_id, &id, body.diagram_json)
    .await
    .map_err(|e| submit_error(e).into_response())?;
  Ok(Json(to_submit_out(&verdict)))
}

#[instrument(level = "info", skip(state, headers), fields(%id, level = ?q.level))]
pub async fn http_list_submissions(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(q): Query<SubmissionsQuery>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let (_, user_id) = require_session(&state, &headers).await?;
  let rows = logic::list_submissions(&state, &user_id, &id, q.level)
    .await
    .map_err(catalog_error)?;
  Ok(Json(rows.iter().map(to_submission_out).collect::<Vec<_>>()))
}

#[instrument(level = "info", skip(state, headers), fields(%id))]
pub async fn http_submission_count(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorOut>)> {
  let (_, user_id) = require_session(&state, &headers).await?;
  let count = logic::count_submissions(&state, &user_id, &id)
    .await
    .map_err(catalog_error)?;
  Ok(Json(CountOut { count }))
}
