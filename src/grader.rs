//! Client for the generative-language grading endpoint.
//!
//! One `generateContent` call per submission: we build a deterministic prompt
//! from the evaluation context and the raw diagram, POST it, and hand the
//! model's text to the verdict parser. Transport/auth problems (endpoint
//! unreachable, non-2xx, missing key, malformed envelope) are hard failures
//! reported to the caller; unparseable *content* is not our concern here.
//! No retries and no caching: every submission is a fresh call.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::EvaluationContext;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct Grader {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Grader {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model =
      std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash-latest".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Run one grading call and return the model's raw text.
  #[instrument(level = "info", skip(self, prompts, ctx, diagram), fields(model = %self.model, user_level = ctx.user_level))]
  pub async fn grade_design(
    &self,
    prompts: &Prompts,
    ctx: &EvaluationContext,
    diagram: &serde_json::Value,
  ) -> Result<String, String> {
    let prompt = build_grading_prompt(prompts, ctx, diagram);
    let start = std::time::Instant::now();
    let result = self.generate(&prompt).await;
    let elapsed = start.elapsed();

    match &result {
      Ok(text) => {
        info!(target: "grading", ?elapsed, reply_len = text.len(), "Grading reply received")
      }
      Err(e) => {
        error!(target: "grading", ?elapsed, error = %e, "Grading call failed")
      }
    }
    result
  }

  /// Plain text generation against `models/{model}:generateContent`.
  #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len()))]
  async fn generate(&self, prompt: &str) -> Result<String, String> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
    };

    let res = self
      .client
      .post(&url)
      .query(&[("key", self.api_key.as_str())])
      .header(USER_AGENT, "designgym-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(format!("grading endpoint HTTP {}: {}", status, msg));
    }

    let body: GenerateContentResponse = res.json().await.map_err(|e| e.to_string())?;
    body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content.parts.into_iter().next())
      .and_then(|p| p.text)
      .ok_or_else(|| "invalid response structure from grading endpoint".to_string())
  }
}

/// Deterministic prompt assembly: the same context and diagram always yield
/// the same prompt text.
pub fn build_grading_prompt(
  prompts: &Prompts,
  ctx: &EvaluationContext,
  diagram: &serde_json::Value,
) -> String {
  let user_level = ctx.user_level.to_string();
  let requirements = requirements_text(ctx);
  let diagram_json = serde_json::to_string(diagram)
    .ok()
    .unwrap_or_else(|| "{}".into());

  fill_template(
    &prompts.grading_template,
    &[
      ("user_level", &user_level),
      ("requirements", &requirements),
      ("diagram_json", &diagram_json),
    ],
  )
}

/// Every level's requirements and rubric, not just the current one: the user
/// must design for cumulative requirements.
fn requirements_text(ctx: &EvaluationContext) -> String {
  let criteria_json = |c: &crate::domain::Criteria| {
    serde_json::to_string(c).ok().unwrap_or_else(|| "{}".into())
  };

  let mut text = format!("Problem: {}\n\n", ctx.problem.title);
  text.push_str(&format!("Problem Description: {}\n\n", ctx.problem.description));
  text.push_str(&format!("Current Level: {}\n", ctx.current_level.number));
  text.push_str(&format!("Current Level Requirements: {}\n", ctx.current_level.description));
  text.push_str(&format!(
    "Current Level Evaluation Criteria: {}\n\n",
    criteria_json(&ctx.current_level.criteria)
  ));

  text.push_str("All Level Requirements:\n");
  for level in &ctx.all_levels {
    text.push_str(&format!("Level {}: {}\n", level.number, level.description));
    text.push_str(&format!("Level {} Criteria: {}\n\n", level.number, criteria_json(&level.criteria)));
  }
  text
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest {
  contents: Vec<Content>,
}
#[derive(Serialize)]
struct Content {
  parts: Vec<Part>,
}
#[derive(Serialize)]
struct Part {
  text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
  content: CandidateContent,
}
#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ReplyPart>,
}
#[derive(Deserialize)]
struct ReplyPart {
  #[serde(default)]
  text: Option<String>,
}

/// Try to extract a clean error message from the endpoint's error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
