//! Turning the grading model's reply into a structured verdict.
//!
//! Models are asked for a bare JSON object but routinely wrap it in
//! code-fence markers or surround it with prose. Recovery is an ordered
//! chain of fallible parsers, each with a narrower contract:
//!   1. strip fence markers, parse the whole text as JSON;
//!   2. parse the span from the first `{` to the last `}`;
//!   3. give up and return a neutral score with the raw text as feedback.
//! Step 3 is a degraded result, not an error; transport problems are the
//! grader's to report, never this module's.

use serde::{Deserialize, Serialize};

/// Score assigned when the reply cannot be parsed at all.
pub const FALLBACK_SCORE: i64 = 50;

/// A graded design: integer score in 0..=100 plus free-text feedback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
  pub score: i64,
  pub feedback: String,
}

/// Parse a model reply. Always yields a verdict.
pub fn parse_verdict(raw: &str) -> Verdict {
  let cleaned = strip_code_fences(raw);
  if let Some(v) = parse_scored_json(&cleaned) {
    return v;
  }
  if let Some(v) = brace_span(raw).and_then(parse_scored_json) {
    return v;
  }
  Verdict {
    score: FALLBACK_SCORE,
    feedback: format!("Evaluation completed. Raw response: {raw}"),
  }
}

/// Remove markdown code-fence markers, with or without a language tag.
fn strip_code_fences(s: &str) -> String {
  s.replace("```json", "").replace("```", "").trim().to_string()
}

/// Accept a JSON object iff it has a numeric `score` and a string `feedback`.
fn parse_scored_json(s: &str) -> Option<Verdict> {
  let value: serde_json::Value = serde_json::from_str(s).ok()?;
  let score = value.get("score")?.as_f64()?;
  let feedback = value.get("feedback")?.as_str()?.to_string();
  Some(Verdict {
    score: clamp_score(score),
    feedback,
  })
}

/// The span from the first `{` to the last `}`, if both exist in order.
fn brace_span(s: &str) -> Option<&str> {
  let start = s.find('{')?;
  let end = s.rfind('}')?;
  if end < start {
    return None;
  }
  Some(&s[start..=end])
}

/// Truncate to an integer and clamp into the 0..=100 scoring range.
fn clamp_score(score: f64) -> i64 {
  (score.trunc() as i64).clamp(0, 100)
}
