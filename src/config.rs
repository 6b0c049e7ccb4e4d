//! Loading app configuration (grading prompt + optional problem bank) from TOML.
//!
//! See `AppConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Criteria, Difficulty};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub problems: Vec<ProblemCfg>,
}

/// Problem entry accepted in TOML configuration. Levels are required to be
/// non-empty for the problem to be usable.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  #[serde(default)] pub levels: Vec<LevelCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LevelCfg {
  pub level_number: u32,
  pub level_description: String,
  #[serde(default)] pub evaluation_criteria: Criteria,
}

/// Prompt used by the grading client. The default is tuned for strict
/// design reviews; override it in TOML if you need a different tone.
///
/// Placeholders filled at submission time: `{user_level}`, `{requirements}`,
/// `{diagram_json}`.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub grading_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      grading_template: r#"You are a strict and unforgiving software architect evaluating a low-level design solution. Be harsh but fair.

CONTEXT:
The user is working on Level {user_level} of a multi-level problem. Their design should address ALL requirements from Level 1 through Level {user_level}.

PROBLEM AND REQUIREMENTS:
{requirements}

USER'S DESIGN:
The user has submitted a diagram represented by this JSON: {diagram_json}

EVALUATION INSTRUCTIONS:
1. Be EXTREMELY strict with scoring. A basic box with just a label should get 0-10 points.
2. Evaluate how well the design addresses ALL requirements from Level 1 through Level {user_level}
3. Check adherence to SOLID principles
4. Assess appropriate use of design patterns
5. Consider scalability and maintainability
6. Evaluate the overall architectural quality

SCORING GUIDELINES:
- 0-10: Just a basic box/diagram with no real design
- 10-25: Very basic entities, missing most requirements
- 25-40: Some entities but poor relationships/design
- 40-60: Basic design with some relationships
- 60-75: Good design with proper entities and relationships
- 75-85: Excellent design with good patterns
- 85-100: Outstanding design with all requirements met

FEEDBACK GUIDELINES:
- Be concise and direct
- Don't give away the full solution
- Point out what's missing or wrong
- If the design is terrible, feel free to roast them (but constructively)
- Focus on what they need to improve
- Keep feedback under 200 words

IMPORTANT: The design should be comprehensive enough to handle ALL previous levels' requirements, not just the current level.

Return a JSON object with exactly these keys:
- "score": integer from 0 to 100 (be strict!)
- "feedback": string with concise, direct feedback (max 200 words)

Example response format:
{"score": 15, "feedback": "This is barely a design. You've drawn a box and called it a day. Where are the actual entities? The relationships? The attributes?"}"#
        .into(),
    }
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "designgym_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "designgym_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "designgym_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_grading_template_carries_bands_and_placeholders() {
    let p = Prompts::default();
    for needle in ["{user_level}", "{requirements}", "{diagram_json}", "85-100", "0-10"] {
      assert!(p.grading_template.contains(needle), "missing {needle}");
    }
  }

  #[test]
  fn problem_bank_parses_from_toml() {
    let cfg: AppConfig = toml::from_str(
      r#"
      [[problems]]
      title = "Chess Engine"
      description = "Design a chess engine."
      difficulty = "Hard"

      [[problems.levels]]
      level_number = 1
      level_description = "Board and pieces"

      [problems.levels.evaluation_criteria]
      required_entities = ["Board", "Piece"]
      "#,
    )
    .expect("parse");

    assert_eq!(cfg.problems.len(), 1);
    let p = &cfg.problems[0];
    assert_eq!(p.difficulty, Difficulty::Hard);
    assert_eq!(p.levels[0].level_number, 1);
    assert!(p.levels[0].evaluation_criteria.contains_key("required_entities"));
  }
}
