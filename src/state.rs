//! Application state: table stores, identity service, per-session level
//! gates, the grading client, and prompts.
//!
//! This module owns:
//!   - the in-memory store (problems, levels, submissions, profiles)
//!   - the auth service (accounts + bearer sessions)
//!   - one `LevelGate` per (session, problem) pair
//!   - the in-flight set enforcing one submission at a time per session
//!   - the prompts struct (from TOML or defaults)
//!   - optional grading client
//!
//! Gate state is process-local by design: two sessions of the same user
//! gate independently, and nothing here survives a restart except nothing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::auth::AuthService;
use crate::config::load_app_config_from_env;
use crate::config::Prompts;
use crate::gate::LevelGate;
use crate::grader::Grader;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: AuthService,
    pub grader: Option<Grader>,
    pub prompts: Prompts,
    gates: Arc<RwLock<HashMap<(String, String), LevelGate>>>,
    in_flight: Arc<RwLock<HashSet<String>>>,
}

impl AppState {
    /// Build state from env: load config, insert the config problem bank,
    /// init the grading client.
    #[instrument(level = "info", skip_all)]
    pub async fn new() -> Self {
        let cfg_opt = load_app_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let store = Store::new();

        // Insert config-based problems (if any). The built-in sample bank is
        // only inserted on demand, through the seed endpoint.
        if let Some(cfg) = &cfg_opt {
            let (problems, levels) = crate::logic::insert_bank(&store, &cfg.problems).await;
            info!(target: "designgym_backend", problems, levels, "Loaded problem bank from config");
        }

        // Startup catalog inventory.
        let mut count_by_diff: HashMap<String, usize> = HashMap::new();
        for p in store.list_problems().await {
            *count_by_diff.entry(format!("{:?}", p.difficulty)).or_insert(0) += 1;
        }
        for (difficulty, n) in count_by_diff {
            info!(target: "designgym_backend", %difficulty, problems = n, "Startup catalog inventory");
        }

        // Build optional grading client (if API key present).
        let grader = Grader::from_env();
        if let Some(g) = &grader {
            info!(target: "grading", base_url = %g.base_url, model = %g.model, "AI grading enabled.");
        } else {
            info!(target: "grading", "AI grading disabled (no GEMINI_API_KEY). Submissions will be rejected.");
        }

        Self {
            store,
            auth: AuthService::new(),
            grader,
            prompts,
            gates: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Run a closure against the gate for (session, problem), creating a
    /// fresh gate on first touch.
    pub async fn with_gate<T>(
        &self,
        token: &str,
        problem_id: &str,
        f: impl FnOnce(&mut LevelGate) -> T,
    ) -> T {
        let mut gates = self.gates.write().await;
        let gate = gates
            .entry((token.to_string(), problem_id.to_string()))
            .or_default();
        f(gate)
    }

    /// Read-only copy of the gate for (session, problem).
    pub async fn gate_snapshot(&self, token: &str, problem_id: &str) -> LevelGate {
        self.gates
            .read()
            .await
            .get(&(token.to_string(), problem_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Mark this session as having a submission in flight.
    /// Returns false if one is already running.
    pub async fn try_begin_submission(&self, token: &str) -> bool {
        self.in_flight.write().await.insert(token.to_string())
    }

    pub async fn finish_submission(&self, token: &str) {
        self.in_flight.write().await.remove(token);
    }
}
