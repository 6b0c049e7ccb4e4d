//! In-memory relational store.
//!
//! Four tables: problems, problem_levels, submissions, profiles. The query
//! surface is exactly what the app needs: equality filters, membership
//! filters, ordering, single-row fetch, insert, and the
//! submissions → problem_levels → problems join used for display.
//!
//! Submissions are an append-only log; nothing here updates or deletes one.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::{Problem, ProblemLevel, Profile, Submission};

/// A submission resolved against its owning level and problem for display.
#[derive(Clone, Debug)]
pub struct SubmissionRow {
    pub submission: Submission,
    pub level_number: u32,
    pub level_description: String,
    pub problem_title: String,
}

#[derive(Clone, Default)]
pub struct Store {
    problems: Arc<RwLock<HashMap<String, Problem>>>,
    levels: Arc<RwLock<HashMap<String, ProblemLevel>>>,
    submissions: Arc<RwLock<Vec<Submission>>>,
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // --- problems ---

    #[instrument(level = "debug", skip(self, p), fields(id = %p.id))]
    pub async fn insert_problem(&self, p: Problem) {
        self.problems.write().await.insert(p.id.clone(), p);
    }

    pub async fn problem_by_id(&self, id: &str) -> Option<Problem> {
        self.problems.read().await.get(id).cloned()
    }

    /// Single-row fetch by title; used for idempotent bank insertion.
    pub async fn problem_by_title(&self, title: &str) -> Option<Problem> {
        self.problems
            .read()
            .await
            .values()
            .find(|p| p.title == title)
            .cloned()
    }

    /// Full catalog, ordered by title.
    pub async fn list_problems(&self) -> Vec<Problem> {
        let mut out: Vec<Problem> = self.problems.read().await.values().cloned().collect();
        out.sort_by(|a, b| a.title.cmp(&b.title));
        out
    }

    pub async fn problem_count(&self) -> usize {
        self.problems.read().await.len()
    }

    // --- problem levels ---

    #[instrument(level = "debug", skip(self, l), fields(id = %l.id, problem_id = %l.problem_id))]
    pub async fn insert_level(&self, l: ProblemLevel) {
        self.levels.write().await.insert(l.id.clone(), l);
    }

    pub async fn level_by_id(&self, id: &str) -> Option<ProblemLevel> {
        self.levels.read().await.get(id).cloned()
    }

    /// All levels of one problem, ordered by `level_number`.
    pub async fn levels_for_problem(&self, problem_id: &str) -> Vec<ProblemLevel> {
        let mut out: Vec<ProblemLevel> = self
            .levels
            .read()
            .await
            .values()
            .filter(|l| l.problem_id == problem_id)
            .cloned()
            .collect();
        out.sort_by_key(|l| l.level_number);
        out
    }

    pub async fn level_count(&self) -> usize {
        self.levels.read().await.len()
    }

    // --- submissions ---

    /// Append one graded attempt. Fails if the referenced level is unknown,
    /// which is the only way an in-memory append can go wrong.
    #[instrument(level = "debug", skip(self, s), fields(id = %s.id, level_id = %s.level_id))]
    pub async fn insert_submission(&self, s: Submission) -> Result<(), String> {
        let known = self.levels.read().await.contains_key(&s.level_id);
        if !known {
            return Err(format!("unknown level_id: {}", s.level_id));
        }
        self.submissions.write().await.push(s);
        Ok(())
    }

    /// One user's submissions restricted to a set of level ids, newest first,
    /// each joined to its level and problem.
    pub async fn submissions_for_user(
        &self,
        user_id: &str,
        level_ids: &[String],
    ) -> Vec<SubmissionRow> {
        // Snapshot first so the tables are locked one at a time.
        // Reverse insertion order keeps ties stable under the sort below.
        let snapshot: Vec<Submission> = {
            let submissions = self.submissions.read().await;
            submissions
                .iter()
                .rev()
                .filter(|s| s.user_id == user_id && level_ids.contains(&s.level_id))
                .cloned()
                .collect()
        };

        let levels = self.levels.read().await;
        let problems = self.problems.read().await;
        let mut rows: Vec<SubmissionRow> = snapshot
            .into_iter()
            .filter_map(|s| {
                let level = levels.get(&s.level_id)?;
                let problem = problems.get(&level.problem_id)?;
                Some(SubmissionRow {
                    level_number: level.level_number,
                    level_description: level.level_description.clone(),
                    problem_title: problem.title.clone(),
                    submission: s,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.submission.created_at.cmp(&a.submission.created_at));
        rows
    }

    pub async fn submission_count_for_user(&self, user_id: &str, level_ids: &[String]) -> usize {
        self.submissions
            .read()
            .await
            .iter()
            .filter(|s| s.user_id == user_id && level_ids.contains(&s.level_id))
            .count()
    }

    // --- profiles ---

    #[instrument(level = "debug", skip(self, p), fields(id = %p.id))]
    pub async fn insert_profile(&self, p: Profile) {
        self.profiles.write().await.insert(p.id.clone(), p);
    }

    pub async fn profile_by_id(&self, id: &str) -> Option<Profile> {
        self.profiles.read().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Criteria, Difficulty};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    async fn seed_problem(store: &Store) -> (Problem, Vec<ProblemLevel>) {
        let problem = Problem {
            id: Uuid::new_v4().to_string(),
            title: "Parking Lot System".into(),
            description: "Design a parking lot.".into(),
            difficulty: Difficulty::Medium,
        };
        store.insert_problem(problem.clone()).await;

        let mut levels = Vec::new();
        for n in 1..=4u32 {
            let l = ProblemLevel {
                id: Uuid::new_v4().to_string(),
                problem_id: problem.id.clone(),
                level_number: n,
                level_description: format!("level {n}"),
                evaluation_criteria: Criteria::new(),
            };
            store.insert_level(l.clone()).await;
            levels.push(l);
        }
        (problem, levels)
    }

    fn submission(user: &str, level: &ProblemLevel, score: i64, feedback: &str) -> Submission {
        Submission {
            id: Uuid::new_v4().to_string(),
            user_id: user.into(),
            level_id: level.id.clone(),
            diagram_json: serde_json::json!({"nodes": []}),
            score,
            feedback: feedback.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn submission_round_trip_resolves_level_and_problem_title() {
        let store = Store::new();
        let (_, levels) = seed_problem(&store).await;

        store
            .insert_submission(submission("u1", &levels[1], 73, "X"))
            .await
            .expect("insert");

        let ids: Vec<String> = levels.iter().map(|l| l.id.clone()).collect();
        let rows = store.submissions_for_user("u1", &ids).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].submission.score, 73);
        assert_eq!(rows[0].submission.feedback, "X");
        assert_eq!(rows[0].level_number, 2);
        assert_eq!(rows[0].problem_title, "Parking Lot System");
    }

    #[tokio::test]
    async fn submissions_come_back_newest_first_for_the_right_user_only() {
        let store = Store::new();
        let (_, levels) = seed_problem(&store).await;
        let ids: Vec<String> = levels.iter().map(|l| l.id.clone()).collect();

        let mut old = submission("u1", &levels[0], 10, "first");
        old.created_at = Utc::now() - Duration::seconds(60);
        store.insert_submission(old).await.expect("insert");
        store
            .insert_submission(submission("u1", &levels[0], 20, "second"))
            .await
            .expect("insert");
        store
            .insert_submission(submission("someone-else", &levels[0], 99, "not mine"))
            .await
            .expect("insert");

        let rows = store.submissions_for_user("u1", &ids).await;
        let feedback: Vec<&str> = rows.iter().map(|r| r.submission.feedback.as_str()).collect();
        assert_eq!(feedback, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn membership_filter_excludes_other_problems_levels() {
        let store = Store::new();
        let (_, levels) = seed_problem(&store).await;

        let stray = ProblemLevel {
            id: Uuid::new_v4().to_string(),
            problem_id: "other-problem".into(),
            level_number: 1,
            level_description: "unrelated".into(),
            evaluation_criteria: Criteria::new(),
        };
        store.insert_level(stray.clone()).await;
        store
            .insert_submission(submission("u1", &stray, 40, "other"))
            .await
            .expect("insert");
        store
            .insert_submission(submission("u1", &levels[0], 50, "mine"))
            .await
            .expect("insert");

        let ids: Vec<String> = levels.iter().map(|l| l.id.clone()).collect();
        let rows = store.submissions_for_user("u1", &ids).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].submission.feedback, "mine");
        assert_eq!(store.submission_count_for_user("u1", &ids).await, 1);
    }

    #[tokio::test]
    async fn appending_against_an_unknown_level_is_rejected() {
        let store = Store::new();
        let ghost = ProblemLevel {
            id: "missing".into(),
            problem_id: "nowhere".into(),
            level_number: 1,
            level_description: String::new(),
            evaluation_criteria: Criteria::new(),
        };
        let err = store
            .insert_submission(submission("u1", &ghost, 10, "x"))
            .await
            .expect_err("must fail");
        assert!(err.contains("missing"));
    }
}
