//! Pipeline state — the single record threaded through all stages of one
//! analysis run.
//!
//! The state is append-only across fields: each stage populates exactly
//! the fields it owns (`resume` for parsing, `company`/`postings` for
//! scraping, `matches` for scoring) and later stages only read them. One
//! run exclusively owns its state; nothing here is shared across runs.

use serde::Serialize;
use uuid::Uuid;

use crate::adapters::StageError;
use crate::models::job::{JobPosting, MatchResult};
use crate::models::resume::ResumeProfile;

/// Position of a run in the stage machine. Edges between stages are plain
/// conditionals on `PipelineState` fields inside the orchestrator loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Scraping,
    Scoring,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// At least the mandatory stages completed. `skipped` counts postings
    /// whose scoring failed under the partial-failure policy.
    Success { partial: bool, skipped: usize },
    /// A fatal stage error ended the run.
    Failed { stage: String, message: String },
}

impl RunOutcome {
    pub fn failed(err: &StageError) -> Self {
        RunOutcome::Failed {
            stage: err.stage().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

/// The unit of work one orchestrator invocation owns. Created at request
/// entry, discarded after the response; only its summary is persisted.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub user_id: String,
    pub company_url: String,
    /// Resolved by the scraping stage.
    pub company: Option<String>,
    /// Populated by the parsing stage.
    pub resume: Option<ResumeProfile>,
    /// Populated by the scraping stage; empty list is a valid value.
    pub postings: Option<Vec<JobPosting>>,
    /// Populated by the scoring stage, ranked best-first.
    pub matches: Option<Vec<MatchResult>>,
    pub outcome: Option<RunOutcome>,
    pub email_sent: bool,
    pub email_message: Option<String>,
}

impl PipelineState {
    pub fn new(user_id: &str, company_url: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            company_url: company_url.to_string(),
            company: None,
            resume: None,
            postings: None,
            matches: None,
            outcome: None,
            email_sent: false,
            email_message: None,
        }
    }

    /// Best score of the run, if any posting was scored. Ranking puts the
    /// best match first.
    pub fn top_score(&self) -> Option<u8> {
        self.matches
            .as_deref()
            .and_then(|m| m.first())
            .map(|m| m.score)
    }

    pub fn jobs_found(&self) -> usize {
        self.postings.as_deref().map(<[_]>::len).unwrap_or(0)
    }

    /// Company name for display and history, falling back to the URL
    /// before scraping has resolved one.
    pub fn company_name(&self) -> &str {
        self.company.as_deref().unwrap_or(&self.company_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::MatchPriority;

    fn match_result(score: u8) -> MatchResult {
        MatchResult {
            posting: JobPosting {
                title: "Engineer".to_string(),
                location: None,
                required_skills: vec![],
                apply_url: "https://x.dev/1".to_string(),
                company: "X".to_string(),
                seniority: None,
            },
            score,
            skill_gap: String::new(),
            priority: MatchPriority::from_score(score),
            improvements: None,
        }
    }

    #[test]
    fn test_fresh_state_has_unique_run_id_and_empty_fields() {
        let a = PipelineState::new("user1", "https://acme.dev");
        let b = PipelineState::new("user1", "https://acme.dev");
        assert_ne!(a.run_id, b.run_id);
        assert!(a.resume.is_none());
        assert!(a.postings.is_none());
        assert!(a.matches.is_none());
        assert!(a.outcome.is_none());
        assert!(!a.email_sent);
    }

    #[test]
    fn test_top_score_reads_first_ranked_match() {
        let mut state = PipelineState::new("user1", "https://acme.dev");
        assert_eq!(state.top_score(), None);

        state.matches = Some(vec![match_result(80), match_result(40)]);
        assert_eq!(state.top_score(), Some(80));

        state.matches = Some(vec![]);
        assert_eq!(state.top_score(), None);
    }

    #[test]
    fn test_outcome_failed_carries_stage_name() {
        let outcome = RunOutcome::failed(&StageError::Scrape("boom".to_string()));
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                stage: "scrape".to_string(),
                message: "job scraping failed: boom".to_string(),
            }
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Parsing.is_terminal());
        assert!(!Stage::Scraping.is_terminal());
        assert!(!Stage::Scoring.is_terminal());
    }
}
