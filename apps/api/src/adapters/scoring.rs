//! Scoring stage — pluggable, trait-based scorer for one resume/posting pair.
//!
//! Default: `LlmJobScorer` (semantic, via the shared LLM client).
//! Fallback: `KeywordJobScorer` (pure-Rust, deterministic, fully testable) —
//! selected at startup via the `SCORER` config value.
//!
//! The orchestrator holds an `Arc<dyn ScoreJob>` and never knows which
//! backend is wired in.

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapters::prompts::{SCORE_PROMPT_TEMPLATE, SCORE_SYSTEM};
use crate::adapters::{ScoreJob, StageError};
use crate::llm_client::LlmClient;
use crate::models::job::{JobPosting, MatchPriority, MatchResult};
use crate::models::resume::ResumeProfile;

/// How much resume text goes into one scoring prompt.
const PROMPT_TEXT_BUDGET: usize = 1500;

// ────────────────────────────────────────────────────────────────────────────
// LlmJobScorer
// ────────────────────────────────────────────────────────────────────────────

/// Raw shape the model is asked to return. Coerced into `MatchResult` after
/// validation; out-of-range or malformed output is a `StageError::Score`.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    score: i64,
    #[serde(default)]
    skill_gap: Option<String>,
    #[serde(default)]
    improvements: Option<String>,
}

pub struct LlmJobScorer {
    llm: LlmClient,
}

impl LlmJobScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ScoreJob for LlmJobScorer {
    async fn score(
        &self,
        resume: &ResumeProfile,
        posting: &JobPosting,
    ) -> Result<MatchResult, StageError> {
        let prompt = build_score_prompt(resume, posting);
        let raw: RawVerdict = self
            .llm
            .call_json(&prompt, SCORE_SYSTEM)
            .await
            .map_err(|e| StageError::Score(format!("LLM scoring of '{}': {e}", posting.title)))?;

        into_match_result(raw, posting)
    }
}

fn build_score_prompt(resume: &ResumeProfile, posting: &JobPosting) -> String {
    let mut excerpt = resume.raw_text.as_str();
    if let Some((idx, _)) = excerpt.char_indices().nth(PROMPT_TEXT_BUDGET) {
        excerpt = &excerpt[..idx];
    }

    SCORE_PROMPT_TEMPLATE
        .replace("{resume_skills}", &resume.skills.join(", "))
        .replace("{resume_text}", excerpt)
        .replace("{job_title}", &posting.title)
        .replace("{job_location}", posting.location.as_deref().unwrap_or("unknown"))
        .replace("{job_skills}", &posting.required_skills.join(", "))
}

/// Boundary validation: the contract is a score in [0, 100]; anything else
/// from the model is rejected rather than clamped into plausibility.
fn into_match_result(raw: RawVerdict, posting: &JobPosting) -> Result<MatchResult, StageError> {
    if !(0..=100).contains(&raw.score) {
        return Err(StageError::Score(format!(
            "model returned out-of-range score {} for '{}'",
            raw.score, posting.title
        )));
    }
    let score = raw.score as u8;

    Ok(MatchResult {
        posting: posting.clone(),
        score,
        skill_gap: raw.skill_gap.unwrap_or_default(),
        priority: MatchPriority::from_score(score),
        improvements: raw.improvements,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordJobScorer
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic skill-overlap scorer. No network, no model.
///
/// score = base 40 + 60 × (covered required skills / required skills),
/// where a required skill is covered if it matches a resume skill
/// case-insensitively or appears in the resume text. A posting that lists
/// no required skills scores the base alone.
pub struct KeywordJobScorer;

#[async_trait]
impl ScoreJob for KeywordJobScorer {
    async fn score(
        &self,
        resume: &ResumeProfile,
        posting: &JobPosting,
    ) -> Result<MatchResult, StageError> {
        Ok(keyword_score(resume, posting))
    }
}

fn keyword_score(resume: &ResumeProfile, posting: &JobPosting) -> MatchResult {
    let resume_skills: Vec<String> = resume.skills.iter().map(|s| s.to_lowercase()).collect();
    let text_lower = resume.raw_text.to_lowercase();

    let mut covered = 0usize;
    let mut missing = Vec::new();

    for required in &posting.required_skills {
        let needle = required.to_lowercase();
        if resume_skills.iter().any(|s| *s == needle) || text_lower.contains(&needle) {
            covered += 1;
        } else {
            missing.push(required.as_str());
        }
    }

    let score: u8 = if posting.required_skills.is_empty() {
        40
    } else {
        (40 + 60 * covered / posting.required_skills.len()) as u8
    };

    let skill_gap = if missing.is_empty() {
        "No obvious skill gap for this posting.".to_string()
    } else {
        format!("Posting asks for {} not shown on the resume.", missing.join(", "))
    };

    let improvements = missing
        .first()
        .map(|skill| format!("Highlight any {skill} exposure, even from side projects."));

    MatchResult {
        posting: posting.clone(),
        score,
        skill_gap,
        priority: MatchPriority::from_score(score),
        improvements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(skills: &[&str], text: &str) -> ResumeProfile {
        ResumeProfile {
            name: "Ada".to_string(),
            phone: None,
            email: Some("ada@example.com".to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            raw_text: text.to_string(),
        }
    }

    fn posting(skills: &[&str]) -> JobPosting {
        JobPosting {
            title: "Backend Engineer".to_string(),
            location: Some("Pune".to_string()),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            apply_url: "https://jobs.example.com/backend".to_string(),
            company: "Example".to_string(),
            seniority: None,
        }
    }

    #[test]
    fn test_keyword_full_overlap_scores_100() {
        let result = keyword_score(&resume(&["Python", "SQL"], ""), &posting(&["python", "sql"]));
        assert_eq!(result.score, 100);
        assert_eq!(result.priority, MatchPriority::High);
        assert!(result.improvements.is_none());
    }

    #[test]
    fn test_keyword_no_overlap_scores_base() {
        let result = keyword_score(&resume(&["Python"], ""), &posting(&["Kubernetes", "Go"]));
        assert_eq!(result.score, 40);
        assert!(result.skill_gap.contains("Kubernetes"));
        assert!(result.skill_gap.contains("Go"));
    }

    #[test]
    fn test_keyword_counts_raw_text_mentions() {
        let result = keyword_score(
            &resume(&[], "Shipped services on Kubernetes for two years"),
            &posting(&["Kubernetes"]),
        );
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_keyword_no_required_skills_scores_base() {
        let result = keyword_score(&resume(&["Python"], ""), &posting(&[]));
        assert_eq!(result.score, 40);
    }

    #[test]
    fn test_keyword_score_always_in_range() {
        for n in 0..6 {
            let skills: Vec<String> = (0..n).map(|i| format!("skill{i}")).collect();
            let skill_refs: Vec<&str> = skills.iter().map(String::as_str).collect();
            let result = keyword_score(&resume(&["skill0"], ""), &posting(&skill_refs));
            assert!(result.score <= 100);
        }
    }

    #[test]
    fn test_raw_verdict_out_of_range_rejected() {
        let raw = RawVerdict {
            score: 120,
            skill_gap: None,
            improvements: None,
        };
        let err = into_match_result(raw, &posting(&[])).unwrap_err();
        assert!(matches!(err, StageError::Score(_)));
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn test_raw_verdict_negative_rejected() {
        let raw = RawVerdict {
            score: -5,
            skill_gap: None,
            improvements: None,
        };
        assert!(into_match_result(raw, &posting(&[])).is_err());
    }

    #[test]
    fn test_raw_verdict_in_range_coerced() {
        let raw = RawVerdict {
            score: 87,
            skill_gap: Some("No Terraform experience".to_string()),
            improvements: Some("Add IaC projects".to_string()),
        };
        let result = into_match_result(raw, &posting(&["Terraform"])).unwrap();
        assert_eq!(result.score, 87);
        assert_eq!(result.priority, MatchPriority::High);
        assert_eq!(result.skill_gap, "No Terraform experience");
    }

    #[test]
    fn test_score_prompt_mentions_posting_fields() {
        let prompt = build_score_prompt(&resume(&["Python"], "worked on data"), &posting(&["SQL"]));
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("Pune"));
        assert!(prompt.contains("Python"));
        assert!(prompt.contains("SQL"));
    }
}
