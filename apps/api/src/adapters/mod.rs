//! Stage adapters — the four external-capability boundaries of the pipeline.
//!
//! Each trait is a typed, function-like boundary: typed input in, typed
//! output or a `StageError` out. Concrete implementations live alongside
//! (`parser`, `scraper`, `scoring`, `emailer`); the orchestrator only ever
//! sees the traits, so tests swap in mocks freely.
//!
//! Untyped external payloads (LLM JSON, scraped HTML) are validated and
//! coerced into the model types *here*, at the boundary. Malformed data is
//! rejected as the owning stage's error and never reaches the orchestrator.

pub mod emailer;
pub mod parser;
pub mod prompts;
pub mod scoring;
pub mod scraper;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::models::job::{JobPosting, MatchResult};
use crate::models::resume::ResumeProfile;

/// Failure of one pipeline stage. Every variant carries a human-readable
/// message; `stage()` names the stage for log lines and API responses.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error("resume parsing failed: {0}")]
    Parse(String),

    #[error("job scraping failed: {0}")]
    Scrape(String),

    #[error("job scoring failed: {0}")]
    Score(String),

    #[error("email dispatch failed: {0}")]
    EmailDispatch(String),

    #[error("stage '{stage}' timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },
}

impl StageError {
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Parse(_) => "parse",
            StageError::Scrape(_) => "scrape",
            StageError::Score(_) => "score",
            StageError::EmailDispatch(_) => "email",
            StageError::Timeout { stage, .. } => stage,
        }
    }
}

/// Scrape output: the postings plus the company name the scraper resolved
/// while it had the page in hand.
#[derive(Debug, Clone)]
pub struct ScrapedJobs {
    pub company: String,
    pub postings: Vec<JobPosting>,
}

/// Receipt from an email dispatch attempt.
#[derive(Debug, Clone)]
pub struct EmailReceipt {
    pub success: bool,
    pub message: String,
}

/// Resume text extraction. May return zero skills; an unreadable or empty
/// document is a `StageError::Parse`.
#[async_trait]
pub trait ParseResume: Send + Sync {
    async fn parse(&self, input: Bytes, mime: &str) -> Result<ResumeProfile, StageError>;
}

/// Career-page scraping. An empty posting list is a valid result, not an
/// error — some companies simply have no openings.
#[async_trait]
pub trait ScrapeJobs: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedJobs, StageError>;
}

/// Scores one resume/posting pair. Implementations must return a score in
/// [0, 100] or reject with `StageError::Score`.
#[async_trait]
pub trait ScoreJob: Send + Sync {
    async fn score(
        &self,
        resume: &ResumeProfile,
        posting: &JobPosting,
    ) -> Result<MatchResult, StageError>;
}

/// Cold-outreach dispatch with the resume attached.
#[async_trait]
pub trait SendEmail: Send + Sync {
    async fn send(
        &self,
        resume: &ResumeProfile,
        postings: &[JobPosting],
        recipient: &str,
        attachment: Bytes,
    ) -> Result<EmailReceipt, StageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_names_its_stage() {
        assert_eq!(StageError::Parse("x".into()).stage(), "parse");
        assert_eq!(StageError::Scrape("x".into()).stage(), "scrape");
        assert_eq!(StageError::Score("x".into()).stage(), "score");
        assert_eq!(StageError::EmailDispatch("x".into()).stage(), "email");
        assert_eq!(
            StageError::Timeout {
                stage: "scrape",
                seconds: 30
            }
            .stage(),
            "scrape"
        );
    }

    #[test]
    fn test_timeout_message_names_stage_and_duration() {
        let err = StageError::Timeout {
            stage: "score",
            seconds: 45,
        };
        let msg = err.to_string();
        assert!(msg.contains("score"));
        assert!(msg.contains("45"));
    }
}
