//! Orchestrator — sequences the pipeline stages over one `PipelineState`.
//!
//! The stage graph is an explicit loop over the `Stage` enum rather than a
//! graph-execution framework; every edge is a plain conditional on state
//! fields. Stage calls go through the adapter traits, each wrapped in a
//! per-stage timeout. Scoring fans out across a bounded worker pool and
//! applies the partial-failure policy: one bad posting never aborts the
//! analysis of the others.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::adapters::{
    EmailReceipt, ParseResume, ScoreJob, ScrapeJobs, SendEmail, StageError,
};
use crate::history::HistoryStore;
use crate::models::history::HistoryEntry;
use crate::models::job::{rank_matches, JobPosting, MatchResult};
use crate::models::resume::ResumeProfile;
use crate::pipeline::state::{PipelineState, RunOutcome, Stage};

/// Caller-facing routing predicate: whether the client should be offered
/// the cold-email action after an analysis run. The orchestrator never
/// sends email on its own; dispatch is a separate, explicitly confirmed
/// invocation.
pub fn should_offer_email(top_score: Option<u8>, threshold: u8) -> bool {
    top_score.unwrap_or(0) < threshold
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Timeout applied to every external stage call.
    pub stage_timeout: Duration,
    /// Bound on concurrent scoring calls within one run.
    pub scoring_concurrency: usize,
    /// Threshold for `should_offer_email`.
    pub email_offer_threshold: u8,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(60),
            scoring_concurrency: 4,
            email_offer_threshold: 80,
        }
    }
}

pub struct Orchestrator {
    parser: Arc<dyn ParseResume>,
    scraper: Arc<dyn ScrapeJobs>,
    scorer: Arc<dyn ScoreJob>,
    emailer: Arc<dyn SendEmail>,
    history: Arc<HistoryStore>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        parser: Arc<dyn ParseResume>,
        scraper: Arc<dyn ScrapeJobs>,
        scorer: Arc<dyn ScoreJob>,
        emailer: Arc<dyn SendEmail>,
        history: Arc<HistoryStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            parser,
            scraper,
            scorer,
            emailer,
            history,
            settings,
        }
    }

    /// Runs one analysis: parse → scrape → score, then the history write.
    /// Always returns the state with `outcome` set; fatal stage errors are
    /// recorded there, not propagated as `Err`.
    pub async fn run(
        &self,
        resume_input: Bytes,
        mime: &str,
        company_url: &str,
        user_id: &str,
    ) -> PipelineState {
        let mut state = PipelineState::new(user_id, company_url);
        let mut stage = Stage::Parsing;
        info!(run_id = %state.run_id, company_url, "Starting analysis run");

        while !stage.is_terminal() {
            stage = match stage {
                Stage::Parsing => {
                    match self
                        .with_timeout("parse", self.parser.parse(resume_input.clone(), mime))
                        .await
                    {
                        Ok(profile) => {
                            info!(run_id = %state.run_id, skills = profile.skills.len(), "Resume parsed");
                            state.resume = Some(profile);
                            Stage::Scraping
                        }
                        Err(e) => {
                            state.outcome = Some(RunOutcome::failed(&e));
                            Stage::Failed
                        }
                    }
                }

                Stage::Scraping => {
                    match self
                        .with_timeout("scrape", self.scraper.scrape(&state.company_url))
                        .await
                    {
                        Ok(scraped) => {
                            info!(
                                run_id = %state.run_id,
                                company = %scraped.company,
                                postings = scraped.postings.len(),
                                "Career page scraped"
                            );
                            state.company = Some(scraped.company);
                            let no_openings = scraped.postings.is_empty();
                            state.postings = Some(scraped.postings);
                            if no_openings {
                                // Valid terminal state: nothing to score.
                                state.matches = Some(Vec::new());
                                state.outcome = Some(RunOutcome::Success {
                                    partial: false,
                                    skipped: 0,
                                });
                                Stage::Done
                            } else {
                                Stage::Scoring
                            }
                        }
                        Err(e) => {
                            state.outcome = Some(RunOutcome::failed(&e));
                            Stage::Failed
                        }
                    }
                }

                Stage::Scoring => {
                    let (Some(resume), Some(postings)) =
                        (state.resume.clone(), state.postings.clone())
                    else {
                        state.outcome = Some(RunOutcome::failed(&StageError::Score(
                            "scoring started without parse and scrape output".to_string(),
                        )));
                        break;
                    };

                    let total = postings.len();
                    let (results, skipped) = self.score_all(resume, postings).await;
                    if results.is_empty() {
                        state.outcome = Some(RunOutcome::failed(&StageError::Score(format!(
                            "all {total} scoring calls failed"
                        ))));
                        Stage::Failed
                    } else {
                        state.matches = Some(rank_matches(results));
                        state.outcome = Some(RunOutcome::Success {
                            partial: skipped > 0,
                            skipped,
                        });
                        Stage::Done
                    }
                }

                Stage::Done | Stage::Failed => break,
            };
        }

        self.record_history(&state).await;

        info!(run_id = %state.run_id, outcome = ?state.outcome, "Analysis run finished");
        state
    }

    /// Scores every posting independently under the concurrency bound.
    /// Results come back in original scrape order regardless of completion
    /// order; failed postings are counted and skipped.
    async fn score_all(
        &self,
        resume: ResumeProfile,
        postings: Vec<JobPosting>,
    ) -> (Vec<MatchResult>, usize) {
        let limit = Arc::new(Semaphore::new(self.settings.scoring_concurrency.max(1)));
        let timeout = self.settings.stage_timeout;
        let mut tasks = JoinSet::new();

        for (idx, posting) in postings.into_iter().enumerate() {
            let scorer = Arc::clone(&self.scorer);
            let resume = resume.clone();
            let limit = Arc::clone(&limit);
            tasks.spawn(async move {
                let _permit = limit.acquire_owned().await;
                let verdict = match tokio::time::timeout(timeout, scorer.score(&resume, &posting))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(StageError::Timeout {
                        stage: "score",
                        seconds: timeout.as_secs(),
                    }),
                };
                (idx, posting.title, verdict)
            });
        }

        let mut slots: Vec<Option<MatchResult>> = Vec::new();
        let mut skipped = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, title, verdict)) => {
                    if slots.len() <= idx {
                        slots.resize(idx + 1, None);
                    }
                    match verdict {
                        Ok(result) => slots[idx] = Some(result),
                        Err(e) => {
                            warn!(posting = %title, "Skipping posting, scoring failed: {e}");
                            skipped += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Scoring task aborted: {e}");
                    skipped += 1;
                }
            }
        }

        (slots.into_iter().flatten().collect(), skipped)
    }

    /// Writes the run summary after a successful or partially successful
    /// run. Degradation is handled inside the store; a run never fails on
    /// its history write.
    async fn record_history(&self, state: &PipelineState) {
        let success = state
            .outcome
            .as_ref()
            .map(RunOutcome::is_success)
            .unwrap_or(false);
        if !success {
            return;
        }

        let entry = HistoryEntry::new(
            &state.user_id,
            state.company_name(),
            &state.company_url,
            state.jobs_found(),
            state.top_score(),
        );
        let disposition = self.history.append(&entry).await;
        info!(run_id = %state.run_id, ?disposition, "History entry recorded");
    }

    /// Whether the client should be offered the cold-email action for this
    /// finished run, using the configured threshold.
    pub fn offer_email(&self, state: &PipelineState) -> bool {
        should_offer_email(state.top_score(), self.settings.email_offer_threshold)
    }

    /// The explicit, caller-confirmed email invocation. Runs on its own
    /// `PipelineState`: re-parses the resume (the attachment bytes are the
    /// source of truth), dispatches via the SendEmail adapter, and records
    /// the result in the state's email fields. Dispatch failures are
    /// reported there rather than as errors; only parse problems propagate.
    pub async fn send_outreach(
        &self,
        resume_input: Bytes,
        mime: &str,
        recipient: &str,
        postings: Vec<JobPosting>,
        user_id: &str,
    ) -> Result<PipelineState, StageError> {
        let mut state = PipelineState::new(user_id, "");
        state.company = postings.first().map(|p| p.company.clone());

        let profile = self
            .with_timeout("parse", self.parser.parse(resume_input.clone(), mime))
            .await?;

        let receipt = match self
            .with_timeout(
                "email",
                self.emailer
                    .send(&profile, &postings, recipient, resume_input),
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(e @ (StageError::EmailDispatch(_) | StageError::Timeout { .. })) => {
                warn!(recipient, "Email dispatch failed: {e}");
                EmailReceipt {
                    success: false,
                    message: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };

        state.resume = Some(profile);
        state.postings = Some(postings);
        state.email_sent = receipt.success;
        state.email_message = Some(receipt.message);

        info!(
            run_id = %state.run_id,
            recipient,
            success = state.email_sent,
            "Outreach email attempt finished"
        );
        Ok(state)
    }

    async fn with_timeout<T, F>(&self, stage: &'static str, fut: F) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, StageError>>,
    {
        match tokio::time::timeout(self.settings.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StageError::Timeout {
                stage,
                seconds: self.settings.stage_timeout.as_secs(),
            }),
        }
    }
}
