//! Request façade — translates inbound multipart/query requests into
//! orchestrator invocations and pipeline state into response payloads.
//! Validation of field *content* stays with the owning stage; handlers
//! only check that the multipart fields are present.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::history::HistoryEntry;
use crate::models::job::{JobPosting, MatchPriority, MatchResult};
use crate::models::resume::ResumeProfile;
use crate::pipeline::{PipelineState, RunOutcome};
use crate::state::AppState;

const DEFAULT_USER: &str = "user1";
const HISTORY_LIMIT: usize = 10;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub company: String,
    pub jobs_count: usize,
    pub top_match: Option<u8>,
    pub partial: bool,
    pub offer_email: bool,
    pub resume_info: ResumeInfo,
    pub jobs: Vec<JobView>,
}

#[derive(Serialize)]
pub struct ResumeInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
}

impl From<&ResumeProfile> for ResumeInfo {
    fn from(profile: &ResumeProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            skills: profile.skills.clone(),
        }
    }
}

/// Flattened match view returned to the client, best match first.
#[derive(Serialize)]
pub struct JobView {
    pub title: String,
    pub location: Option<String>,
    pub match_score: u8,
    pub priority: MatchPriority,
    pub skill_gap: String,
    pub improvements: Option<String>,
    pub apply_url: String,
}

impl From<&MatchResult> for JobView {
    fn from(result: &MatchResult) -> Self {
        Self {
            title: result.posting.title.clone(),
            location: result.posting.location.clone(),
            match_score: result.score,
            priority: result.priority,
            skill_gap: result.skill_gap.clone(),
            improvements: result.improvements.clone(),
            apply_url: result.posting.apply_url.clone(),
        }
    }
}

/// POST /analyze — multipart form: `resume` file, `company_url`, optional
/// `user_id`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let form = AnalyzeForm::read(multipart).await?;

    let run = state
        .orchestrator
        .run(form.resume, &form.mime, &form.company_url, &form.user_id)
        .await;

    match run.outcome.clone() {
        Some(RunOutcome::Success { partial, .. }) => {
            Ok(Json(build_analyze_response(&state, &run, partial)))
        }
        Some(RunOutcome::Failed { stage, message }) => Err(AppError::Pipeline { stage, message }),
        None => Err(AppError::Internal(anyhow::anyhow!(
            "run finished without an outcome"
        ))),
    }
}

fn build_analyze_response(state: &AppState, run: &PipelineState, partial: bool) -> AnalyzeResponse {
    let jobs: Vec<JobView> = run
        .matches
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(JobView::from)
        .collect();

    let resume_info = run
        .resume
        .as_ref()
        .map(ResumeInfo::from)
        .unwrap_or(ResumeInfo {
            name: String::new(),
            email: None,
            phone: None,
            skills: vec![],
        });

    AnalyzeResponse {
        success: true,
        company: run.company_name().to_string(),
        jobs_count: run.jobs_found(),
        top_match: run.top_score(),
        partial,
        offer_email: state.orchestrator.offer_email(run),
        resume_info,
        jobs,
    }
}

struct AnalyzeForm {
    resume: Bytes,
    mime: String,
    company_url: String,
    user_id: String,
}

impl AnalyzeForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut resume: Option<(Bytes, String)> = None;
        let mut company_url: Option<String> = None;
        let mut user_id = DEFAULT_USER.to_string();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("bad multipart payload: {e}")))?
        {
            match field.name() {
                Some("resume") => {
                    let mime = field
                        .content_type()
                        .unwrap_or("application/pdf")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("could not read resume: {e}")))?;
                    resume = Some((data, mime));
                }
                Some("company_url") => company_url = Some(read_text(field).await?),
                Some("user_id") => user_id = read_text(field).await?,
                _ => {}
            }
        }

        let (resume, mime) =
            resume.ok_or_else(|| AppError::Validation("missing 'resume' file field".into()))?;
        let company_url =
            company_url.ok_or_else(|| AppError::Validation("missing 'company_url' field".into()))?;

        Ok(Self {
            resume,
            mime,
            company_url,
            user_id,
        })
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("could not read form field: {e}")))
}

#[derive(Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
}

/// POST /send-email — multipart form: `resume` file, `receiver_email`,
/// optional `jobs` (JSON array of the selected postings). A separate,
/// caller-confirmed invocation; analysis never sends email on its own.
pub async fn handle_send_email(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SendEmailResponse>, AppError> {
    let mut resume: Option<(Bytes, String)> = None;
    let mut receiver: Option<String> = None;
    let mut jobs: Vec<JobPosting> = Vec::new();
    let mut user_id = DEFAULT_USER.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("bad multipart payload: {e}")))?
    {
        match field.name() {
            Some("resume") => {
                let mime = field
                    .content_type()
                    .unwrap_or("application/pdf")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read resume: {e}")))?;
                resume = Some((data, mime));
            }
            Some("receiver_email") => receiver = Some(read_text(field).await?),
            Some("user_id") => user_id = read_text(field).await?,
            Some("jobs") => {
                let raw = read_text(field).await?;
                jobs = serde_json::from_str(&raw)
                    .map_err(|e| AppError::Validation(format!("invalid 'jobs' JSON: {e}")))?;
            }
            _ => {}
        }
    }

    let (resume, mime) =
        resume.ok_or_else(|| AppError::Validation("missing 'resume' file field".into()))?;
    let receiver =
        receiver.ok_or_else(|| AppError::Validation("missing 'receiver_email' field".into()))?;

    let run = state
        .orchestrator
        .send_outreach(resume, &mime, &receiver, jobs, &user_id)
        .await?;

    Ok(Json(SendEmailResponse {
        success: run.email_sent,
        message: run.email_message.unwrap_or_default(),
    }))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<String>,
    pub limit: Option<usize>,
}

/// GET /history — most recent analysis summaries for a user.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let user_id = params.user_id.unwrap_or_else(|| DEFAULT_USER.to_string());
    let limit = params.limit.unwrap_or(HISTORY_LIMIT);
    let entries = state.history.list(&user_id, limit).await?;
    Ok(Json(entries))
}
