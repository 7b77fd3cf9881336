//! Workflow pipeline — the orchestration core.
//!
//! `Orchestrator` drives one analysis run through an explicit stage
//! machine (`Parsing → Scraping → Scoring → Done/Failed`) over a single
//! `PipelineState`, applying per-stage timeouts, the partial-failure
//! policy for scoring, and the best-effort history write at the end.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{should_offer_email, Orchestrator, OrchestratorSettings};
pub use state::{PipelineState, RunOutcome, Stage};
