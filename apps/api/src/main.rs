mod adapters;
mod config;
mod db;
mod errors;
mod history;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::emailer::SmtpMailer;
use crate::adapters::parser::PdfResumeParser;
use crate::adapters::scoring::{KeywordJobScorer, LlmJobScorer};
use crate::adapters::scraper::HtmlJobScraper;
use crate::adapters::ScoreJob;
use crate::config::{Config, HistoryBackendKind, ScorerKind};
use crate::db::create_pool;
use crate::history::local::JsonlHistoryBackend;
use crate::history::postgres::PgHistoryBackend;
use crate::history::{HistoryBackend, HistoryStore};
use crate::llm_client::LlmClient;
use crate::pipeline::{Orchestrator, OrchestratorSettings};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobScout API v{}", env!("CARGO_PKG_VERSION"));

    // History store: primary backend resolved once here, local JSONL file
    // always present as the fallback.
    let local = Arc::new(JsonlHistoryBackend::new(&config.history_file));
    let primary: Arc<dyn HistoryBackend> = match config.history_backend {
        HistoryBackendKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres history backend")?;
            let pool = create_pool(url).await?;
            Arc::new(PgHistoryBackend::new(pool))
        }
        HistoryBackendKind::Local => {
            info!("History primary backend: local JSONL file");
            local.clone()
        }
    };
    let history = Arc::new(HistoryStore::new(primary, local));

    // Stage adapters
    let parser = Arc::new(PdfResumeParser);
    let scraper = Arc::new(HtmlJobScraper::new(config.stage_timeout_secs));
    let scorer: Arc<dyn ScoreJob> = match config.scorer {
        ScorerKind::Llm => {
            let key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for the LLM scorer")?;
            info!("Scorer backend: LLM (model: {})", llm_client::MODEL);
            Arc::new(LlmJobScorer::new(LlmClient::new(
                key,
                config.stage_timeout_secs,
            )))
        }
        ScorerKind::Keyword => {
            info!("Scorer backend: keyword overlap");
            Arc::new(KeywordJobScorer)
        }
    };
    let emailer = Arc::new(SmtpMailer::new(
        &config.smtp_host,
        config.smtp_username.clone(),
        config.smtp_password.clone(),
    )?);

    let orchestrator = Arc::new(Orchestrator::new(
        parser,
        scraper,
        scorer,
        emailer,
        history.clone(),
        OrchestratorSettings {
            stage_timeout: Duration::from_secs(config.stage_timeout_secs),
            scoring_concurrency: config.scoring_concurrency,
            email_offer_threshold: config.email_offer_threshold,
        },
    ));

    let state = AppState {
        orchestrator,
        history,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
