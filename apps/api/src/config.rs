use anyhow::{bail, Context, Result};

/// Which backend serves as the primary history store. Resolved once at
/// startup and injected; never read from ambient state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackendKind {
    Postgres,
    Local,
}

/// Which scorer backend to use for the scoring stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    Llm,
    Keyword,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub history_backend: HistoryBackendKind,
    /// Required when `history_backend` is Postgres.
    pub database_url: Option<String>,
    /// Append-only JSONL file used as the local backend and as the
    /// fallback for degraded remote writes.
    pub history_file: String,
    pub scorer: ScorerKind,
    /// Required when `scorer` is Llm.
    pub anthropic_api_key: Option<String>,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub port: u16,
    pub rust_log: String,
    /// Per-stage timeout applied to every external stage call.
    pub stage_timeout_secs: u64,
    /// Bound on concurrent scoring calls within one run.
    pub scoring_concurrency: usize,
    /// Top score below which the client is offered the cold-email action.
    pub email_offer_threshold: u8,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let history_backend = match std::env::var("HISTORY_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .as_str()
        {
            "postgres" => HistoryBackendKind::Postgres,
            "local" => HistoryBackendKind::Local,
            other => bail!("HISTORY_BACKEND must be 'postgres' or 'local', got '{other}'"),
        };

        let scorer = match std::env::var("SCORER")
            .unwrap_or_else(|_| "llm".to_string())
            .as_str()
        {
            "llm" => ScorerKind::Llm,
            "keyword" => ScorerKind::Keyword,
            other => bail!("SCORER must be 'llm' or 'keyword', got '{other}'"),
        };

        let database_url = match history_backend {
            HistoryBackendKind::Postgres => Some(require_env("DATABASE_URL")?),
            HistoryBackendKind::Local => std::env::var("DATABASE_URL").ok(),
        };

        let anthropic_api_key = match scorer {
            ScorerKind::Llm => Some(require_env("ANTHROPIC_API_KEY")?),
            ScorerKind::Keyword => std::env::var("ANTHROPIC_API_KEY").ok(),
        };

        Ok(Config {
            history_backend,
            database_url,
            history_file: std::env::var("HISTORY_FILE")
                .unwrap_or_else(|_| "data/history.jsonl".to_string()),
            scorer,
            anthropic_api_key,
            smtp_host: require_env("SMTP_HOST")?,
            smtp_username: require_env("SMTP_USERNAME")?,
            smtp_password: require_env("SMTP_PASSWORD")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            stage_timeout_secs: std::env::var("STAGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<u64>()
                .context("STAGE_TIMEOUT_SECS must be a positive integer")?,
            scoring_concurrency: std::env::var("SCORING_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse::<usize>()
                .context("SCORING_CONCURRENCY must be a positive integer")?,
            email_offer_threshold: std::env::var("EMAIL_OFFER_THRESHOLD")
                .unwrap_or_else(|_| "80".to_string())
                .parse::<u8>()
                .context("EMAIL_OFFER_THRESHOLD must be in 0..=100")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
