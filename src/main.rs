use std::sync::Arc;

use destiny_engine::api::{AppState, app_router};
use destiny_engine::config::ServerConfig;
use destiny_engine::error::LlmError;
use destiny_engine::llm::{LlmProvider, create_provider};
use destiny_engine::oracle::{Oracle, ReferenceData};
use destiny_engine::questionnaire::{QuestionSet, SessionRegistry, spawn_prune_task};
use destiny_engine::store::{LibSqlStore, PredictionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("🔮 Destiny Engine v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({})", config.model, config.llm_backend.name());
    eprintln!("   API: http://{}/api", config.bind_addr());

    // ── Reference data ──────────────────────────────────────────────────
    let reference = Arc::new(ReferenceData::load(config.data_dir.as_deref())?);
    eprintln!(
        "   Reference data: {} universities",
        reference.universities.len()
    );

    // ── LLM ─────────────────────────────────────────────────────────────
    let llm: Option<Arc<dyn LlmProvider>> = match create_provider(&config.llm_config()) {
        Ok(llm) => Some(llm),
        Err(LlmError::NotConfigured { provider }) => {
            tracing::warn!(provider = %provider, "No API key set, the Oracle will rely on fallbacks");
            eprintln!("   LLM: not configured (fallback predictions only)");
            None
        }
        Err(e) => return Err(e.into()),
    };

    // ── Database ────────────────────────────────────────────────────────
    let store: Option<Arc<dyn PredictionStore>> = match LibSqlStore::new_local(&config.db_path).await
    {
        Ok(store) => {
            eprintln!("   Database: {}", config.db_path.display());
            Some(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable, predictions will not be recorded");
            eprintln!("   Database: unavailable ({e})");
            None
        }
    };

    // ── Questionnaire sessions ──────────────────────────────────────────
    let sessions = SessionRegistry::new(QuestionSet::destiny(), config.session_idle_timeout);
    let _prune_handle = spawn_prune_task(Arc::clone(&sessions));

    let oracle = Arc::new(Oracle::new(llm, Arc::clone(&reference)));
    if let Some(report) = oracle.check_connection_at_startup().await {
        eprintln!("   LLM: {}", report.message);
    }

    let state = AppState {
        oracle,
        store,
        reference,
    };
    let app = app_router(state, sessions, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Destiny Engine listening");
    axum::serve(listener, app).await?;

    Ok(())
}
