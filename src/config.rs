//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Origins allowed when `DESTINY_CORS_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
    "https://destiny-engine.vercel.app",
];

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite file for the prediction log.
    pub db_path: PathBuf,
    /// Directory holding `university_ranks.csv` and `wealth_data.json`.
    pub data_dir: Option<PathBuf>,
    pub llm_backend: LlmBackend,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub llm_timeout: Duration,
    pub cors_origins: Vec<String>,
    /// Questionnaire sessions idle for this long are pruned.
    pub session_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_path: PathBuf::from("./data/destiny.db"),
            data_dir: None,
            llm_backend: LlmBackend::Groq,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            llm_timeout: Duration::from_secs(30),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            session_idle_timeout: Duration::from_secs(1800), // 30 minutes
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment, after loading an
    /// optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let llm_backend = match get("LLM_BACKEND") {
            Some(raw) => raw
                .parse::<LlmBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "LLM_BACKEND".to_string(),
                    message,
                })?,
            None => defaults.llm_backend,
        };
        let key_var = match llm_backend {
            LlmBackend::Groq => "GROQ_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
        };

        Ok(Self {
            host: get("DESTINY_HOST").unwrap_or(defaults.host),
            port: parse_or("DESTINY_PORT", get("DESTINY_PORT"), defaults.port)?,
            db_path: get("DESTINY_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            data_dir: get("DESTINY_DATA_DIR").map(PathBuf::from),
            llm_backend,
            api_key: get(key_var).map(SecretString::from),
            model: get("MODEL_NAME").unwrap_or(defaults.model),
            llm_timeout: parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 30)
                .map(Duration::from_secs)?,
            cors_origins: get("DESTINY_CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            session_idle_timeout: parse_or(
                "DESTINY_SESSION_IDLE_SECS",
                get("DESTINY_SESSION_IDLE_SECS"),
                1800,
            )
            .map(Duration::from_secs)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            backend: self.llm_backend,
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout: self.llm_timeout,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
    }
}
