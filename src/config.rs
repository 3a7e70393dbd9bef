use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub ner_api_url: String,
    pub ner_api_token: String,
    pub gcp_bucket: String,
    pub gcp_access_token: String,
    pub speech_api_key: String,
    pub cors_origins: Vec<String>,
    pub auth_rate_limit: u32,
    pub auth_rate_window_secs: u64,
    /// Honour `X-Forwarded-For` for rate-limit keys; only set behind a proxy.
    pub trust_proxy: bool,
    pub external_timeout_secs: u64,
    pub code_run_timeout_ms: u64,
    pub mcq_question_count: usize,
    pub node_binary: String,
    pub ffmpeg_binary: String,
    pub pdftotext_binary: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:5050"),
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_ttl_hours: get_env_parse_or("JWT_TTL_HOURS", 24)?,
            llm_api_url: get_env_or("LLM_API_URL", "https://llm.chutes.ai/v1/chat/completions"),
            llm_api_key: get_env("LLM_API_KEY")?,
            llm_model: get_env_or("LLM_MODEL", "openai/gpt-oss-20b"),
            ner_api_url: get_env("NER_API_URL")?,
            ner_api_token: get_env("NER_API_TOKEN")?,
            gcp_bucket: get_env("GCP_BUCKET")?,
            gcp_access_token: get_env("GCP_ACCESS_TOKEN")?,
            speech_api_key: get_env("SPEECH_API_KEY")?,
            cors_origins: get_env_or("CORS_ORIGINS", "http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            auth_rate_limit: get_env_parse_or("AUTH_RATE_LIMIT", 100)?,
            auth_rate_window_secs: get_env_parse_or("AUTH_RATE_WINDOW_SECS", 900)?,
            trust_proxy: get_env_parse_or("TRUST_PROXY", false)?,
            external_timeout_secs: get_env_parse_or("EXTERNAL_TIMEOUT_SECS", 90)?,
            code_run_timeout_ms: get_env_parse_or("CODE_RUN_TIMEOUT_MS", 5000)?,
            mcq_question_count: get_env_parse_or("MCQ_QUESTION_COUNT", 8)?,
            node_binary: get_env_or("NODE_BINARY", "node"),
            ffmpeg_binary: get_env_or("FFMPEG_BINARY", "ffmpeg"),
            pdftotext_binary: get_env_or("PDFTOTEXT_BINARY", "pdftotext"),
        })
    }
}

pub fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

pub fn get_env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

pub fn init_config() -> Result<&'static Config> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
