use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Runtime configuration, sourced from the environment (`.env` honored in
/// local runs, never required).
#[derive(Debug, Clone)]
pub struct Config {
    // Calendar provider
    pub te_base_url: String,
    pub te_client: String,
    pub country: String,
    pub high_impact_only: bool,
    // Poll loop
    pub poll_interval_secs: u64,
    pub window_minutes: i64,
    // State
    pub state_dir: PathBuf,
    // Chat transport
    pub telegram_api_base: String,
    pub telegram_bot_token: String,
    // HTTP
    pub http_timeout_secs: u64,
    pub bind_addr: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_or(key, default)
        .parse()
        .with_context(|| format!("failed to parse {key}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // don't fail if .env missing

        let telegram_bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN missing")?;

        Ok(Config {
            te_base_url: env_or("TE_BASE_URL", "https://api.tradingeconomics.com"),
            te_client: env_or("TE_CLIENT", "guest:guest"),
            country: env_or("TE_COUNTRY", "United States"),
            high_impact_only: parse_env("HIGH_IMPACT_ONLY", "true")?,
            poll_interval_secs: parse_env("POLL_EVERY_SECONDS", "60")?,
            window_minutes: parse_env("WINDOW_MINUTES", "6")?,
            state_dir: PathBuf::from(env_or("STATE_DIR", "state")),
            telegram_api_base: env_or("TELEGRAM_API_BASE", "https://api.telegram.org"),
            telegram_bot_token,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", "20")?,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
        })
    }
}
