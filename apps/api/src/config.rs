use anyhow::{Context, Result};

/// Thirty days; translated UI bundles only change when the English bundle does.
const DEFAULT_UI_TEXT_CACHE_TTL_SECS: u64 = 60 * 60 * 24 * 30;
const DEFAULT_TRANSIENT_CACHE_CAPACITY: usize = 1_000;
const DEFAULT_TRANSIENT_CACHE_TTL_SECS: u64 = 60 * 60;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Public prefix under which uploaded face images are reachable by the model.
    pub s3_public_base_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub ui_text_cache_ttl_secs: u64,
    /// Bound on in-memory translations of guest readings, chat replies and ad-hoc objects.
    pub transient_cache_capacity: usize,
    pub transient_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_public_base_url: require_env("S3_PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ui_text_cache_ttl_secs: optional_number(
                "UI_TEXT_CACHE_TTL_SECS",
                DEFAULT_UI_TEXT_CACHE_TTL_SECS,
            )?,
            transient_cache_capacity: optional_number(
                "TRANSIENT_CACHE_CAPACITY",
                DEFAULT_TRANSIENT_CACHE_CAPACITY,
            )?,
            transient_cache_ttl_secs: optional_number(
                "TRANSIENT_CACHE_TTL_SECS",
                DEFAULT_TRANSIENT_CACHE_TTL_SECS,
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a whole number")),
        Err(_) => Ok(default),
    }
}
