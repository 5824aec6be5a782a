use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::service::http::HttpOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the job board API, e.g. `https://jobs.example.com/api`.
    pub api_url: String,
    /// Bearer token. Takes precedence over `token_file`.
    pub token: Option<String>,
    /// File holding the bearer token (the CLI's local storage).
    pub token_file: Option<PathBuf>,
    /// Set via JOBBOARD_POLL_INTERVAL_MS. Default: 60000.
    pub poll_interval_ms: u64,
    /// Set via JOBBOARD_HTTP_TIMEOUT_SECS. Default: 15.
    pub http_timeout_secs: u64,
    /// Set via JOBBOARD_HTTP_RETRIES. Default: 2. 0 = no retries.
    pub http_retries: u32,
    pub log_json: bool,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.http_timeout_secs),
            max_retries: self.http_retries,
            ..HttpOptions::default()
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let api_url = lookup("JOBBOARD_API_URL").unwrap_or_else(|| "http://localhost:5000/api".into());
    let parsed = url::Url::parse(&api_url)
        .with_context(|| format!("JOBBOARD_API_URL is not a valid URL: {}", api_url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("JOBBOARD_API_URL must be http or https, got '{}'", parsed.scheme());
    }

    let poll_interval_ms = lookup("JOBBOARD_POLL_INTERVAL_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(60_000);
    if poll_interval_ms == 0 {
        anyhow::bail!("JOBBOARD_POLL_INTERVAL_MS must be greater than zero");
    }

    let http_timeout_secs = lookup("JOBBOARD_HTTP_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(15);
    if http_timeout_secs == 0 {
        anyhow::bail!("JOBBOARD_HTTP_TIMEOUT_SECS must be greater than zero");
    }

    Ok(Config {
        api_url,
        token: lookup("JOBBOARD_TOKEN").filter(|t| !t.trim().is_empty()),
        token_file: lookup("JOBBOARD_TOKEN_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from),
        poll_interval_ms,
        http_timeout_secs,
        http_retries: lookup("JOBBOARD_HTTP_RETRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(2),
        log_json: lookup("JOBBOARD_LOG_JSON")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false),
    })
}
