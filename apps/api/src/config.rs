use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::providers::{ProviderConfig, ProviderKind};

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 20;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 45;
const DEFAULT_APP_NAME: &str = "SkillPath";

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to the recommender; nothing else reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Configured providers in priority order. Empty means every request gets the mock plan.
    pub providers: Vec<ProviderConfig>,
    /// Bound on a single provider attempt (also the HTTP client timeout).
    pub provider_timeout: Duration,
    /// Bound on one whole recommendation, across all provider attempts.
    pub request_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut providers = Vec::new();
        for kind in ProviderKind::PRIORITY {
            let Some(api_key) = get(kind.api_key_var()) else {
                continue;
            };

            let extra_headers = match kind {
                ProviderKind::OpenAi => Vec::new(),
                ProviderKind::OpenRouter => {
                    let mut headers = vec![(
                        "X-Title".to_string(),
                        get("OPENROUTER_APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
                    )];
                    if let Some(site) = get("OPENROUTER_SITE_URL") {
                        headers.push(("HTTP-Referer".to_string(), site));
                    }
                    headers
                }
            };

            providers.push(ProviderConfig {
                kind,
                api_key,
                endpoint: get(kind.endpoint_var())
                    .unwrap_or_else(|| kind.default_endpoint().to_string()),
                model: get(kind.model_var()).unwrap_or_else(|| kind.default_model().to_string()),
                extra_headers,
            });
        }

        Ok(Config {
            providers,
            provider_timeout: Duration::from_secs(parse_or(
                get("PROVIDER_TIMEOUT_SECS"),
                "PROVIDER_TIMEOUT_SECS",
                DEFAULT_PROVIDER_TIMEOUT_SECS,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            port: parse_or(get("PORT"), "PORT", 8080)
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
