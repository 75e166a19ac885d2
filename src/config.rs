// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default local chat proxy endpoint.
pub const DEFAULT_GROQ_PROXY_URL: &str = "http://localhost:3001/api/groq-chat";
/// Default chat model requested from the proxy.
pub const DEFAULT_GROQ_MODEL: &str = "openai/gpt-oss-20b";
const DEFAULT_RECONCILE_DELAY_MS: u64 = 500;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL (auth and REST live under it)
    pub supabase_url: String,
    /// Supabase public (anon) API key
    pub supabase_anon_key: String,
    /// Chat-completion proxy endpoint
    pub groq_proxy_url: String,
    /// Model id sent with every chat request
    pub groq_model: String,
    /// Static chapter catalog (JSON)
    pub chapters_path: PathBuf,
    /// Where the auth session is persisted between runs (memory only if None)
    pub session_file: Option<PathBuf>,
    /// Delay before the reconcile read that follows a stats update
    pub reconcile_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            groq_proxy_url: env::var("GROQ_PROXY_URL")
                .unwrap_or_else(|_| DEFAULT_GROQ_PROXY_URL.to_string()),
            groq_model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            chapters_path: env::var("CHAPTERS_PATH")
                .unwrap_or_else(|_| "data/chapters.json".to_string())
                .into(),
            session_file: env::var("SESSION_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            reconcile_delay: Duration::from_millis(
                env::var("PROFILE_RECONCILE_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RECONCILE_DELAY_MS),
            ),
        })
    }

    /// Offline configuration for tests.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            groq_proxy_url: DEFAULT_GROQ_PROXY_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            chapters_path: "data/chapters.json".into(),
            session_file: None,
            reconcile_delay: Duration::from_millis(10),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("SUPABASE_URL", "https://example.supabase.co/");
        env::set_var("SUPABASE_ANON_KEY", " anon ");
        env::remove_var("GROQ_PROXY_URL");
        env::remove_var("PROFILE_RECONCILE_DELAY_MS");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.supabase_url, "https://example.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.groq_proxy_url, DEFAULT_GROQ_PROXY_URL);
        assert_eq!(config.reconcile_delay, Duration::from_millis(500));
    }
}
