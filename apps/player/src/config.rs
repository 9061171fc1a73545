//! Player configuration from the environment.

use std::time::Duration;

use exercise_core::SessionConfig;

use crate::retry::RetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings of the terminal player.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub feedback_delay: Duration,
    pub draft_debounce: Duration,
    pub progress_retry_attempts: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            api_token: None,
            feedback_delay: SessionConfig::default().feedback_delay,
            draft_debounce: Duration::from_millis(150),
            progress_retry_attempts: 3,
        }
    }
}

impl PlayerConfig {
    /// Read settings from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("EXERCISE_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let api_token = lookup("EXERCISE_API_TOKEN").filter(|t| !t.trim().is_empty());

        let feedback_delay = match lookup("FEEDBACK_DELAY_MS") {
            Some(value) => Duration::from_millis(parse_number("FEEDBACK_DELAY_MS", &value)?),
            None => defaults.feedback_delay,
        };

        let draft_debounce = match lookup("DRAFT_DEBOUNCE_MS") {
            Some(value) => Duration::from_millis(parse_number("DRAFT_DEBOUNCE_MS", &value)?),
            None => defaults.draft_debounce,
        };

        let progress_retry_attempts = match lookup("PROGRESS_RETRY_ATTEMPTS") {
            Some(value) => parse_number("PROGRESS_RETRY_ATTEMPTS", &value)?.max(1) as usize,
            None => defaults.progress_retry_attempts,
        };

        Ok(Self {
            api_url,
            api_token,
            feedback_delay,
            draft_debounce,
            progress_retry_attempts,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            feedback_delay: self.feedback_delay,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.progress_retry_attempts,
            ..RetryConfig::default()
        }
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
