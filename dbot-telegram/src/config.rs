//! Transport config: token, API base URL, timeouts and retry policy.
//! Loaded from env: BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL), POLL_TIMEOUT_SECS,
//! API_TIMEOUT_SECS, SEND_TIMEOUT_SECS, MAX_RETRIES, BACKOFF_FACTOR.

use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram transport config (connectivity only).
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Base URL of the Bot API; `None` means [`DEFAULT_API_URL`].
    pub telegram_api_url: Option<String>,
    /// Long-poll duration requested from the server (`timeout` of getUpdates).
    pub poll_timeout_secs: u64,
    /// Local timeout of the getUpdates request; must exceed `poll_timeout_secs`.
    pub api_timeout_secs: u64,
    /// Local timeout of a sendMessage request.
    pub send_timeout_secs: u64,
    /// Retries after the first attempt on transient failures.
    pub max_retries: u32,
    /// Retry n sleeps `backoff_factor * 2^(n-1)` seconds.
    pub backoff_factor: f64,
}

impl TelegramConfig {
    /// Loads from env: BOT_TOKEN required; everything else optional with defaults.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like [`from_env`](Self::from_env), but `token` (when given) overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let mut config = Self::with_token(bot_token);
        config.telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        config.poll_timeout_secs = env_or("POLL_TIMEOUT_SECS", config.poll_timeout_secs)?;
        config.api_timeout_secs = env_or("API_TIMEOUT_SECS", config.api_timeout_secs)?;
        config.send_timeout_secs = env_or("SEND_TIMEOUT_SECS", config.send_timeout_secs)?;
        config.max_retries = env_or("MAX_RETRIES", config.max_retries)?;
        config.backoff_factor = env_or("BACKOFF_FACTOR", config.backoff_factor)?;
        Ok(config)
    }

    /// Builds config with the given token and default timeouts/retries.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            poll_timeout_secs: 30,
            api_timeout_secs: 35,
            send_timeout_secs: 10,
            max_retries: 3,
            backoff_factor: 0.3,
        }
    }

    /// Rejects an empty token, an invalid base URL, and a request timeout that does not exceed
    /// the poll duration (the local timeout would race the server's).
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if self.api_timeout_secs <= self.poll_timeout_secs {
            anyhow::bail!(
                "API_TIMEOUT_SECS ({}) must be greater than POLL_TIMEOUT_SECS ({})",
                self.api_timeout_secs,
                self.poll_timeout_secs
            );
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            anyhow::bail!("BACKOFF_FACTOR must be a non-negative number");
        }
        Ok(())
    }

    pub fn api_base(&self) -> &str {
        self.telegram_api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
    }

    /// `<base>/bot<token>`, the prefix of every method URL.
    pub fn bot_url(&self) -> String {
        format!("{}/bot{}", self.api_base(), self.bot_token)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Sleep before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as i32;
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(exponent))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
