//! [`dbot_core::Transport`] over the Telegram Bot API (reqwest).
//!
//! `getUpdates` is a GET long-poll; `sendMessage` a JSON POST. Transient failures are retried with
//! exponential backoff: connect errors for every method, and 500/502/504 or read timeouts only for
//! the idempotent poll. A message is never re-posted once the server may have accepted it.
//! Entries of a `getUpdates` batch that do not parse are passed on as bare updates.

use async_trait::async_trait;
use dbot_core::{DbotError, OutboundMessage, Result, Transport, Update};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::TelegramConfig;

/// Statuses treated as transient for idempotent requests.
pub const RETRY_STATUSES: [u16; 3] = [500, 502, 504];

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// HTTP transport to the Telegram Bot API.
pub struct TelegramTransport {
    client: reqwest::Client,
    config: TelegramConfig,
    bot_url: String,
    closed: AtomicBool,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DbotError::Transport(format!("failed to build HTTP client: {}", e)))?;
        let bot_url = config.bot_url();
        Ok(Self {
            client,
            config,
            bot_url,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.bot_url, method)
    }

    fn ensure_open(&self, method: &str) -> Result<()> {
        if self.is_closed() {
            return Err(DbotError::Transport(format!(
                "{}: transport is closed",
                method
            )));
        }
        Ok(())
    }

    /// Sends the request built by `build`, retrying transient failures up to `max_retries` times.
    /// Returns the last response even when its status is a retryable error.
    async fn send_with_retry<F>(
        &self,
        method: &'static str,
        idempotent: bool,
        build: F,
    ) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut retry = 0u32;
        loop {
            self.ensure_open(method)?;
            let outcome = build().send().await;
            let transient = match &outcome {
                Ok(resp) => idempotent && RETRY_STATUSES.contains(&resp.status().as_u16()),
                Err(e) => e.is_connect() || (idempotent && e.is_timeout()),
            };
            if !transient || retry >= self.config.max_retries {
                return outcome
                    .map_err(|e| DbotError::Transport(format!("{} request failed: {}", method, e)));
            }
            retry += 1;
            let delay = self.config.backoff(retry);
            match &outcome {
                Ok(resp) => warn!(
                    method,
                    retry,
                    status = resp.status().as_u16(),
                    delay_ms = delay.as_millis() as u64,
                    "Telegram request failed, retrying"
                ),
                Err(e) => warn!(
                    method,
                    retry,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Telegram request failed, retrying"
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn read_body<T: for<'de> Deserialize<'de>>(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<T> {
        let status = resp.status();
        let body: ApiResponse<T> = resp.json().await.map_err(|e| {
            DbotError::Transport(format!("{}: unreadable response ({}): {}", method, status, e))
        })?;
        if !status.is_success() || !body.ok {
            return Err(DbotError::Transport(format!(
                "{} failed ({}): {}",
                method,
                status,
                body.description.as_deref().unwrap_or("no description")
            )));
        }
        body.result
            .ok_or_else(|| DbotError::Transport(format!("{}: response has no result", method)))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    #[instrument(skip(self))]
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let mut query = vec![("timeout", self.config.poll_timeout_secs.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let url = self.method_url("getUpdates");
        let timeout = self.config.api_timeout();
        let resp = self
            .send_with_retry("getUpdates", true, || {
                self.client.get(&url).query(&query).timeout(timeout)
            })
            .await?;
        let raw: Vec<serde_json::Value> = Self::read_body("getUpdates", resp).await?;

        // An entry whose body does not parse still advances the offset: it is kept as a bare,
        // unsupported update. Only entries without a usable id are dropped.
        let mut updates = Vec::with_capacity(raw.len());
        for value in raw {
            match Update::deserialize(&value) {
                Ok(update) => updates.push(update),
                Err(e) => match value.get("update_id").and_then(serde_json::Value::as_i64) {
                    Some(update_id) => {
                        warn!(update_id, error = %e, "Malformed update, passing it on as unsupported");
                        updates.push(Update::bare(update_id));
                    }
                    None => warn!(error = %e, "Skipping update without an id"),
                },
            }
        }
        debug!(count = updates.len(), "getUpdates returned");
        Ok(updates)
    }

    #[instrument(skip(self, message), fields(chat_id = ?message.chat_id))]
    async fn deliver(&self, message: &OutboundMessage) -> Result<serde_json::Value> {
        let url = self.method_url("sendMessage");
        let timeout: Duration = self.config.send_timeout();
        let resp = self
            .send_with_retry("sendMessage", false, || {
                self.client.post(&url).json(message).timeout(timeout)
            })
            .await?;
        let result: serde_json::Value = Self::read_body("sendMessage", resp).await?;
        debug!("sendMessage acknowledged");
        Ok(result)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Telegram transport closed");
        }
    }
}
