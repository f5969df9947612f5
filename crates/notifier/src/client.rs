use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::NotifierError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// A thin wrapper over the Telegram Bot API's `sendMessage` and
/// `getUpdates` endpoints. Holds no dedupe/throttle state of its own — that
/// lives in `DedupeState`, owned by the notifier worker.
pub struct TelegramClient {
    http: reqwest::Client,
    bot_token: String,
    last_update_id: i64,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Result<Self, NotifierError> {
        if bot_token.trim().is_empty() {
            return Err(NotifierError::NotConfigured);
        }
        Ok(Self { http: reqwest::Client::new(), bot_token, last_update_id: 0 })
    }

    fn url(&self, method: &str) -> String {
        format!("{TELEGRAM_API_BASE}/bot{}/{method}", self.bot_token)
    }

    /// Sends `body` to `chat_id`. Outbound sends require no lock, per §4.10 —
    /// every replica may send, only inbound polling is singleton.
    pub async fn send_message(&self, chat_id: i64, body: &str) -> Result<(), NotifierError> {
        let mut payload = HashMap::new();
        payload.insert("chat_id", chat_id.to_string());
        payload.insert("text", body.to_string());

        let response = self.http.post(self.url("sendMessage")).json(&payload).send().await?;
        let status = response.status();
        let parsed: TelegramResponse<serde_json::Value> = response.json().await?;

        if status == reqwest::StatusCode::CONFLICT {
            return Err(NotifierError::Api("409 conflict".to_string()));
        }
        if !parsed.ok {
            return Err(NotifierError::Api(parsed.description.unwrap_or_else(|| "unknown error".to_string())));
        }
        Ok(())
    }

    /// Long-polls `getUpdates`, advancing the internal offset. Returns a
    /// 409 as `NotifierError::Api` so the caller's `PollerLock` can back off.
    pub async fn get_updates(&mut self, timeout_sec: u64) -> Result<Vec<Update>, NotifierError> {
        let response = self
            .http
            .get(self.url("getUpdates"))
            .query(&[("offset", (self.last_update_id + 1).to_string()), ("timeout", timeout_sec.to_string())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(NotifierError::Api("409 conflict".to_string()));
        }

        let parsed: TelegramResponse<Vec<Update>> = response.json().await?;
        if !parsed.ok {
            return Err(NotifierError::Api(parsed.description.unwrap_or_else(|| "unknown error".to_string())));
        }

        let updates = parsed.result.unwrap_or_default();
        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }
}

/// Bookkeeping the notifier worker needs for `/uptime` and heartbeat context.
pub struct ProcessStartedAt(pub DateTime<Utc>);
