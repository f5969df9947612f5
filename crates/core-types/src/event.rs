use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::enums::BotEventLevel;

/// An append-only diagnostic event. Retention is bounded at the persistence
/// layer (ring-like: oldest rows are pruned past a configured cap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BotEvent {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub level: BotEventLevel,
    #[sqlx(rename = "event_type")]
    pub event_type: String,
    pub message: String,
    pub meta: Value,
}

impl BotEvent {
    pub fn new(level: BotEventLevel, event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ts: Utc::now(),
            level,
            event_type: event_type.into(),
            message: message.into(),
            meta: Value::Null,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }
}
