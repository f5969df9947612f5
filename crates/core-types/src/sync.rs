use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::enums::{SyncMode, SyncStatus};

/// Record of one accountant sync pass (manual or the daily cron job).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncRun {
    pub run_id: Uuid,
    pub mode: SyncMode,
    pub triggered_by: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    pub results_json: Value,
    pub error_json: Option<Value>,
}

impl SyncRun {
    pub fn start(mode: SyncMode, triggered_by: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            triggered_by: triggered_by.into(),
            started_at: Utc::now(),
            completed_at: None,
            status: SyncStatus::Running,
            results_json: Value::Null,
            error_json: None,
        }
    }

    pub fn complete(&mut self, results_json: Value) {
        self.completed_at = Some(Utc::now());
        self.status = SyncStatus::Completed;
        self.results_json = results_json;
    }

    pub fn fail(&mut self, error_json: Value) {
        self.completed_at = Some(Utc::now());
        self.status = SyncStatus::Failed;
        self.error_json = Some(error_json);
    }
}
