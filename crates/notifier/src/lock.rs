use std::hash::{Hash, Hasher};
use std::time::Duration;

use sqlx::PgPool;
use std::collections::hash_map::DefaultHasher;

/// A singleton-across-replicas lock for the Telegram inbound poller, backed
/// by a Postgres session-level advisory lock keyed on `(envTag, tokenHash)`.
/// Only the holder polls; everyone else stays in send-only mode.
pub struct PollerLock {
    pool: PgPool,
    key: i64,
    held: bool,
    backoff: Duration,
}

const MIN_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

fn lock_key(env_tag: &str, bot_token: &str) -> i64 {
    let mut hasher = DefaultHasher::new();
    env_tag.hash(&mut hasher);
    bot_token.hash(&mut hasher);
    hasher.finish() as i64
}

impl PollerLock {
    pub fn new(pool: PgPool, env_tag: &str, bot_token: &str) -> Self {
        Self { pool, key: lock_key(env_tag, bot_token), held: false, backoff: MIN_BACKOFF }
    }

    /// Attempts to acquire the lock without blocking. Returns `true` if this
    /// process now holds it (or already did).
    pub async fn try_acquire(&mut self) -> Result<bool, sqlx::Error> {
        if self.held {
            return Ok(true);
        }
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(self.key)
            .fetch_one(&self.pool)
            .await?;
        self.held = acquired;
        if acquired {
            self.backoff = MIN_BACKOFF;
        }
        Ok(acquired)
    }

    /// Releases the lock after a 409 conflict from the Telegram API,
    /// entering exponential backoff before the next `try_acquire`.
    pub async fn release_and_backoff(&mut self) -> Result<Duration, sqlx::Error> {
        if self.held {
            sqlx::query("SELECT pg_advisory_unlock($1)").bind(self.key).execute(&self.pool).await?;
            self.held = false;
        }
        let wait = self.backoff;
        self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
        Ok(wait)
    }

    pub fn is_holder(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_stable_for_the_same_inputs() {
        assert_eq!(lock_key("prod", "token-a"), lock_key("prod", "token-a"));
    }

    #[test]
    fn lock_key_differs_across_environments() {
        assert_ne!(lock_key("prod", "token-a"), lock_key("staging", "token-a"));
    }

    #[test]
    fn backoff_schedule_caps_at_sixty_seconds() {
        let mut backoff = MIN_BACKOFF;
        for _ in 0..10 {
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
        assert_eq!(backoff, MAX_BACKOFF);
    }
}
