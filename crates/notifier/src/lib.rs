//! Assembles typed message contexts, validates them, gates them through
//! dedupe/throttle, and delivers them to every registered Telegram chat.
//! Also runs the singleton inbound command poller.
//!
//! ## Architectural Principles
//!
//! - **Single writer for dedupe state:** `DedupeState` is owned exclusively
//!   by `run_notifier_worker`; nothing else evaluates or mutates it, per the
//!   concurrency model's "notifier worker" role.
//! - **Outbound needs no lock, inbound does:** every replica may call
//!   `TelegramClient::send_message`; only the `PollerLock` holder calls
//!   `get_updates`.
//!
//! ## Public API
//!
//! - `MessageContext` / `NotificationType`: typed, validated message kinds.
//! - `DedupeState`: the dedupe/throttle engine.
//! - `TelegramClient`: the Bot API wrapper.
//! - `PollerLock`: the distributed single-poller lock.
//! - `Command`: the inbound command grammar.
//! - `run_notifier_worker`: the long-lived outbound worker.

pub mod client;
pub mod commands;
pub mod contexts;
pub mod dedupe;
pub mod error;
pub mod lock;

pub use client::{Chat, InboundMessage, TelegramClient, Update};
pub use commands::{parse as parse_command, Command};
pub use contexts::{MessageContext, NotificationType};
pub use dedupe::{rule_for, Decision, DedupeState, ThrottleRule};
pub use error::NotifierError;
pub use lock::PollerLock;

use chrono::Utc;
use database::DbRepository;
use tokio::sync::mpsc;

/// Drains `inbox` and delivers each validated context to every registered
/// chat, subject to `DedupeState`. Runs until the channel closes. This is
/// the crate's only writer of dedupe/throttle state, per the concurrency
/// model's single-notifier-worker rule.
pub async fn run_notifier_worker(
    mut inbox: mpsc::Receiver<MessageContext>,
    telegram: TelegramClient,
    repository: DbRepository,
) {
    let mut dedupe = DedupeState::new();

    while let Some(context) = inbox.recv().await {
        if let Err(err) = context.validate() {
            tracing::warn!(error = ?err, "dropping invalid message context");
            continue;
        }

        let body = context.render();
        let now = Utc::now();
        match dedupe.evaluate(&context, &body, now) {
            Decision::Send => {}
            decision => {
                tracing::debug!(?decision, notification_type = ?context.notification_type(), "suppressed");
                continue;
            }
        }

        let chats = match repository.list_telegram_chats().await {
            Ok(chats) => chats,
            Err(err) => {
                tracing::error!(error = ?err, "failed to list telegram chats");
                continue;
            }
        };

        for chat in chats {
            let chat_id: i64 = match chat.chat_id.parse() {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(chat_id = %chat.chat_id, "skipping chat with non-numeric id");
                    continue;
                }
            };
            if let Err(err) = telegram.send_message(chat_id, &body).await {
                tracing::error!(error = ?err, chat_id, "failed to deliver telegram message");
            }
        }
    }

    tracing::info!("notifier worker shutting down: inbox closed");
}
