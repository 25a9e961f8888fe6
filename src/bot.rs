//! bot.rs — Telegram command surface: a getUpdates long-poll loop handling
//! /start, /check, and the inline "check now" button.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::catalog::denylist::Denylist;
use crate::catalog::types::CatalogProvider;
use crate::checker::{self, CheckStatus};
use crate::ledger::NotificationLedger;
use crate::notify::format;
use crate::notify::telegram::{InlineKeyboard, TelegramClient, Update};

const POLL_SECS: u64 = 30;
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

pub struct BotContext {
    pub client: TelegramClient,
    pub provider: Arc<dyn CatalogProvider>,
    pub ledger: Arc<NotificationLedger>,
    pub denylist: Arc<Denylist>,
    pub status: Arc<CheckStatus>,
}

/// Long-poll loop. Never returns; every per-update or per-poll failure is
/// logged and the loop carries on.
pub async fn run_bot_loop(ctx: BotContext) {
    let mut offset: i64 = 0;
    loop {
        let updates = match ctx.client.get_updates(offset, POLL_SECS).await {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(error = ?e, "getUpdates failed");
                tokio::time::sleep(RETRY_BACKOFF).await;
                continue;
            }
        };

        for upd in updates {
            offset = offset.max(upd.update_id + 1);
            if let Err(e) = handle_update(&ctx, &upd).await {
                tracing::warn!(error = ?e, update_id = upd.update_id, "update handling failed");
            }
        }
    }
}

async fn handle_update(ctx: &BotContext, upd: &Update) -> Result<()> {
    if let Some(msg) = &upd.message {
        let chat_id = msg.chat.id;
        match msg.text.as_deref().map(str::trim) {
            Some(t) if t.starts_with("/start") => {
                let added = ctx.ledger.register_recipient(chat_id);
                let text = if added {
                    format::welcome_text()
                } else {
                    format::welcome_back_text()
                };
                let kb = InlineKeyboard::single("🔍 Check now", format::CHECK_CALLBACK);
                ctx.client.send_message(chat_id, &text, Some(&kb)).await?;
            }
            Some(t) if t.starts_with("/check") => {
                ctx.ledger.register_recipient(chat_id);
                ctx.client
                    .send_message(chat_id, format::checking_text(), None)
                    .await?;
                run_manual_check(ctx).await;
            }
            _ => {}
        }
    }

    if let Some(cb) = &upd.callback_query {
        if cb.data.as_deref() == Some(format::CHECK_CALLBACK) {
            ctx.client.answer_callback_query(&cb.id).await?;
            if let Some(msg) = &cb.message {
                ctx.ledger.register_recipient(msg.chat.id);
            }
            run_manual_check(ctx).await;
        }
    }

    Ok(())
}

async fn run_manual_check(ctx: &BotContext) {
    let outcome = checker::run_check(
        ctx.provider.as_ref(),
        &ctx.ledger,
        &ctx.client,
        &ctx.denylist,
        &ctx.status,
        true,
    )
    .await;
    tracing::info!(
        candidates = outcome.candidates,
        recipients = outcome.notified_recipients,
        "manual check finished"
    );
}
