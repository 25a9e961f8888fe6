pub mod format;
pub mod telegram;

use anyhow::Result;

/// The one capability the check pipeline needs from a transport: deliver a
/// text payload to a recipient. Per-recipient failures are the caller's
/// problem (log and continue), not the transport's.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
}
