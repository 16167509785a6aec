pub mod messages;
mod telegram;

use async_trait::async_trait;
use tracing::debug;

pub use telegram::TelegramNotifier;

/// Outbound channel for run summaries.
///
/// Sending is best-effort: implementations log their own failures and never
/// let them abort the run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str);
}

/// Stand-in used when no notification target is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) {
        debug!(%text, "notification target not configured");
    }
}
