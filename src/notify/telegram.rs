use super::Notifier;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

const API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram Bot API `sendMessage` sender.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Result<Self> {
        Self::with_api_base(API_BASE, token, chat_id)
    }

    /// Points the sender at another Bot API host, e.g. a local relay.
    pub fn with_api_base(api_base: &str, token: &str, chat_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Builds a sender only when both the token and the chat id are present.
    pub fn from_parts(token: Option<&str>, chat_id: Option<&str>) -> Result<Option<Self>> {
        match (token, chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                Self::new(token, chat_id).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };

        // The endpoint embeds the bot token; only log the status and reqwest's error kind.
        match self.client.post(self.endpoint()).form(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("notification sent");
            }
            Ok(response) => {
                warn!(status = %response.status(), "notification rejected");
            }
            Err(e) => {
                warn!(error = %e.without_url(), "notification failed");
            }
        }
    }
}
