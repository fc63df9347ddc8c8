//! Telegram transport
//!
//! Long-polls getUpdates for inbound messages and posts replies with
//! sendMessage. Chat ids double as channel ids; Telegram has no user-by-email
//! lookup, so email-addressed replies are logged and dropped.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::application::errors::BotError;
use crate::domain::entities::{InboundMessage, OutboundMessage};
use crate::domain::traits::ChatTransport;

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";
/// Long-poll timeout passed to getUpdates
const POLL_TIMEOUT_SECONDS: u64 = 30;
/// Back-off after a failed poll before trying again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    from: Option<User>,
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Telegram bot transport
#[derive(Clone)]
pub struct TelegramTransport {
    token: String,
    client: Client,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.token)
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, BotError> {
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECONDS.to_string()),
            ])
            .send()
            .await
            .map_err(|err| BotError::Network(err.to_string()))?;
        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|err| BotError::Network(err.to_string()))?;
        if !body.ok {
            return Err(BotError::Network(
                body.description
                    .unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }
        Ok(body.result.unwrap_or_default())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|err| BotError::Network(err.to_string()))?;
        let body: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|err| BotError::Network(err.to_string()))?;
        if !body.ok {
            return Err(BotError::Network(
                body.description
                    .unwrap_or_else(|| "sendMessage failed".to_string()),
            ));
        }
        Ok(())
    }

    async fn poll_loop(self, inbound: mpsc::Sender<InboundMessage>, cancel: CancellationToken) {
        let mut offset = 0i64;
        loop {
            let updates = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("telegram poll loop cancelled");
                    return;
                }
                fetched = self.get_updates(offset) => match fetched {
                    Ok(updates) => updates,
                    Err(err) => {
                        warn!(error = %err, "getUpdates failed; backing off");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                },
            };
            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text else {
                    continue;
                };
                let sender = message
                    .from
                    .map(|user| user.id.to_string())
                    .unwrap_or_default();
                let channel = message.chat.id.to_string();
                debug!(channel = %channel, sender = %sender, "update received");
                if inbound
                    .send(InboundMessage::new(sender, text, channel))
                    .await
                    .is_err()
                {
                    debug!("inbound stream closed; telegram poll loop exiting");
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn start(
        &self,
        inbound: mpsc::Sender<InboundMessage>,
        cancel: CancellationToken,
    ) -> Result<(), BotError> {
        let transport = self.clone();
        tokio::spawn(transport.poll_loop(inbound, cancel));
        Ok(())
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), BotError> {
        match (&message.channel, &message.user_email) {
            (Some(channel), _) => self.send_message(channel, &message.text).await,
            (None, Some(email)) => {
                error!(email = %email, "cannot address a user by email on telegram; message dropped");
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
