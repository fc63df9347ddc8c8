//! Console transport for local development
//!
//! Reads lines from stdin as inbound messages and prints replies to stdout,
//! so plugins can be exercised without any chat network.

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::errors::BotError;
use crate::domain::entities::{InboundMessage, OutboundMessage};
use crate::domain::traits::ChatTransport;

/// Channel id attached to every console message.
pub const CONSOLE_CHANNEL: &str = "console";
const CONSOLE_SENDER: &str = "local";

pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn start(
        &self,
        inbound: mpsc::Sender<InboundMessage>,
        cancel: CancellationToken,
    ) -> Result<(), BotError> {
        // Stdin is read on a dedicated thread; it ends with the process.
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                if cancel.is_cancelled() {
                    break;
                }
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                let message = InboundMessage::new(CONSOLE_SENDER, text, CONSOLE_CHANNEL);
                if inbound.blocking_send(message).is_err() {
                    break;
                }
            }
            debug!("console input closed");
        });
        println!("Console mode. Type a message to talk to the bot.");
        Ok(())
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), BotError> {
        let stamp = Local::now().format("%H:%M:%S");
        match (&message.channel, &message.user_email) {
            (Some(channel), _) => println!("[{stamp}] #{channel} <bot> {}", message.text),
            (None, Some(email)) => println!("[{stamp}] @{email} <bot> {}", message.text),
            (None, None) => {}
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
