use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::errors::BotError;
use crate::domain::entities::{InboundMessage, OutboundMessage};

/// Chat-network boundary.
///
/// An adapter produces normalized inbound messages onto the given sender and
/// delivers outbound replies to the network. The runtime does not care which
/// network sits behind it.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Begin producing inbound messages. Must spawn the adapter's own
    /// receive machinery and return promptly.
    async fn start(
        &self,
        inbound: mpsc::Sender<InboundMessage>,
        cancel: CancellationToken,
    ) -> Result<(), BotError>;

    /// Post a single reply to the network.
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), BotError>;

    /// Short adapter identifier for logs.
    fn name(&self) -> &str;
}
