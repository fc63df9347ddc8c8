//! Platform adapters
//!
//! Each adapter implements [`ChatTransport`] for one chat network. The
//! outbound pump is shared: it drains the outbound sink every plugin and the
//! router write to and hands each reply to the active adapter.

pub mod console;
pub mod telegram;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::domain::entities::OutboundMessage;
use crate::domain::traits::ChatTransport;

/// Drain the shared outbound sink into the transport until cancellation or
/// until every sender is gone.
pub fn spawn_outbound_pump(
    transport: Arc<dyn ChatTransport>,
    mut outbound: mpsc::Receiver<OutboundMessage>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        debug!("outbound pump started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("outbound pump cancelled");
                    break;
                }
                received = outbound.recv() => {
                    let Some(message) = received else {
                        debug!("outbound sink closed");
                        break;
                    };
                    if message.channel.is_none() && message.user_email.is_none() {
                        error!("outbound message has neither channel nor user email; not sent");
                        continue;
                    }
                    if let Err(err) = transport.deliver(&message).await {
                        error!(transport = transport.name(), error = %err, "failed to deliver message");
                    }
                }
            }
        }
    })
}
