//! Inbound message routing
//!
//! The router owns the single inbound message stream. Each message is matched
//! against the commands advertised by the loaded plugins, first match wins,
//! and the parsed command is handed to the owning plugin over its private
//! channel. Every failure path produces exactly one reply to the channel the
//! message came from.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::application::errors::RouteError;
use crate::application::routing::extract::extract_arguments;
use crate::domain::entities::{Command, InboundMessage, OutboundMessage, ParsedCommand};

/// Reply sent when a matched command's arguments cannot be extracted.
const PARSE_FAILURE_REPLY: &str = "Failed to parse the command.";
/// Reply sent when no plugin advertises a matching command.
const NO_COMMAND_REPLY: &str = "I did not understand that command.";

/// One plugin's routing entry: its advertised commands and the send end of
/// its private command channel.
#[derive(Clone)]
pub struct Route {
    pub source: String,
    pub commands: Vec<Command>,
    pub sender: mpsc::Sender<ParsedCommand>,
}

/// Matches inbound messages to plugin commands and dispatches them.
pub struct CommandRouter {
    routes: Vec<Route>,
    outbound: mpsc::Sender<OutboundMessage>,
}

impl CommandRouter {
    pub fn new(routes: Vec<Route>, outbound: mpsc::Sender<OutboundMessage>) -> Self {
        Self { routes, outbound }
    }

    /// Process messages until the inbound stream closes or cancellation is
    /// observed. Messages are handled one at a time; a dispatch that stalls
    /// on a busy plugin stalls all routing behind it.
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundMessage>, cancel: CancellationToken) {
        debug!("command routing loop started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("command routing loop cancelled");
                    break;
                }
                received = inbound.recv() => {
                    let Some(message) = received else {
                        debug!("inbound message stream closed");
                        break;
                    };
                    debug!(channel = %message.channel, sender = %message.sender, "message received");
                    if let Err(err) = self.dispatch(&message).await {
                        self.report_failure(&message, &err).await;
                    }
                }
            }
        }
    }

    /// Find the first matching command across all routes, extract its
    /// arguments, and hand the result to the owning plugin.
    ///
    /// Routes are tried in load order and commands in declaration order; a
    /// command matches when the message text contains its keyword. The first
    /// match is final: an extraction failure fails the whole message with no
    /// fallback to later candidates.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<(), RouteError> {
        for route in &self.routes {
            debug!(plugin = %route.source, "checking plugin for matching commands");
            for command in &route.commands {
                if !message.text.contains(&command.keyword) {
                    continue;
                }

                let arguments = extract_arguments(&message.text, &command.params)?;
                let parsed = ParsedCommand {
                    channel: message.channel.clone(),
                    command: command.keyword.clone(),
                    arguments,
                };
                // Blocking hand-off: suspends until the owning unit receives.
                if route.sender.send(parsed).await.is_err() {
                    error!(
                        plugin = %route.source,
                        command = %command.keyword,
                        "plugin is no longer receiving; command dropped"
                    );
                }
                return Ok(());
            }
        }
        debug!(channel = %message.channel, "no command match found");
        Err(RouteError::NoCommand)
    }

    /// Send the single failure reply owed to the message's channel.
    async fn report_failure(&self, message: &InboundMessage, err: &RouteError) {
        let text = match err {
            RouteError::NoCommand => NO_COMMAND_REPLY,
            RouteError::Extract(extract) => {
                warn!(channel = %message.channel, error = %extract, "failed to parse the command");
                PARSE_FAILURE_REPLY
            }
        };
        let reply = OutboundMessage::to_channel(&message.channel, text);
        if self.outbound.send(reply).await.is_err() {
            error!("outbound sink closed; failure reply dropped");
        }
    }
}
