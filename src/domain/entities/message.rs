/// Normalized inbound chat message.
///
/// Produced by a transport adapter, consumed by the router; exists only for
/// the duration of one routing attempt.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
    pub channel: String,
}

impl InboundMessage {
    pub fn new(
        sender: impl Into<String>,
        text: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            channel: channel.into(),
        }
    }
}

/// A reply directed at a channel or at a user by email address.
///
/// Exactly one addressing field is set. The type does not enforce this; the
/// outbound pump rejects messages with neither field, and each adapter
/// decides what to do with addressing it cannot serve.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: Option<String>,
    pub user_email: Option<String>,
    pub text: String,
}

impl OutboundMessage {
    pub fn to_channel(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            user_email: None,
            text: text.into(),
        }
    }

    pub fn to_user(email: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: None,
            user_email: Some(email.into()),
            text: text.into(),
        }
    }
}
