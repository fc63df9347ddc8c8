//! Plugin capability surface and the dynamic-loading ABI

use tokio::sync::mpsc;

use crate::domain::entities::{Command, OutboundMessage, ParsedCommand};

/// ABI revision expected of plugin artifacts. Bumped on any change to the
/// types crossing the plugin boundary.
pub const ABI_VERSION: u32 = 1;

/// Exported symbol returning the artifact's ABI revision.
pub const ABI_SYMBOL: &[u8] = b"plugbot_abi_version";

/// Exported symbol constructing the plugin unit object.
pub const ENTRY_SYMBOL: &[u8] = b"plugbot_plugin";

/// Signature of the [`ABI_SYMBOL`] export.
pub type AbiVersionFn = extern "C" fn() -> u32;

/// Signature of the [`ENTRY_SYMBOL`] export. The host takes ownership of the
/// returned unit.
pub type PluginEntryFn = extern "C" fn() -> *mut dyn PluginUnit;

/// Capability surface every plugin unit provides.
///
/// A unit owns its own state, channel ends, and cancellation; nothing lives
/// in process-wide globals. Units arrive either through the dynamic loader
/// or constructed in-process and handed straight to the manager.
pub trait PluginUnit: Send + Sync {
    /// Advertise the commands this unit handles.
    ///
    /// Side-effect-free; called once, synchronously, during the load phase,
    /// so it must return promptly.
    fn commands(&self) -> Vec<Command>;

    /// Begin processing. Spawns the unit's own receive loop over `inbound`
    /// and returns promptly; replies go to `outbound`.
    fn start(
        &self,
        inbound: mpsc::Receiver<ParsedCommand>,
        outbound: mpsc::Sender<OutboundMessage>,
        logger: PluginLogger,
    );

    /// Signal the receive loop to terminate. Must not block indefinitely;
    /// actual exit is only given the shutdown grace period, never awaited.
    fn stop(&self);
}

/// Logging handle passed to plugin units at start.
///
/// Events are tagged with the plugin source name so plugin output is
/// attributable in the host's log stream.
#[derive(Debug, Clone)]
pub struct PluginLogger {
    source: String,
}

impl PluginLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(plugin = %self.source, "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(plugin = %self.source, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(plugin = %self.source, "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(plugin = %self.source, "{}", message);
    }
}
