//! Dynamic plugin loading
//!
//! Turns a shared-object path into a live [`PluginUnit`]. The loader is the
//! only place that knows about `libloading`; the manager and router work
//! against the trait and never see the loading mechanism.

use std::path::Path;
use std::sync::Arc;

use libloading::{Library, Symbol};
use tokio::sync::mpsc;

use crate::application::errors::PluginError;
use crate::domain::entities::{Command, OutboundMessage, ParsedCommand};
use crate::plugins::unit::{
    AbiVersionFn, PluginEntryFn, PluginLogger, PluginUnit, ABI_SYMBOL, ABI_VERSION, ENTRY_SYMBOL,
};

/// A dynamically loaded unit together with the library it came from.
///
/// The library must stay mapped for as long as the unit (or any thread it
/// spawned) can run; keeping it inside the unit ties the two lifetimes
/// together.
struct DynamicPlugin {
    inner: Box<dyn PluginUnit>,
    _library: Library,
}

impl PluginUnit for DynamicPlugin {
    fn commands(&self) -> Vec<Command> {
        self.inner.commands()
    }

    fn start(
        &self,
        inbound: mpsc::Receiver<ParsedCommand>,
        outbound: mpsc::Sender<OutboundMessage>,
        logger: PluginLogger,
    ) {
        self.inner.start(inbound, outbound, logger);
    }

    fn stop(&self) {
        self.inner.stop();
    }
}

/// Load a single plugin artifact.
///
/// A [`PluginError::Load`] means the artifact could not be opened at all and
/// the candidate should be skipped. A [`PluginError::Contract`] means a
/// loadable artifact does not satisfy the plugin contract - missing exports,
/// an ABI mismatch, or a null unit - and aborts the whole load phase.
pub fn load(path: &Path) -> Result<Arc<dyn PluginUnit>, PluginError> {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let library = unsafe { Library::new(path) }.map_err(|err| PluginError::Load {
        file: file.clone(),
        reason: err.to_string(),
    })?;

    let version = {
        let abi: Symbol<AbiVersionFn> =
            unsafe { library.get(ABI_SYMBOL) }.map_err(|err| PluginError::Contract {
                file: file.clone(),
                reason: format!("missing plugbot_abi_version export: {err}"),
            })?;
        abi()
    };
    if version != ABI_VERSION {
        return Err(PluginError::Contract {
            file,
            reason: format!("plugin ABI version {version} does not match host version {ABI_VERSION}"),
        });
    }

    let raw = {
        let entry: Symbol<PluginEntryFn> =
            unsafe { library.get(ENTRY_SYMBOL) }.map_err(|err| PluginError::Contract {
                file: file.clone(),
                reason: format!("missing plugbot_plugin export: {err}"),
            })?;
        entry()
    };
    if raw.is_null() {
        return Err(PluginError::Contract {
            file,
            reason: "plugin entry returned null".to_string(),
        });
    }
    let inner = unsafe { Box::from_raw(raw) };

    Ok(Arc::new(DynamicPlugin {
        inner,
        _library: library,
    }))
}
