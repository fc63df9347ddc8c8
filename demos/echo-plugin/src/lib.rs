//! Demo plugin: repeats a word back on request.
//!
//! Build with `cargo build --release` in this directory and drop the
//! resulting `libecho_plugin.so` into the bot's plugin directory.
//!
//! Advertises one command:
//!
//! ```text
//! echo say <word> [loudly]
//! ```

use std::thread;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use plugbot::domain::entities::{
    ArgValue, Command, OutboundMessage, Parameter, ParameterKind, ParsedCommand,
};
use plugbot::plugins::{PluginLogger, PluginUnit, ABI_VERSION};

struct EchoPlugin {
    cancel: CancellationToken,
}

impl EchoPlugin {
    fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }
}

impl PluginUnit for EchoPlugin {
    fn commands(&self) -> Vec<Command> {
        vec![Command::new("echo")
            .with_description("Repeat a word back")
            .with_param(
                Parameter::new("say", ParameterKind::After).with_description("The word to repeat"),
            )
            .with_param(
                Parameter::new("loudly", ParameterKind::Flag).with_description("Shout the reply"),
            )]
    }

    fn start(
        &self,
        mut inbound: mpsc::Receiver<ParsedCommand>,
        outbound: mpsc::Sender<OutboundMessage>,
        logger: PluginLogger,
    ) {
        let cancel = self.cancel.clone();
        // The receive loop runs on its own thread with its own runtime; the
        // host only hands over the channel ends.
        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    logger.error(&format!("failed to build plugin runtime: {err}"));
                    return;
                }
            };
            runtime.block_on(async move {
                logger.info("echo plugin running");
                loop {
                    let command = tokio::select! {
                        _ = cancel.cancelled() => break,
                        received = inbound.recv() => match received {
                            Some(command) => command,
                            None => break,
                        },
                    };
                    let word = match command.arguments.get("say") {
                        Some(ArgValue::Text(word)) => word.clone(),
                        _ => {
                            logger.warn("echo command arrived without a word to say");
                            continue;
                        }
                    };
                    let loudly =
                        matches!(command.arguments.get("loudly"), Some(ArgValue::Flag(true)));
                    let text = if loudly {
                        format!("{}!!!", word.to_uppercase())
                    } else {
                        word
                    };
                    if outbound
                        .send(OutboundMessage::to_channel(&command.channel, text))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                logger.info("echo plugin stopped");
            });
        });
    }

    fn stop(&self) {
        self.cancel.cancel();
    }
}

/// ABI revision this artifact was built against.
#[no_mangle]
pub extern "C" fn plugbot_abi_version() -> u32 {
    ABI_VERSION
}

/// Constructs the plugin unit. The host takes ownership of the returned box.
#[no_mangle]
#[allow(improper_ctypes_definitions)]
pub extern "C" fn plugbot_plugin() -> *mut dyn PluginUnit {
    Box::into_raw(Box::new(EchoPlugin::new()))
}
