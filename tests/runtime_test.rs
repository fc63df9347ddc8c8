//! End-to-end runtime tests: in-process plugin units driven through the
//! manager and router exactly as dynamically loaded ones would be.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use plugbot::application::routing::CommandRouter;
use plugbot::domain::entities::{
    ArgValue, Command, InboundMessage, OutboundMessage, Parameter, ParameterKind, ParsedCommand,
};
use plugbot::plugins::{PluginLogger, PluginManager, PluginUnit};

/// Plugin unit with a real receive loop; records everything it is handed.
struct RecordingPlugin {
    commands: Vec<Command>,
    received: Arc<Mutex<Vec<ParsedCommand>>>,
    cancel: CancellationToken,
    stopped: Arc<AtomicBool>,
}

impl RecordingPlugin {
    fn new(commands: Vec<Command>) -> Self {
        Self {
            commands,
            received: Arc::new(Mutex::new(Vec::new())),
            cancel: CancellationToken::new(),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    fn received(&self) -> Arc<Mutex<Vec<ParsedCommand>>> {
        self.received.clone()
    }

    fn stopped(&self) -> Arc<AtomicBool> {
        self.stopped.clone()
    }
}

impl PluginUnit for RecordingPlugin {
    fn commands(&self) -> Vec<Command> {
        self.commands.clone()
    }

    fn start(
        &self,
        mut inbound: mpsc::Receiver<ParsedCommand>,
        _outbound: mpsc::Sender<OutboundMessage>,
        _logger: PluginLogger,
    ) {
        let received = self.received.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    command = inbound.recv() => match command {
                        Some(command) => received.lock().unwrap().push(command),
                        None => break,
                    },
                }
            }
        });
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }
}

fn deploy_command() -> Command {
    Command::new("deploy")
        .with_description("Deploy a build")
        .with_param(Parameter::new("to", ParameterKind::After))
}

async fn recv_reply(outbound: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    tokio::time::timeout(Duration::from_secs(1), outbound.recv())
        .await
        .expect("timed out waiting for a reply")
        .expect("outbound sink closed")
}

#[tokio::test]
async fn matched_message_reaches_the_owning_plugin() {
    let (outbound_tx, _outbound_rx) = mpsc::channel(4);
    let mut manager = PluginManager::new(outbound_tx.clone(), Duration::from_secs(1));

    let deployer = Arc::new(RecordingPlugin::new(vec![deploy_command()]));
    let reporter = Arc::new(RecordingPlugin::new(vec![Command::new("status")]));
    let deployed = deployer.received();
    let reported = reporter.received();
    manager.install("deployer.so", deployer);
    manager.install("reporter.so", reporter);

    let router = CommandRouter::new(manager.routes(), outbound_tx);
    router
        .dispatch(&InboundMessage::new(
            "alice",
            "please deploy to production",
            "ops",
        ))
        .await
        .unwrap();
    router
        .dispatch(&InboundMessage::new("bob", "status please", "general"))
        .await
        .unwrap();

    // Let the plugin receive loops drain their channels.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let deployed = deployed.lock().unwrap();
    assert_eq!(deployed.len(), 1);
    assert_eq!(deployed[0].command, "deploy");
    assert_eq!(deployed[0].channel, "ops");
    assert_eq!(
        deployed[0].arguments["to"].as_text(),
        Some("production")
    );

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].command, "status");
}

#[tokio::test]
async fn first_loaded_plugin_wins_keyword_collisions() {
    let (outbound_tx, _outbound_rx) = mpsc::channel(4);
    let mut manager = PluginManager::new(outbound_tx.clone(), Duration::from_secs(1));

    let first = Arc::new(RecordingPlugin::new(vec![Command::new("ping")]));
    let second = Arc::new(RecordingPlugin::new(vec![Command::new("ping")]));
    let first_received = first.received();
    let second_received = second.received();
    manager.install("first.so", first);
    manager.install("second.so", second);

    let router = CommandRouter::new(manager.routes(), outbound_tx);
    router
        .dispatch(&InboundMessage::new("alice", "ping", "general"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(first_received.lock().unwrap().len(), 1);
    assert!(second_received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_messages_yield_exactly_one_reply_and_no_dispatch() {
    let (outbound_tx, mut outbound_rx) = mpsc::channel(4);
    let mut manager = PluginManager::new(outbound_tx.clone(), Duration::from_secs(1));

    let deployer = Arc::new(RecordingPlugin::new(vec![deploy_command()]));
    let deployed = deployer.received();
    manager.install("deployer.so", deployer);

    let router = CommandRouter::new(manager.routes(), outbound_tx);
    let (inbound_tx, inbound_rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let routing = tokio::spawn(router.run(inbound_rx, cancel.clone()));

    // No registered keyword at all.
    inbound_tx
        .send(InboundMessage::new("alice", "good morning", "general"))
        .await
        .unwrap();
    let reply = recv_reply(&mut outbound_rx).await;
    assert_eq!(reply.channel.as_deref(), Some("general"));
    assert!(reply.user_email.is_none());

    // Keyword present but the required parameter is missing.
    inbound_tx
        .send(InboundMessage::new("alice", "please deploy now", "ops"))
        .await
        .unwrap();
    let reply = recv_reply(&mut outbound_rx).await;
    assert_eq!(reply.channel.as_deref(), Some("ops"));

    // One reply per failed message, nothing more.
    assert!(outbound_rx.try_recv().is_err());
    assert!(deployed.lock().unwrap().is_empty());

    cancel.cancel();
    routing.await.unwrap();
}

#[tokio::test]
async fn parsed_commands_carry_flag_parameters_even_when_absent() {
    let (outbound_tx, _outbound_rx) = mpsc::channel(4);
    let mut manager = PluginManager::new(outbound_tx.clone(), Duration::from_secs(1));

    let command = Command::new("restart")
        .with_param(Parameter::new("service", ParameterKind::Before))
        .with_param(Parameter::new("--force", ParameterKind::Flag));
    let plugin = Arc::new(RecordingPlugin::new(vec![command]));
    let received = plugin.received();
    manager.install("restarter.so", plugin);

    let router = CommandRouter::new(manager.routes(), outbound_tx);
    router
        .dispatch(&InboundMessage::new(
            "alice",
            "please restart the api service",
            "ops",
        ))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].arguments.len(), 2);
    assert_eq!(received[0].arguments["service"].as_text(), Some("api"));
    assert_eq!(received[0].arguments["--force"].as_flag(), Some(false));
}

#[tokio::test(start_paused = true)]
async fn shutdown_signals_every_plugin_and_respects_the_grace_period() {
    let (outbound_tx, _outbound_rx) = mpsc::channel(4);
    let grace = Duration::from_secs(3);
    let mut manager = PluginManager::new(outbound_tx, grace);

    let first = Arc::new(RecordingPlugin::new(vec![Command::new("one")]));
    let second = Arc::new(RecordingPlugin::new(vec![Command::new("two")]));
    let first_stopped = first.stopped();
    let second_stopped = second.stopped();
    manager.install("one.so", first);
    manager.install("two.so", second);

    let before = tokio::time::Instant::now();
    manager.shutdown().await;
    let waited = tokio::time::Instant::now() - before;

    assert!(first_stopped.load(Ordering::SeqCst));
    assert!(second_stopped.load(Ordering::SeqCst));
    assert_eq!(waited, grace);
}
