use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use plugbot::application::errors::BotError;
use plugbot::application::routing::CommandRouter;
use plugbot::domain::traits::ChatTransport;
use plugbot::infrastructure::adapters::console::ConsoleTransport;
use plugbot::infrastructure::adapters::telegram::TelegramTransport;
use plugbot::infrastructure::adapters::spawn_outbound_pump;
use plugbot::infrastructure::config::Config;
use plugbot::plugins::PluginManager;

#[derive(Parser)]
#[command(name = "plugbot")]
#[command(about = "A plugin-driven chat bot runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "plugbot.yaml")]
    config: String,

    /// Telegram bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_bot(cli.config, cli.token),
        Commands::Version => println!("plugbot v{}", env!("CARGO_PKG_VERSION")),
        Commands::InitConfig => init_config(&cli.config),
    }
}

fn run_bot(config_path: String, token_override: Option<String>) {
    let config = if Path::new(&config_path).exists() {
        match Config::load(&config_path) {
            Ok(config) => config.load_env(),
            Err(err) => {
                eprintln!("failed to load {config_path}: {err}");
                std::process::exit(1);
            }
        }
    } else {
        Config::default().load_env()
    };

    init_logging(&config);
    tracing::info!("starting {}", config.bot.name);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async move {
        if let Err(err) = run(config, token_override).await {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    });
}

async fn run(config: Config, token_override: Option<String>) -> Result<(), BotError> {
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, shutting down");
                cancel.cancel();
            }
        });
    }

    // Rendezvous-style channels: senders suspend until the consumer side is
    // ready, which is the backpressure model throughout.
    let (inbound_tx, inbound_rx) = mpsc::channel(1);
    let (outbound_tx, outbound_rx) = mpsc::channel(1);

    let transport: Arc<dyn ChatTransport> = match telegram_token(&config, token_override) {
        Some(token) => Arc::new(TelegramTransport::new(token)),
        None => Arc::new(ConsoleTransport::new()),
    };
    tracing::info!(transport = transport.name(), "transport selected");
    transport.start(inbound_tx, cancel.clone()).await?;
    let pump = spawn_outbound_pump(Arc::clone(&transport), outbound_rx, cancel.clone());

    // Plugins must be live before routing starts; the router needs their
    // command tables.
    let mut manager = PluginManager::new(outbound_tx.clone(), config.grace_period());
    let loaded = manager.load_directory(&config.plugins.directory, &config.plugins.extension)?;
    tracing::info!(loaded, "plugins loaded");

    let router = CommandRouter::new(manager.routes(), outbound_tx.clone());
    let routing = tokio::spawn(router.run(inbound_rx, cancel.clone()));

    cancel.cancelled().await;
    manager.shutdown().await;
    let _ = routing.await;
    let _ = pump.await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn telegram_token(config: &Config, token_override: Option<String>) -> Option<String> {
    token_override.or_else(|| {
        config
            .adapters
            .telegram
            .as_ref()
            .filter(|telegram| telegram.enabled)
            .and_then(|telegram| telegram.token.clone())
    })
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_config(path: &str) {
    if Path::new(path).exists() {
        eprintln!("{path} already exists");
        std::process::exit(1);
    }
    let yaml = match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => yaml,
        Err(err) => {
            eprintln!("failed to render default config: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = std::fs::write(path, yaml) {
        eprintln!("failed to write {path}: {err}");
        std::process::exit(1);
    }
    println!("wrote {path}");
}
