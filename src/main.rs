use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use fabric_bot::application::errors::BotError;
use fabric_bot::application::messaging::Dispatcher;
use fabric_bot::application::services::{
    BotService, NotificationRelay, RefreshLoop, SubscriptionTable,
};
use fabric_bot::domain::traits::{Controller, NotificationSource};
use fabric_bot::infrastructure::apic::{ApicClient, ApicWebSocket};
use fabric_bot::infrastructure::config::Config;
use fabric_bot::infrastructure::http::{self, AppState};
use fabric_bot::infrastructure::webex::WebexClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fabric-bot")]
#[command(about = "Webex chatbot for ACI fabric inspection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional YAML config file; environment variables take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `RUST_LOG` directives when set and valid, INFO otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_bot(cli.config),
        Commands::Version => {
            println!("fabric-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig { output } => init_config(output),
    }
}

fn run_bot(config_path: Option<PathBuf>) {
    let config = match Config::resolve(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config)) {
        tracing::error!("fabric-bot stopped: {}", e);
        std::process::exit(1);
    }
}

async fn serve(config: Config) -> Result<(), BotError> {
    tracing::info!("Starting fabric-bot for controller {}", config.apic.url);

    let controller = Arc::new(ApicClient::new(
        &config.apic.url,
        &config.apic.username,
        &config.apic.password,
        config.apic_timeout(),
        config.apic.insecure,
    )?);
    controller.login().await?;

    let transport = Arc::new(ApicWebSocket::new(&config.apic.url, config.apic.insecure)?);
    if let Err(e) = transport.connect(&controller.token()).await {
        tracing::warn!("Websocket unavailable, retrying at next token refresh: {}", e);
    }

    let messenger = Arc::new(
        WebexClient::new(&config.webex.token, config.webex_timeout())?
            .with_base_url(&config.webex.api_url),
    );
    let subscriptions = Arc::new(SubscriptionTable::new());

    let dispatcher = Dispatcher::with_default_commands(controller.clone(), subscriptions.clone());
    let bot = BotService::start(messenger.clone(), dispatcher).await?;
    bot.setup_webhook(&config.bot.url).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
        }
        shutdown.cancel();
    });

    let refresh = RefreshLoop::new(
        controller.clone(),
        transport.clone(),
        subscriptions.clone(),
        config.token_refresh(),
        config.subscription_refresh(),
    );
    let refresh_task = tokio::spawn(refresh.run(cancel.clone()));

    let relay = NotificationRelay::new(transport, messenger, subscriptions);
    let relay_task = tokio::spawn(relay.run(cancel.clone()));

    let state = AppState::new(Arc::new(bot));
    let served = http::serve(&config.bot.listen_addr, state, cancel.clone()).await;
    cancel.cancel();

    let _ = tokio::join!(refresh_task, relay_task);
    served?;
    Ok(())
}

fn init_config(output: Option<PathBuf>) {
    let yaml = match Config::default().to_yaml() {
        Ok(yaml) => yaml,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, yaml) {
                tracing::error!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            println!("Default config written to {}", path.display());
        }
        None => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
    }
}
