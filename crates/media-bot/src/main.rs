//! Media Bot - Main entry point.

use anyhow::Context;
use clap::Parser;
use media_bot::commands::default_groups;
use media_bot::config::Config;
use media_bot::console::run_console;
use media_bot::dispatcher::Dispatcher;
use media_bot::error::AppResult;
use media_bot::registry::CommandRegistry;
use media_bot::transport::ConsoleTransport;
use media_fetch::{DownloaderService, FfmpegTranscoder, Resolver, RetentionSweeper, YtDlp};
use signal_client::{MessageReceiver, SignalClient};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "media-bot", version, about = "Chat bot that fetches audio on command")]
struct Cli {
    /// Read commands from stdin and print replies instead of connecting to Signal
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.test).context("Failed to load configuration")?;

    // Initialize logging
    init_logging(config.bot.log_directive());

    info!("Starting {}...", config.bot.name);

    // Download pipeline
    let ytdlp = Arc::new(YtDlp::new(&config.media.ytdlp_path));
    let transcoder = Arc::new(FfmpegTranscoder::new(&config.media.ffmpeg_path));
    let downloader = Arc::new(
        DownloaderService::new(&config.media.temp_dir, ytdlp.clone(), transcoder)
            .context("Failed to prepare temporary directory")?,
    );
    let resolver = Resolver::new(ytdlp);

    let sweeper = Arc::new(RetentionSweeper::new(
        downloader.temp_dir(),
        config.media.retention,
        config.media.sweep_interval,
    ))
    .start();

    // Commands
    let registry = Arc::new(CommandRegistry::load(default_groups(
        &config, resolver, downloader,
    )));

    let result = if config.bot.test_mode {
        run_test_mode(&config, registry).await
    } else {
        run_signal(&config, registry).await
    };

    info!("Shutting down...");
    sweeper.stop().await;
    result
}

async fn run_test_mode(config: &Config, registry: Arc<CommandRegistry>) -> AppResult<()> {
    info!("Running in test mode, Signal is disabled");

    let console = Arc::new(ConsoleTransport::stdout());
    let dispatcher = Dispatcher::new(&config.bot.prefix, registry, console.clone());
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = run_console(&dispatcher, console, stdin) => result,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}

async fn run_signal(config: &Config, registry: Arc<CommandRegistry>) -> AppResult<()> {
    // Validation guarantees a number outside test mode.
    let phone_number = config
        .signal
        .phone_number
        .clone()
        .context("SIGNAL__PHONE_NUMBER is required")?;

    let signal = SignalClient::new(&config.signal.service_url, phone_number)
        .context("Failed to create Signal client")?;

    if !signal.health_check().await {
        error!("Signal API not reachable at {}", config.signal.service_url);
        return Err(anyhow::anyhow!("Signal API not reachable").into());
    }
    info!("Signal API healthy");

    let dispatcher = Dispatcher::new(
        &config.bot.prefix,
        registry,
        Arc::new(signal.clone()),
    );

    info!(
        "{} commands ready with prefix {:?}",
        dispatcher.registry().len(),
        config.bot.prefix
    );
    info!("Listening for messages...");

    let receiver = MessageReceiver::new(signal, config.signal.poll_interval)
        .with_error_backoff(config.signal.error_backoff);
    let mut stream = Box::pin(receiver.stream());

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                // Slow commands must not hold up the rest of the inbox.
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(&message).await;
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
