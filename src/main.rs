use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use services::{
    create_emitter, create_layout_registry, create_trigger_listener, ClipboardCommand, FixedText,
    InputSourceGuard, TextSource, TypingService,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "clip-typer")]
#[command(about = "Types text as synthetic keystrokes into the focused window")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "clip-typer.toml")]
    config: String,

    /// Log events instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Log level; overrides logging.level from the config
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wait for hot keys: the start key types the clipboard, the stop key cancels
    Listen,
    /// Type the given text once
    Type {
        text: Option<String>,

        /// Read the text from standard input
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Starting clip-typer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);

    if args.dry_run {
        warn!("Dry run: no key events will reach the system");
    }

    let listen = matches!(args.command, None | Some(Command::Listen));
    match utils::permissions::check_permissions(listen) {
        Ok(()) => {}
        Err(e) if args.dry_run => warn!("{}", e),
        Err(e) => return Err(e.into()),
    }

    let emitter = create_emitter(&config, args.dry_run);
    let layout = InputSourceGuard::new(
        create_layout_registry(&config.layout, args.dry_run),
        &config.layout,
    );

    match args.command {
        None | Some(Command::Listen) => {
            let text_source: Arc<dyn TextSource> =
                Arc::new(ClipboardCommand::from_config(&config.clipboard));
            info!("Start trigger types the output of '{}'", text_source.name());

            let service = Arc::new(TypingService::new(&config, emitter, layout, text_source)?);
            listen_for_triggers(&config, service, args.dry_run).await
        }
        Some(Command::Type { text, stdin }) => {
            let text = match (text, stdin) {
                (Some(text), _) => text,
                (None, true) => read_stdin()?,
                (None, false) => anyhow::bail!("pass the text to type or --stdin"),
            };

            let text_source: Arc<dyn TextSource> = Arc::new(FixedText(text.clone()));
            let service = TypingService::new(&config, emitter, layout, text_source)?;
            type_once(&service, &text).await
        }
    }
}

async fn listen_for_triggers(config: &Config, service: Arc<TypingService>, dry_run: bool) -> Result<()> {
    let (commands_tx, commands_rx) = mpsc::channel(16);
    let listener = create_trigger_listener(config, commands_tx, dry_run)?;

    info!("All components initialised");

    let service_handle = tokio::spawn(Arc::clone(&service).run(commands_rx));
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!("Trigger listener failed: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C"),
        Err(err) => error!("Failed to wait for the shutdown signal: {}", err),
    }

    info!("Shutting down...");
    service.shutdown(SHUTDOWN_TIMEOUT).await;

    listener_handle.abort();
    service_handle.abort();

    let shutdown_result = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = listener_handle.await;
        let _ = service_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("All services stopped"),
        Err(_) => warn!("Timed out waiting for services to stop"),
    }

    info!("clip-typer stopped");
    Ok(())
}

async fn type_once(service: &TypingService, text: &str) -> Result<()> {
    let ticket = service.start_typing(text).await?;
    info!("Typing {} chars, Ctrl+C stops", ticket.chars());

    let handle = service.handle();
    let wait = ticket.wait();
    tokio::pin!(wait);

    let report = tokio::select! {
        report = &mut wait => report?,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping");
            handle.request_stop();
            wait.await?
        }
    };

    service.shutdown(SHUTDOWN_TIMEOUT).await;

    if let services::typing_session::SessionOutcome::Aborted(reason) = &report.outcome {
        anyhow::bail!("typing aborted: {}", reason);
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text)
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "full" {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
