use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coachline_core::{narrate, ChatApi, ChatClient, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "coachline")]
#[command(author, version, about = "Chat with your supportive coach from the terminal", long_about = None)]
struct Cli {
    /// Backend base address, e.g. http://localhost:8000
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the backend is reachable and can answer a test message
    Check {
        /// Message to send
        #[arg(short, long, default_value = "Hello, this is a test message")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?
        .with_env()
        .with_overrides(cli.api_url, None);

    match cli.command {
        Some(Commands::Check { message }) => {
            init_stderr_logging();
            check(&config, &message).await
        }
        None => {
            init_file_logging()?;
            run_tui(config).await
        }
    }
}

async fn run_tui(config: Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(&config, events.sender());
    app.check_backend();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!("exiting");
    result
}

/// Walk the request flow once and report where it breaks.
async fn check(config: &Config, message: &str) -> Result<()> {
    let client = ChatClient::from_context(&config.execution_context());
    println!("Backend: {}", client.base_url());

    println!("1. Health check (GET /)");
    match client.health().await {
        Ok(()) => println!("   ok"),
        Err(e) => {
            println!("   failed: {}", e);
            return Ok(());
        }
    }

    println!("2. Chat request (POST /api/chat)");
    match client.send(message).await {
        Ok(response) => {
            println!("   ok");
            let preview: String = response.reply.chars().take(100).collect();
            println!("   Reply: {}", preview);
        }
        Err(e) => {
            println!("   failed [{}]", e.kind().as_str());
            println!("   {}", narrate(&e));
        }
    }
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// The terminal UI owns the screen, so logs go to a file.
fn init_file_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn log_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .context("Could not determine data directory")?;
    Ok(dir.join("coachline").join("coachline.log"))
}
