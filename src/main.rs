//! Tic-Tac Arena - terminal client entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::Path;
use tictac_arena::{BackendConfig, LobbyController};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { config } => run_lobby(&config).await,
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Loads the config, preferring the file but falling back to the
/// environment when the file is absent.
fn load_config(path: &Path) -> Result<BackendConfig> {
    if path.exists() {
        Ok(BackendConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using environment");
        Ok(BackendConfig::from_env()?)
    }
}

/// Runs the lobby TUI.
async fn run_lobby(config_path: &Path) -> Result<()> {
    // Setup logging to file to avoid interfering with TUI
    let log_file = std::fs::File::create("tictac_arena.log")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init(); // Don't panic if already initialized

    info!("Starting Tic-Tac Arena");

    let config = load_config(config_path)?;
    let mut controller = LobbyController::new(config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = controller.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = ?err, "Lobby loop error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Loads the configuration and prints a redacted summary.
fn check_config(config_path: &Path) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(config_path)?;
    let key = config.api_key();
    let redacted = if key.chars().count() > 8 {
        let head: String = key.chars().take(8).collect();
        format!("{head}…")
    } else {
        "<set>".to_string()
    };
    println!("base_url: {}", config.base_url());
    println!("api_key:  {redacted}");
    Ok(())
}
