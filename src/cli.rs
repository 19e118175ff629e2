//! Command-line interface for tictac_arena.

use clap::{Parser, Subcommand};

/// Tic-Tac Arena - online two-player tic-tac-toe in the terminal
#[derive(Parser, Debug)]
#[command(name = "tictac_arena")]
#[command(about = "Online tic-tac-toe over a hosted backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the lobby TUI (sign in, matchmaking, live games)
    Play {
        /// Path to the backend configuration file
        #[arg(short, long, default_value = "arena.toml")]
        config: std::path::PathBuf,
    },

    /// Load the configuration and report what would be used
    CheckConfig {
        /// Path to the backend configuration file
        #[arg(short, long, default_value = "arena.toml")]
        config: std::path::PathBuf,
    },
}
