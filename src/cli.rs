//! Command-line interface for stacktris.

use clap::{Parser, Subcommand};

/// Stacktris - Tetris engine with profiles, rankings and auth callback handling
#[derive(Parser, Debug)]
#[command(name = "stacktris")]
#[command(about = "Tetris engine with profiles, rankings and auth callback handling", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Play a headless game with the built-in bot
    Play {
        /// Randomizer seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Stop after this many pieces
        #[arg(long, default_value = "500")]
        max_pieces: u32,

        /// Record the finished game for the signed-in user (or as a guest)
        #[arg(long)]
        record: bool,

        /// Print the final board
        #[arg(long)]
        show_board: bool,
    },

    /// Apply pending database migrations
    Migrate,

    /// Exchange an auth callback code and keep the session
    Login {
        /// One-time code from the callback URL
        #[arg(long)]
        code: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show a leaderboard
    Ranking {
        /// overall, weekly, monthly or yearly
        #[arg(default_value = "overall")]
        partition: String,
    },
}
