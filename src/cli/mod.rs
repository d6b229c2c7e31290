//! CLI Module
//!
//! Offline rendering of the game's sounds to WAV files.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hairgame Sound - render the minigame's music and effects
#[derive(Parser, Debug)]
#[command(name = "hairgame-sound")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the background loop
    #[command(name = "loop")]
    Loop {
        /// Tempo in beats per minute
        #[arg(short, long)]
        bpm: Option<f64>,

        /// Seconds to render
        #[arg(short, long, default_value_t = 4.0)]
        seconds: f64,

        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Render the win fanfare
    #[command(name = "fanfare")]
    Fanfare {
        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Render a scripted round: loop, cues, then a win
    #[command(name = "session")]
    Session {
        /// Seconds of play before the win
        #[arg(short, long, default_value_t = 6.0)]
        seconds: f64,

        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,
    },
}
