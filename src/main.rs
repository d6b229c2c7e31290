//! Hairgame Sound CLI
//!
//! Renders the minigame's music and effects offline.

use clap::Parser;
use env_logger::Env;
use log::info;

use hairgame_sound::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Hairgame Sound v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Loop { bpm, seconds, out }) => {
            commands::render_loop(config, bpm, seconds, &out)
        }
        Some(Commands::Fanfare { out }) => commands::render_fanfare(config, &out),
        Some(Commands::Session { seconds, out }) => {
            commands::render_session(config, seconds, &out)
        }
        None => {
            println!("Hairgame Sound v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}
