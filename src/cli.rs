use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "play-bot-rs")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to Discord and serve commands
    Run,
    /// Validate a video URL without connecting anywhere
    CheckUrl {
        url: String,
    },
}
