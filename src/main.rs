use anyhow::Context;
use clap::Parser;
use play_bot_rs::cli::{Cli, Commands};
use play_bot_rs::config::load_config;
use play_bot_rs::handler::event_handler;
use play_bot_rs::localization::load_discord_locales;
use play_bot_rs::media::url::VideoUrl;
use play_bot_rs::media::youtube::YoutubeResolver;
use play_bot_rs::session::manager::SessionManager;
use play_bot_rs::{command, handler};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::GatewayIntents;
use songbird::SerenityInit;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&cli.config).await,
        Commands::CheckUrl { url } => {
            let video = VideoUrl::parse(&url)?;
            println!("{}", video.id());
            Ok(())
        }
    }
}

async fn run(config_path: &str) -> anyhow::Result<()> {
    info!("Starting play bot");

    let config = load_config(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;

    config.verify()?;

    info!("Loaded config");

    let locales = load_discord_locales(&config.bot.locale)?;

    let mut commands = command::commands();

    locales.apply(&mut commands)?;

    let playback = config.playback.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |_ctx, _ready, _framework| {
            Box::pin(async move {
                Ok(handler::Data {
                    session_manager: SessionManager::new(),
                    resolver: YoutubeResolver::new(reqwest::Client::new()),
                    locales,
                    playback,
                })
            })
        })
        .build();

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::ClientBuilder::new(config.bot.token, intents)
        .register_songbird()
        .framework(framework).await?;

    client.start().await?;

    Ok(())
}
