use std::sync::Arc;
use anyhow::Context as _;
use fluent::FluentArgs;
use poise::CreateReply;
use poise::serenity_prelude::{ChannelId, CreateEmbed, Mentionable};
use tracing::Instrument;
use crate::command::{reply_locale, Context, Result};
use crate::media::url::VideoUrl;
use crate::session::actor::SessionActor;
use crate::session::driver::{AudioDriver, SongbirdDriver};
use crate::session::SessionHandle;

fn user_voice_channel_id(ctx: &Context<'_>) -> Result<Option<ChannelId>> {
    let channel_id = ctx.guild()
        .ok_or_else(|| anyhow::anyhow!("Guild not found"))?
        .voice_states
        .get(&ctx.author().id)
        .and_then(|vs| vs.channel_id);
    Ok(channel_id)
}

/// Tears the session down after a failed `/play`.
async fn abandon(handle: &SessionHandle) {
    if let Err(err) = handle.leave().await {
        tracing::warn!("Session stopped before it could leave: {}", err);
    }
}

#[poise::command(slash_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "The YouTube URL to play"]
    input: String,
) -> Result<()> {
    let data = ctx.data();
    let locale = reply_locale(ctx);

    let video = match VideoUrl::parse(&input) {
        Ok(video) => video,
        Err(err) => {
            tracing::debug!("Rejected play input: {}", err);
            ctx.say(data.locales.resolve(locale, "play-invalid-url", None, None)?).await?;
            return Ok(());
        }
    };

    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("Guild only"))?;

    let Some(channel_id) = user_voice_channel_id(&ctx)? else {
        ctx.say(data.locales.resolve(locale, "play-not-in-voice", None, None)?).await?;
        return Ok(());
    };

    // joining and looking the video up take longer than the interaction deadline
    ctx.defer().await?;

    let manager = songbird::get(ctx.serenity_context())
        .await
        .ok_or_else(|| anyhow::anyhow!("Songbird Voice client not initialized"))?
        .clone();

    // claim first so an older session finishing now leaves the call alone
    let claim = data.session_manager.claim(guild_id);
    if let Some(previous) = data.session_manager.get(guild_id) {
        if let Err(err) = previous.supersede().await {
            tracing::debug!(%guild_id, "Previous session already stopped: {}", err);
        }
    }

    // subscribe before joining so the first connect reaches the session
    let call = manager.get_or_insert(guild_id);
    let driver = Arc::new(SongbirdDriver::new(manager.clone(), guild_id, call));
    let (actor, handle) = SessionActor::new(driver.clone(), claim, data.playback.reconnect_grace());

    tokio::spawn(actor.run().instrument(tracing::info_span!("session", %guild_id)));

    driver.subscribe_to_connection_events(handle.notifier()).await;
    data.session_manager.register(guild_id, handle.clone());

    if let Err(err) = manager.join(guild_id, channel_id).await {
        abandon(&handle).await;
        return Err(err).context("Failed to join voice channel");
    }

    tracing::info!(%guild_id, %channel_id, "Joined voice channel");

    let track = match data.resolver.resolve(&video).await {
        Ok(track) => track,
        Err(err) => {
            tracing::error!(%guild_id, "Error creating audio resource: {}", err);
            abandon(&handle).await;
            ctx.say(data.locales.resolve(locale, "play-source-error", None, None)?).await?;
            return Ok(());
        }
    };

    if let Err(err) = driver.play(track.input, handle.notifier()).await {
        tracing::error!(%guild_id, "Error starting playback: {:?}", err);
        abandon(&handle).await;
        ctx.say(data.locales.resolve(locale, "play-source-error", None, None)?).await?;
        return Ok(());
    }

    let mut args = FluentArgs::new();
    args.set("url", video.as_str().to_owned());
    let message_id = match track.title {
        Some(title) => {
            args.set("title", title);
            "play-now-playing-title"
        }
        None => "play-now-playing",
    };

    ctx.send(CreateReply::default().embed(CreateEmbed::new()
        .title(data.locales.resolve(locale, message_id, None, Some(&args))?)
        .field(
            data.locales.resolve(locale, "play-now-playing", Some("voice-channel"), None)?,
            channel_id.mention().to_string(),
            true
        )
    )).await?;

    Ok(())
}

#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>) -> Result<()> {
    let data = ctx.data();
    let locale = reply_locale(ctx);
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("Guild only"))?;

    let Some(session) = data.session_manager.get(guild_id) else {
        ctx.say(data.locales.resolve(locale, "leave-no-session", None, None)?).await?;
        return Ok(());
    };

    session.leave().await?;
    data.session_manager.remove(guild_id);

    ctx.send(CreateReply::default().embed(CreateEmbed::new()
        .title(data.locales.resolve(locale, "leave-response", None, None)?)
    )).await?;

    Ok(())
}
