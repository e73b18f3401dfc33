use crate::config::PlaybackConfig;
use crate::localization::Locales;
use crate::media::youtube::YoutubeResolver;
use crate::session::manager::SessionManager;
use poise::serenity_prelude as serenity;

pub struct Data {
    pub session_manager: SessionManager,
    pub resolver: YoutubeResolver,
    pub locales: Locales,
    pub playback: PlaybackConfig,
}

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, anyhow::Error>,
    data: &Data,
) -> Result<(), anyhow::Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Ready: {}", data_about_bot.user.name);
        }

        serenity::FullEvent::VoiceStateUpdate { old: _, new } => {
            if new.user_id != ctx.cache.current_user().id || new.channel_id.is_some() {
                return Ok(());
            }

            // the bot was disconnected or kicked from voice
            data.session_manager.remove(new.guild_id.ok_or(anyhow::anyhow!("Guild not found"))?);
        }
        _ => {}
    }
    Ok(())
}
