use crate::session::SessionCommand;
use anyhow::Context;
use async_trait::async_trait;
use poise::serenity_prelude::GuildId;
use songbird::error::JoinError;
use songbird::input::Input;
use songbird::tracks::PlayMode;
use songbird::{Call, CoreEvent, Event, EventContext, EventHandler, Songbird, TrackEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[async_trait]
pub trait AudioDriver: Sync + Send {
    /// Tears the voice connection down. Leaving an already destroyed
    /// connection succeeds.
    async fn leave(&self) -> anyhow::Result<()>;

    async fn subscribe_to_connection_events(&self, tx: mpsc::Sender<SessionCommand>);
}

pub struct SongbirdDriver {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
}

impl SongbirdDriver {
    pub fn new(manager: Arc<Songbird>, guild_id: GuildId, call: Arc<Mutex<Call>>) -> Self {
        Self { manager, guild_id, call }
    }

    /// Replaces whatever the call is playing with `input` and reports the
    /// track's lifecycle to `tx`.
    pub async fn play(&self, input: Input, tx: mpsc::Sender<SessionCommand>) -> anyhow::Result<()> {
        let mut call = self.call.lock().await;
        let track = call.play_only_input(input);

        for event in [TrackEvent::Play, TrackEvent::End, TrackEvent::Error] {
            track
                .add_event(Event::Track(event), TrackNotifier { tx: tx.clone() })
                .context("failed to subscribe to track events")?;
        }

        tracing::info!(guild_id = %self.guild_id, track = %track.uuid(), "Subscribed call to the audio track");
        Ok(())
    }
}

struct ConnectionNotifier { tx: mpsc::Sender<SessionCommand> }
#[async_trait]
impl EventHandler for ConnectionNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let command = match ctx {
            EventContext::DriverConnect(_) => SessionCommand::Connected,
            EventContext::DriverReconnect(_) => SessionCommand::Reconnected,
            EventContext::DriverDisconnect(data) => {
                tracing::debug!(kind = ?data.kind, reason = ?data.reason, "Voice driver disconnected");
                SessionCommand::Disconnected
            }
            _ => return None,
        };
        let _ = self.tx.send(command).await;
        None
    }
}

struct TrackNotifier { tx: mpsc::Sender<SessionCommand> }
#[async_trait]
impl EventHandler for TrackNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };

        for (state, _) in tracks.iter() {
            if let Some(command) = track_command(&state.playing) {
                let _ = self.tx.send(command).await;
            }
        }
        None
    }
}

fn track_command(mode: &PlayMode) -> Option<SessionCommand> {
    match mode {
        PlayMode::Play => Some(SessionCommand::TrackStarted),
        PlayMode::End | PlayMode::Stop => Some(SessionCommand::TrackEnded),
        PlayMode::Errored(err) => Some(SessionCommand::TrackFailed(format!("{:?}", err))),
        _ => None,
    }
}

/// Removes the guild's call from songbird; a guild without a call is
/// already torn down.
async fn remove_call(manager: &Songbird, guild_id: GuildId) -> anyhow::Result<()> {
    match manager.remove(guild_id).await {
        Ok(()) | Err(JoinError::NoCall) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl AudioDriver for SongbirdDriver {
    async fn leave(&self) -> anyhow::Result<()> {
        remove_call(&self.manager, self.guild_id).await
    }

    async fn subscribe_to_connection_events(&self, tx: mpsc::Sender<SessionCommand>) {
        let mut call = self.call.lock().await;
        // handlers of a superseded session would keep reporting to a dead actor
        call.remove_all_global_events();
        for event in [CoreEvent::DriverConnect, CoreEvent::DriverReconnect, CoreEvent::DriverDisconnect] {
            call.add_global_event(Event::Core(event), ConnectionNotifier { tx: tx.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songbird::tracks::PlayError;
    use symphonia::core::errors::Error as SymphoniaError;

    #[test]
    fn maps_track_states_to_session_commands() {
        assert_eq!(track_command(&PlayMode::Play), Some(SessionCommand::TrackStarted));
        assert_eq!(track_command(&PlayMode::End), Some(SessionCommand::TrackEnded));
        assert_eq!(track_command(&PlayMode::Stop), Some(SessionCommand::TrackEnded));
        assert_eq!(track_command(&PlayMode::Pause), None);
    }

    #[test]
    fn errored_track_reports_failure() {
        let mode = PlayMode::Errored(PlayError::Decode(Arc::new(SymphoniaError::DecodeError("corrupt frame"))));

        match track_command(&mode) {
            Some(SessionCommand::TrackFailed(err)) => assert!(err.contains("corrupt frame"), "{}", err),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn removing_a_missing_call_is_a_no_op() {
        let manager = Songbird::serenity();

        assert!(remove_call(&manager, GuildId::new(42)).await.is_ok());
    }
}
