use crate::session::SessionHandle;
use dashmap::DashMap;
use poise::serenity_prelude::GuildId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks which session owns each guild's call.
///
/// Songbird keeps a single call per guild and hands it to every join, so a
/// session that stops late must not tear down a call a newer session already
/// took over.
#[derive(Debug, Clone, Default)]
pub struct CallOwners {
    owners: Arc<DashMap<GuildId, u64>>,
    next_id: Arc<AtomicU64>,
}

impl CallOwners {
    pub fn claim(&self, guild_id: GuildId) -> CallClaim {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.owners.insert(guild_id, id);
        CallClaim { owners: self.clone(), guild_id, id }
    }
}

#[derive(Debug, Clone)]
pub struct CallClaim {
    owners: CallOwners,
    guild_id: GuildId,
    id: u64,
}

impl CallClaim {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Whether no later session claimed the guild's call since this claim.
    pub fn is_current(&self) -> bool {
        self.owners.owners.get(&self.guild_id).is_some_and(|owner| *owner == self.id)
    }
}

#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<GuildId, SessionHandle>,

    owners: CallOwners,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of the guild's call for a new session. Must happen
    /// before joining so that older sessions stop touching the call.
    pub fn claim(&self, guild_id: GuildId) -> CallClaim {
        self.owners.claim(guild_id)
    }

    /// Registers `handle` for `guild_id`, returning the session it replaced.
    pub fn register(&self, guild_id: GuildId, handle: SessionHandle) -> Option<SessionHandle> {
        let previous = self.sessions.insert(guild_id, handle);
        tracing::info!(%guild_id, "Registered session");
        previous.filter(|handle| !handle.is_closed())
    }

    /// Sessions whose actor already stopped are treated as absent.
    pub fn get(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions
            .get(&guild_id)
            .map(|r| r.value().clone())
            .filter(|handle| !handle.is_closed())
    }

    pub fn remove(&self, guild_id: GuildId) {
        if self.sessions.remove(&guild_id).is_some() {
            tracing::info!(%guild_id, "Removed session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::actor::SessionActor;
    use crate::session::driver::AudioDriver;
    use crate::session::SessionCommand;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingDriver {
        leave_count: AtomicUsize,
    }

    #[async_trait]
    impl AudioDriver for CountingDriver {
        async fn leave(&self) -> anyhow::Result<()> {
            self.leave_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn subscribe_to_connection_events(&self, _tx: mpsc::Sender<SessionCommand>) {}
    }

    fn session(manager: &SessionManager, guild_id: GuildId) -> (Arc<CountingDriver>, SessionActor, SessionHandle) {
        let driver = Arc::new(CountingDriver::default());
        let (actor, handle) = SessionActor::new(driver.clone(), manager.claim(guild_id), Duration::from_secs(5));
        (driver, actor, handle)
    }

    #[test]
    fn register_returns_live_previous_session() {
        let manager = SessionManager::new();
        let guild_id = GuildId::new(1);
        let (_, _first_actor, first) = session(&manager, guild_id);
        let (_, _second_actor, second) = session(&manager, guild_id);

        assert!(manager.register(guild_id, first).is_none());
        assert!(manager.register(guild_id, second).is_some());
    }

    #[test]
    fn closed_sessions_are_ignored() {
        let manager = SessionManager::new();
        let guild_id = GuildId::new(1);
        let (_, actor, handle) = session(&manager, guild_id);

        manager.register(guild_id, handle);
        assert!(manager.get(guild_id).is_some());

        drop(actor);
        assert!(manager.get(guild_id).is_none());
    }

    #[test]
    fn remove_forgets_the_guild() {
        let manager = SessionManager::new();
        let (_, _actor, handle) = session(&manager, GuildId::new(7));

        manager.register(GuildId::new(7), handle);
        manager.remove(GuildId::new(7));

        assert!(manager.get(GuildId::new(7)).is_none());
    }

    #[test]
    fn newer_claim_replaces_older_one_per_guild() {
        let owners = CallOwners::default();
        let first = owners.claim(GuildId::new(1));
        let other_guild = owners.claim(GuildId::new(2));
        assert!(first.is_current());

        let second = owners.claim(GuildId::new(1));
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(other_guild.is_current());
    }

    #[tokio::test]
    async fn late_leave_does_not_tear_down_newer_session() {
        let manager = SessionManager::new();
        let guild_id = GuildId::new(1);

        // `/leave` queued on the old session, then `/play` claims the call again
        let (old_driver, old_actor, old_handle) = session(&manager, guild_id);
        old_handle.leave().await.unwrap();
        manager.remove(guild_id);
        let (new_driver, new_actor, new_handle) = session(&manager, guild_id);
        manager.register(guild_id, new_handle.clone());

        old_actor.run().await;
        assert_eq!(old_driver.leave_count.load(Ordering::SeqCst), 0);

        let task = tokio::spawn(new_actor.run());
        new_handle.notifier().send(SessionCommand::TrackEnded).await.unwrap();
        task.await.unwrap();
        assert_eq!(new_driver.leave_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn track_end_queued_before_supersede_keeps_the_call() {
        let manager = SessionManager::new();
        let guild_id = GuildId::new(1);

        let (old_driver, old_actor, old_handle) = session(&manager, guild_id);
        old_handle.notifier().send(SessionCommand::TrackEnded).await.unwrap();
        let (_new_driver, _new_actor, _new_handle) = session(&manager, guild_id);
        old_handle.supersede().await.unwrap();

        old_actor.run().await;
        assert_eq!(old_driver.leave_count.load(Ordering::SeqCst), 0);
    }
}
