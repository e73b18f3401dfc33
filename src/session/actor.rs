use crate::session::driver::AudioDriver;
use crate::session::manager::CallClaim;
use crate::session::{SessionCommand, SessionHandle};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

pub const DEFAULT_RECONNECT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Destroy,
    Detach,
}

pub struct SessionActor {
    rx: mpsc::Receiver<SessionCommand>,
    driver: Arc<dyn AudioDriver>,
    claim: CallClaim,
    reconnect_grace: Duration,
    recovery_deadline: Option<Instant>,
    destroyed: bool,
}

impl SessionActor {
    pub fn new(driver: Arc<dyn AudioDriver>, claim: CallClaim, reconnect_grace: Duration) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = Self {
            rx: cmd_rx,
            driver,
            claim,
            reconnect_grace,
            recovery_deadline: None,
            destroyed: false,
        };

        (actor, SessionHandle::new(cmd_tx))
    }

    pub async fn run(mut self) {
        tracing::info!("Session actor started");

        let exit = loop {
            let next = match self.recovery_deadline {
                Some(deadline) => match timeout_at(deadline, self.rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!(grace = ?self.reconnect_grace, "Voice connection did not recover, treating disconnect as final");
                        break Exit::Destroy;
                    }
                },
                None => self.rx.recv().await,
            };

            let Some(cmd) = next else {
                break Exit::Destroy;
            };

            if let ControlFlow::Break(exit) = self.handle(cmd) {
                break exit;
            }
        };

        if exit == Exit::Destroy {
            self.destroy().await;
        }

        tracing::info!(?exit, "Session actor stopped");
    }

    fn handle(&mut self, cmd: SessionCommand) -> ControlFlow<Exit> {
        match cmd {
            SessionCommand::Connected | SessionCommand::Reconnected => {
                if self.recovery_deadline.take().is_some() {
                    tracing::info!("Voice connection recovered");
                } else {
                    tracing::info!("The bot has connected to the channel");
                }
            }
            SessionCommand::Disconnected => {
                // only the first disconnect opens the window
                if self.recovery_deadline.is_none() {
                    tracing::debug!("Voice connection lost, waiting for it to come back");
                    self.recovery_deadline = Some(Instant::now() + self.reconnect_grace);
                }
            }
            SessionCommand::TrackStarted => {
                tracing::info!("The audio player has started playing");
            }
            SessionCommand::TrackEnded => {
                tracing::info!("The audio player is idle");
                return ControlFlow::Break(Exit::Destroy);
            }
            SessionCommand::TrackFailed(err) => {
                tracing::error!("Audio player error: {}", err);
                return ControlFlow::Break(Exit::Destroy);
            }
            SessionCommand::Leave => return ControlFlow::Break(Exit::Destroy),
            SessionCommand::Supersede => return ControlFlow::Break(Exit::Detach),
        }
        ControlFlow::Continue(())
    }

    async fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if !self.claim.is_current() {
            tracing::info!(guild_id = %self.claim.guild_id(), "Call belongs to a newer session, not leaving");
            return;
        }

        if let Err(e) = self.driver.leave().await {
            tracing::error!("Failed to destroy voice connection: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::manager::CallOwners;
    use async_trait::async_trait;
    use poise::serenity_prelude::GuildId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockDriver {
        leave_count: AtomicUsize,
    }

    impl MockDriver {
        fn leave_count(&self) -> usize {
            self.leave_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioDriver for MockDriver {
        async fn leave(&self) -> anyhow::Result<()> {
            self.leave_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn subscribe_to_connection_events(&self, _tx: mpsc::Sender<SessionCommand>) {}
    }

    fn spawn_session() -> (Arc<MockDriver>, SessionHandle, tokio::task::JoinHandle<()>) {
        let driver = Arc::new(MockDriver::default());
        let (actor, handle) = SessionActor::new(driver.clone(), CallOwners::default().claim(GuildId::new(1)), DEFAULT_RECONNECT_GRACE);
        let task = tokio::spawn(actor.run());
        (driver, handle, task)
    }

    #[tokio::test]
    async fn player_idle_destroys_connection() {
        let (driver, handle, task) = spawn_session();
        let tx = handle.notifier();

        tx.send(SessionCommand::Connected).await.unwrap();
        tx.send(SessionCommand::TrackStarted).await.unwrap();
        tx.send(SessionCommand::TrackEnded).await.unwrap();
        task.await.unwrap();

        assert_eq!(driver.leave_count(), 1);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn player_error_destroys_connection() {
        let (driver, handle, task) = spawn_session();

        handle.notifier().send(SessionCommand::TrackFailed("decode".to_string())).await.unwrap();
        task.await.unwrap();

        assert_eq!(driver.leave_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_without_recovery_is_terminal() {
        let (driver, handle, task) = spawn_session();

        handle.notifier().send(SessionCommand::Disconnected).await.unwrap();
        task.await.unwrap();

        assert_eq!(driver.leave_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_within_grace_keeps_session() {
        let (driver, handle, task) = spawn_session();
        let tx = handle.notifier();

        tx.send(SessionCommand::Disconnected).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send(SessionCommand::Reconnected).await.unwrap();

        // well past the original deadline
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.leave_count(), 0);
        assert!(!task.is_finished());

        tx.send(SessionCommand::TrackEnded).await.unwrap();
        task.await.unwrap();
        assert_eq!(driver.leave_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_disconnects_do_not_extend_grace() {
        let (driver, handle, task) = spawn_session();
        let tx = handle.notifier();

        tx.send(SessionCommand::Disconnected).await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        tx.send(SessionCommand::Disconnected).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(task.is_finished());
        assert_eq!(driver.leave_count(), 1);
    }

    #[tokio::test]
    async fn supersede_detaches_without_leaving() {
        let (driver, handle, task) = spawn_session();

        handle.supersede().await.unwrap();
        task.await.unwrap();

        assert_eq!(driver.leave_count(), 0);
    }

    #[tokio::test]
    async fn leave_destroys_once() {
        let (driver, handle, task) = spawn_session();
        let tx = handle.notifier();

        handle.leave().await.unwrap();
        // the player reports idle after the call is gone
        let _ = tx.send(SessionCommand::TrackEnded).await;
        task.await.unwrap();

        assert_eq!(driver.leave_count(), 1);
    }

    #[tokio::test]
    async fn dropping_every_sender_destroys_connection() {
        let (driver, handle, task) = spawn_session();

        drop(handle);
        task.await.unwrap();

        assert_eq!(driver.leave_count(), 1);
    }
}
