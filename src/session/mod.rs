use tokio::sync::mpsc;

pub mod actor;
pub mod driver;
pub mod manager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    // connection events, forwarded by the driver
    Connected,
    Reconnected,
    Disconnected,

    // player events for the current track
    TrackStarted,
    TrackEnded,
    TrackFailed(String),

    Leave, // user intentionally disconnected by command
    Supersede, // a newer session in the same guild took over the call
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    pub async fn leave(&self) -> anyhow::Result<()> {
        self.tx.send(SessionCommand::Leave).await?;
        Ok(())
    }

    pub async fn supersede(&self) -> anyhow::Result<()> {
        self.tx.send(SessionCommand::Supersede).await?;
        Ok(())
    }

    /// Sender handed to voice event handlers.
    pub fn notifier(&self) -> mpsc::Sender<SessionCommand> {
        self.tx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
