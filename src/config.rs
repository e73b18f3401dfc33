use crate::session::actor::DEFAULT_RECONNECT_GRACE;
use anyhow::anyhow;
use config::Config;
use serde::Deserialize;
use std::time::Duration;

pub fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    let config = Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("PLAYBOT").separator("__"))
        .build()?;

    config.try_deserialize()
        .map_err(|e| anyhow!(e))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bot: BotConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl AppConfig {
    pub fn verify(&self) -> anyhow::Result<()> {
        if self.bot.token.is_empty() {
            return Err(anyhow!("bot token is empty"))
        }

        if self.playback.reconnect_grace_secs == 0 {
            return Err(anyhow!("playback.reconnect_grace_secs must be greater than zero"))
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub token: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String { "en-US".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// How long a dropped voice connection may take to start reconnecting
    /// before it is destroyed.
    #[serde(default = "default_reconnect_grace_secs")]
    pub reconnect_grace_secs: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { reconnect_grace_secs: default_reconnect_grace_secs() }
    }
}

impl PlaybackConfig {
    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_secs(self.reconnect_grace_secs)
    }
}

fn default_reconnect_grace_secs() -> u64 { DEFAULT_RECONNECT_GRACE.as_secs() }
