pub mod url;
pub mod youtube;

use songbird::input::Input;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to look up media: {0}")]
    Lookup(anyhow::Error),
}

/// # ResolvedTrack: a stream confirmed to exist, ready to hand to songbird
///
/// The input stays lazy; songbird starts pulling audio only once the track
/// is played on a call.
pub struct ResolvedTrack {
    pub title: Option<String>,
    pub input: Input,
}
