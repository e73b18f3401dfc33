use crate::media::url::VideoUrl;
use crate::media::{MediaError, ResolvedTrack};
use reqwest::Client;
use songbird::input::{Compose, YoutubeDl};

#[derive(Clone)]
pub struct YoutubeResolver {
    client: Client,
}

impl YoutubeResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Looks the video up through yt-dlp before anything is played, so an
    /// unavailable or private video fails here rather than on the call.
    pub async fn resolve(&self, video: &VideoUrl) -> Result<ResolvedTrack, MediaError> {
        let mut source = YoutubeDl::new(self.client.clone(), video.as_str().to_owned());

        let metadata = match source.aux_metadata().await {
            Ok(metadata) => metadata,
            Err(err) => return Err(MediaError::Lookup(anyhow::Error::new(err))),
        };

        tracing::debug!(video_id = video.id(), title = ?metadata.title, "Resolved media stream");

        Ok(ResolvedTrack {
            title: metadata.title,
            input: source.into(),
        })
    }
}
