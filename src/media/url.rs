use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use thiserror::Error;

const QUERY_HOSTS: [&str; 5] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

const ID_LENGTH: usize = 11;

static PATH_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(youtu\.be/|(www\.)?youtube\.com/(embed|v|shorts)/)").unwrap()
});
static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("not a url: {0}")]
    Malformed(String),
    #[error("not a YouTube domain: {0}")]
    UnsupportedHost(String),
    #[error("no video id found in {0}")]
    MissingId(String),
    #[error("video id {0} does not match the expected format")]
    InvalidId(String),
}

/// A YouTube watch URL that passed validation, together with its video id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrl {
    url: String,
    id: String,
}

impl VideoUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let input = input.trim();
        let parsed = Url::parse(input).map_err(|_| UrlError::Malformed(input.to_owned()))?;

        let host = parsed.host_str().unwrap_or_default();
        let query_id = parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());

        let id = match query_id {
            None if PATH_URL_REGEX.is_match(input) => {
                let mut segments = parsed.path_segments().into_iter().flatten();
                // youtu.be/<id> versus youtube.com/<kind>/<id>
                let segment = if host == "youtu.be" {
                    segments.next()
                } else {
                    segments.nth(1)
                };
                segment.filter(|s| !s.is_empty()).map(str::to_owned)
            }
            id => {
                if !QUERY_HOSTS.contains(&host) {
                    return Err(UrlError::UnsupportedHost(host.to_owned()));
                }
                id
            }
        };

        let id = id.ok_or_else(|| UrlError::MissingId(input.to_owned()))?;
        let id: String = id.chars().take(ID_LENGTH).collect();

        if !ID_REGEX.is_match(&id) {
            return Err(UrlError::InvalidId(id));
        }

        Ok(Self { url: input.to_owned(), id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}
