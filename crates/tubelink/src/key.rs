//! # Cache keys
//!
//! A cache key is derived from the normalized video url and the requested
//! resolution. Every url form that points at the same video (watch pages,
//! Shorts, `youtu.be` short links, embeds, urls carrying tracking parameters)
//! normalizes to `https://www.youtube.com/watch?v=<id>`, so all of them share
//! one key per resolution.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::RequestError;
use crate::request::Resolution;

static VIDEO_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid video id regex"));

const WATCH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

const SHORT_LINK_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes whose next segment is the video id.
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "v", "live"];

/// Canonical url of a YouTube video.
pub fn normalize_url(raw: &str) -> Result<String, RequestError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RequestError::EmptyUrl);
    }

    let with_scheme = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| RequestError::InvalidUrl(format!("{trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RequestError::InvalidUrl(trimmed.to_string()));
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| RequestError::InvalidUrl(trimmed.to_string()))?;

    let video_id = if SHORT_LINK_HOSTS.contains(&host.as_str()) {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string)
    } else if WATCH_HOSTS.contains(&host.as_str()) {
        video_id_from_watch_url(&parsed)
    } else {
        return Err(RequestError::UnsupportedHost(host));
    };

    match video_id {
        Some(id) if VIDEO_ID_REGEX.is_match(&id) => {
            Ok(format!("https://www.youtube.com/watch?v={id}"))
        }
        _ => Err(RequestError::MissingVideoId(trimmed.to_string())),
    }
}

/// True when `raw` starts with `<scheme>://`, the scheme being ASCII letters.
fn has_scheme(raw: &str) -> bool {
    raw.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty() && scheme.bytes().all(|b| b.is_ascii_alphabetic())
    })
}

fn video_id_from_watch_url(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.first() == Some(&"watch") {
        return url
            .query_pairs()
            .find(|(name, _)| name == "v")
            .map(|(_, value)| value.into_owned());
    }

    match segments.as_slice() {
        [prefix, id, ..] if ID_PATH_PREFIXES.contains(prefix) => Some((*id).to_string()),
        _ => None,
    }
}

/// Deterministic store key for a `(url, resolution)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key from an already normalized url.
    pub fn from_normalized(normalized_url: &str, resolution: Resolution) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalized_url.as_bytes());
        hasher.update(b"|");
        hasher.update(resolution.to_string().as_bytes());
        let digest = hasher.finalize();
        Self(format!("mp4-{}-{}", resolution, hex::encode(digest)))
    }

    /// Normalizes `source_url` and builds its key.
    pub fn derive(source_url: &str, resolution: Resolution) -> Result<Self, RequestError> {
        let normalized = normalize_url(source_url)?;
        Ok(Self::from_normalized(&normalized, resolution))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
