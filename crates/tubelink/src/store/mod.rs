//! # Cache store
//!
//! Namespaced key-value persistence for resolved links. The resolver only
//! ever reads entries or replaces them whole; entries are never edited in
//! place and never explicitly deleted.

mod apify;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CacheResult;
use crate::key::CacheKey;

pub use apify::ApifyKeyValueStore;
pub use memory::MemoryStore;

/// A previously extracted download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub mp4_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CacheEntry {
    pub fn new(mp4_url: impl Into<String>) -> Self {
        Self {
            mp4_url: mp4_url.into(),
            created_at: Utc::now(),
            title: None,
            channel: None,
            description: None,
        }
    }

    pub fn with_title_option(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_channel_option(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_description_option(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Time elapsed since the entry was written, zero if the clock went backwards.
    pub fn age(&self) -> std::time::Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or_default()
    }
}

/// A store that can hold cache entries.
///
/// A missing record is `Ok(None)`. Transport or decoding problems are errors
/// and must never be reported as a hit.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the entry stored under `key`
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>>;

    /// Store `entry` under `key`, replacing any previous entry
    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> CacheResult<()>;
}
