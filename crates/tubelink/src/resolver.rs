//! # Link resolution
//!
//! [`LinkResolver`] maps a request to a cache key, serves a cached link when
//! it still probes as available, and otherwise runs the extraction API once
//! and writes the fresh link back.
//!
//! Concurrent calls for the same key are not deduplicated: both may miss and
//! both may extract, and the last successful write wins.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::create_client;
use crate::config::EngineConfig;
use crate::error::{ConfigError, ExtractionError, RequestError};
use crate::extractor::{ApifyExtractor, ExtractionRequest, VideoExtractor};
use crate::key::{CacheKey, normalize_url};
use crate::probe::{HttpProbe, LinkProbe};
use crate::request::{InboundConfig, Request, ResolveResult};
use crate::store::{ApifyKeyValueStore, CacheEntry, CacheStore};

pub struct LinkResolver {
    store: Arc<dyn CacheStore>,
    extractor: Arc<dyn VideoExtractor>,
    probe: Arc<dyn LinkProbe>,
    fresh_window: Option<Duration>,
}

/// A request that passed validation, with its derived key.
struct Prepared {
    key: CacheKey,
    extraction: ExtractionRequest,
}

impl LinkResolver {
    pub fn new(
        store: Arc<dyn CacheStore>,
        extractor: Arc<dyn VideoExtractor>,
        probe: Arc<dyn LinkProbe>,
    ) -> Self {
        Self {
            store,
            extractor,
            probe,
            fresh_window: None,
        }
    }

    /// Skip the validity probe for entries younger than `window`.
    pub fn with_fresh_window(mut self, window: Option<Duration>) -> Self {
        self.fresh_window = window.filter(|w| !w.is_zero());
        self
    }

    /// Wire the Apify store, Apify extractor and HTTP probe from `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let client = create_client()?;
        let store = ApifyKeyValueStore::new(client.clone(), config);
        let extractor = ApifyExtractor::new(client.clone(), config);
        let probe = HttpProbe::new(client, config.probe_timeout);
        Ok(Self::new(Arc::new(store), Arc::new(extractor), Arc::new(probe))
            .with_fresh_window(config.fresh_window))
    }

    /// Parse host configuration and resolve it. Invalid configuration fails
    /// without any network call.
    pub async fn resolve_inbound(&self, config: &InboundConfig) -> ResolveResult {
        match Request::try_from(config) {
            Ok(request) => self.resolve(&request).await,
            Err(e) => {
                warn!(resolution = %config.resolution, "Rejected configuration: {e}");
                ResolveResult::failure(e.to_string())
            }
        }
    }

    pub async fn resolve(&self, request: &Request) -> ResolveResult {
        let prepared = match prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(url = %request.source_url(), "Rejected request: {e}");
                return ResolveResult::failure(e.to_string());
            }
        };
        let key = &prepared.key;

        if request.force_refresh() {
            debug!(key = %key, "Forced refresh, skipping cache");
        } else if let Some(entry) = self.lookup(key).await {
            if self.still_valid(key, &entry).await {
                info!(key = %key, "Serving link from cache");
                return ResolveResult::from_cache(entry);
            }
        }

        self.fetch(&prepared).await
    }

    /// Read the cache, treating any store failure as a miss.
    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(Some(entry)) => {
                debug!(key = %key, created_at = %entry.created_at, "Cache hit");
                Some(entry)
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, "Cache read failed, fetching instead: {e}");
                None
            }
        }
    }

    async fn still_valid(&self, key: &CacheKey, entry: &CacheEntry) -> bool {
        if let Some(window) = self.fresh_window {
            let age = entry.age();
            if age < window {
                debug!(
                    key = %key,
                    age_s = age.as_secs(),
                    "Entry within fresh window, probe skipped"
                );
                return true;
            }
        }

        let outcome = self.probe.probe(&entry.mp4_url).await;
        if !outcome.is_available() {
            info!(key = %key, "Cached link is stale: {outcome}");
        }
        outcome.is_available()
    }

    async fn fetch(&self, prepared: &Prepared) -> ResolveResult {
        let key = &prepared.key;
        let video = match self.extractor.extract(&prepared.extraction).await {
            Ok(video) => video,
            Err(e) => {
                warn!(key = %key, "Extraction failed: {e}");
                return ResolveResult::failure(e.to_string());
            }
        };

        let mp4_url = video.mp4_url.trim();
        if mp4_url.is_empty() {
            warn!(key = %key, "Extractor returned an empty link, nothing cached");
            let error = ExtractionError::NoDownloadLink(prepared.extraction.source_url.clone());
            return ResolveResult::failure(error.to_string());
        }

        let entry = CacheEntry::new(mp4_url)
            .with_title_option(video.title)
            .with_channel_option(video.channel)
            .with_description_option(video.description);
        match self.store.put(key, &entry).await {
            Ok(()) => debug!(key = %key, "Cached fresh link"),
            Err(e) => warn!(key = %key, "Cache write failed, returning link anyway: {e}"),
        }

        info!(key = %key, title = entry.title.as_deref().unwrap_or(""), "Fetched fresh link");
        ResolveResult::fresh(entry)
    }
}

fn prepare(request: &Request) -> Result<Prepared, RequestError> {
    let normalized = normalize_url(request.source_url())?;
    let proxy_country = request.normalized_proxy_country()?;
    let key = CacheKey::from_normalized(&normalized, request.resolution());
    Ok(Prepared {
        key,
        extraction: ExtractionRequest {
            source_url: normalized,
            resolution: request.resolution(),
            use_residential_proxy: request.use_residential_proxy(),
            proxy_country,
        },
    })
}
