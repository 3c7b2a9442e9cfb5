use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{CacheEntry, CacheStore};
use crate::config::EngineConfig;
use crate::error::{CacheError, CacheResult, truncate_body};
use crate::key::CacheKey;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct StoreInfo {
    id: String,
}

/// Cache store backed by a named Apify key-value store.
///
/// The store is looked up (or created) by name on first use and its id is
/// kept for the lifetime of the adapter.
pub struct ApifyKeyValueStore {
    client: Client,
    api_base: String,
    token: String,
    store_name: String,
    store_id: OnceCell<String>,
}

impl ApifyKeyValueStore {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(client: Client, config: &EngineConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            token: config.api_token.clone(),
            store_name: config.store_name.clone(),
            store_id: OnceCell::new(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .timeout(Self::REQUEST_TIMEOUT)
    }

    /// Resolve the store id, creating the named store if it does not exist yet.
    async fn store_id(&self) -> CacheResult<&str> {
        let id = self
            .store_id
            .get_or_try_init(|| async {
                let url = format!("{}/v2/key-value-stores", self.api_base);
                let response = self
                    .authorized(self.client.post(&url))
                    .query(&[("name", self.store_name.as_str())])
                    .send()
                    .await?;
                let response = ensure_success(response).await?;
                let envelope = response.json::<ApiEnvelope<StoreInfo>>().await?;
                info!(
                    store = %self.store_name,
                    id = %envelope.data.id,
                    "Key-value store ready"
                );
                Ok::<_, CacheError>(envelope.data.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn record_url(&self, key: &CacheKey) -> CacheResult<String> {
        let store_id = self.store_id().await?;
        Ok(format!(
            "{}/v2/key-value-stores/{}/records/{}",
            self.api_base, store_id, key
        ))
    }
}

async fn ensure_success(response: Response) -> CacheResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CacheError::Status {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

#[async_trait::async_trait]
impl CacheStore for ApifyKeyValueStore {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let url = self.record_url(key).await?;
        let response = self.authorized(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(key = %key, "No record in key-value store");
            return Ok(None);
        }

        let bytes = ensure_success(response).await?.bytes().await?;
        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        if entry.mp4_url.trim().is_empty() {
            warn!(key = %key, "Ignoring stored record without a download link");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> CacheResult<()> {
        let url = self.record_url(key).await?;
        let response = self
            .authorized(self.client.put(&url))
            .json(entry)
            .send()
            .await?;
        ensure_success(response).await?;
        debug!(key = %key, "Stored record in key-value store");
        Ok(())
    }
}
