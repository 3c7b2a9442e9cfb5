//! # Extraction API
//!
//! Turns a video url into a direct, time-limited MP4 link by running an
//! Apify actor synchronously and reading the first dataset item.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ExtractionError, truncate_body};
use crate::request::Resolution;

/// What the extraction API is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub source_url: String,
    pub resolution: Resolution,
    pub use_residential_proxy: bool,
    pub proxy_country: String,
}

/// A successfully extracted link with the metadata that came with it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedVideo {
    pub mp4_url: String,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Run one extraction. Implementations must not retry internally.
    async fn extract(&self, request: &ExtractionRequest)
    -> Result<ExtractedVideo, ExtractionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyInput<'a> {
    use_apify_proxy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    apify_proxy_groups: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apify_proxy_country: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ActorInput<'a> {
    urls: [&'a str; 1],
    resolution: String,
    max_concurrent: u32,
    proxy: ProxyInput<'a>,
}

impl<'a> ActorInput<'a> {
    fn from_request(request: &'a ExtractionRequest) -> Self {
        let proxy = if request.use_residential_proxy {
            ProxyInput {
                use_apify_proxy: true,
                apify_proxy_groups: Some(["RESIDENTIAL"]),
                apify_proxy_country: Some(request.proxy_country.as_str()),
            }
        } else {
            ProxyInput {
                use_apify_proxy: true,
                apify_proxy_groups: None,
                apify_proxy_country: None,
            }
        };

        Self {
            urls: [request.source_url.as_str()],
            resolution: request.resolution.actor_label(),
            max_concurrent: 1,
            proxy,
        }
    }
}

/// One dataset item produced by the actor.
#[derive(Debug, Deserialize, Default)]
struct DatasetItem {
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "errorMessage")]
    error: Option<String>,
}

impl DatasetItem {
    fn into_video(self, source_url: &str) -> Result<ExtractedVideo, ExtractionError> {
        if let Some(reason) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(ExtractionError::Rejected(reason));
        }
        let mp4_url = self
            .download_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ExtractionError::NoDownloadLink(source_url.to_string()))?;
        Ok(ExtractedVideo {
            mp4_url,
            title: self.title,
            channel: self.channel,
            description: self.description,
        })
    }
}

/// Extraction through the Apify `run-sync-get-dataset-items` endpoint.
pub struct ApifyExtractor {
    client: Client,
    api_base: String,
    token: String,
    actor_id: String,
    run_timeout: Duration,
}

impl ApifyExtractor {
    /// Slack on top of the actor run timeout for the HTTP round trip.
    const HTTP_GRACE: Duration = Duration::from_secs(15);

    pub fn new(client: Client, config: &EngineConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            token: config.api_token.clone(),
            actor_id: config.actor_id.clone(),
            run_timeout: config.fetch_timeout,
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> ExtractionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ExtractionError::Unauthorized(status.as_u16())
        }
        StatusCode::PAYMENT_REQUIRED => ExtractionError::QuotaExceeded,
        StatusCode::REQUEST_TIMEOUT => ExtractionError::Timeout,
        _ => ExtractionError::Upstream {
            status: status.as_u16(),
            body: truncate_body(body),
        },
    }
}

#[async_trait]
impl VideoExtractor for ApifyExtractor {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractedVideo, ExtractionError> {
        let url = format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items",
            self.api_base, self.actor_id
        );
        let input = ActorInput::from_request(request);
        debug!(
            actor = %self.actor_id,
            source_url = %request.source_url,
            resolution = %request.resolution,
            residential = request.use_residential_proxy,
            "Running extraction actor"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[("timeout", self.run_timeout.as_secs().to_string())])
            .timeout(self.run_timeout + Self::HTTP_GRACE)
            .json(&input)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout
                } else {
                    ExtractionError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let items: Vec<DatasetItem> = serde_json::from_str(&body)?;
        debug!(items = items.len(), "Extraction actor finished");
        items
            .into_iter()
            .next()
            .ok_or(ExtractionError::NoItems)?
            .into_video(&request.source_url)
    }
}
