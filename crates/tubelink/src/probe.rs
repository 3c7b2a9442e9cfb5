//! # Validity probe
//!
//! Checks whether a previously extracted download link is still servable,
//! without downloading the media itself.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use tracing::debug;

/// Result of probing a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    Unavailable(String),
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Available => write!(f, "available"),
            ProbeOutcome::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

#[async_trait]
pub trait LinkProbe: Send + Sync {
    /// Probe `url`. Failures are reported as [`ProbeOutcome::Unavailable`], never as errors.
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Probes with `HEAD`, falling back to a one-byte ranged `GET` for servers
/// that refuse `HEAD`.
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn status_of(&self, request: reqwest::RequestBuilder) -> Result<StatusCode, String> {
        request
            .timeout(self.timeout)
            .send()
            .await
            .map(|response| response.status())
            .map_err(|e| {
                if e.is_timeout() {
                    format!("timed out after {}s", self.timeout.as_secs_f32())
                } else {
                    e.to_string()
                }
            })
    }
}

fn outcome_for(status: StatusCode) -> ProbeOutcome {
    if status.is_success() {
        ProbeOutcome::Available
    } else {
        ProbeOutcome::Unavailable(format!("status {}", status.as_u16()))
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let status = match self.status_of(self.client.head(url)).await {
            Ok(status) => status,
            Err(reason) => return ProbeOutcome::Unavailable(reason),
        };

        if !matches!(
            status,
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            return outcome_for(status);
        }

        debug!(status = status.as_u16(), "HEAD refused, probing with ranged GET");
        let ranged = self.client.get(url).header(header::RANGE, "bytes=0-0");
        match self.status_of(ranged).await {
            Ok(status) => outcome_for(status),
            Err(reason) => ProbeOutcome::Unavailable(reason),
        }
    }
}
