use thiserror::Error;

/// Errors raised while assembling the engine or parsing host configuration.
/// These fail fast and are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing {0} environment variable, set it and try again")]
    MissingCredential(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
    #[error("resolution must be one of 2160, 1440, 1080, 720, 480, 360, 240, 144 (got {0:?})")]
    InvalidResolution(String),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// A request that cannot be resolved without ever touching the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("please provide a YouTube video url")]
    EmptyUrl,
    #[error("invalid YouTube url: {0}")]
    InvalidUrl(String),
    #[error("unsupported host {0}, only YouTube urls are accepted")]
    UnsupportedHost(String),
    #[error("no video id found in url: {0}")]
    MissingVideoId(String),
    #[error("proxy country must be a 2-letter code (got {0:?})")]
    InvalidProxyCountry(String),
}

/// Failures of the backing key-value store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache store http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cache store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cache entry decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Reasons the extraction API could not produce a link.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("extraction api http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("extraction api json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("extraction api rejected the credential ({0})")]
    Unauthorized(u16),
    #[error("extraction api quota exhausted")]
    QuotaExceeded,
    #[error("extraction run timed out")]
    Timeout,
    #[error("extraction api returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("no video information returned")]
    NoItems,
    #[error("no download link found for {0}")]
    NoDownloadLink(String),
    #[error("extraction rejected: {0}")]
    Rejected(String),
}

/// Longest upstream body kept in an error message.
pub(crate) const MAX_ERROR_BODY: usize = 256;

pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
