use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RequestError};
use crate::store::CacheEntry;

/// Video heights the extraction actor can deliver.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u16)]
#[serde(try_from = "u16", into = "u16")]
pub enum Resolution {
    P2160 = 2160,
    P1440 = 1440,
    P1080 = 1080,
    P720 = 720,
    P480 = 480,
    P360 = 360,
    P240 = 240,
    P144 = 144,
}

impl Resolution {
    pub fn height(self) -> u16 {
        self.into()
    }

    /// Label the extraction actor expects, e.g. `"720p"`.
    pub fn actor_label(self) -> String {
        format!("{}p", self.height())
    }
}

// Not derived: num_enum treats a `#[default]` variant as a catch-all for unknown heights.
impl Default for Resolution {
    fn default() -> Self {
        Resolution::P360
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.height())
    }
}

/// Accepts `"720"` as well as `"720p"`.
impl FromStr for Resolution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidResolution(s.to_string()));
        }
        digits
            .parse::<u16>()
            .ok()
            .and_then(|height| Resolution::try_from(height).ok())
            .ok_or_else(|| ConfigError::InvalidResolution(s.to_string()))
    }
}

/// A validated resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    source_url: String,
    resolution: Resolution,
    use_residential_proxy: bool,
    proxy_country: String,
    force_refresh: bool,
}

impl Request {
    pub fn new(source_url: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            source_url: source_url.into(),
            resolution,
            use_residential_proxy: false,
            proxy_country: DEFAULT_PROXY_COUNTRY.to_string(),
            force_refresh: false,
        }
    }

    pub fn with_residential_proxy(mut self, country: impl Into<String>) -> Self {
        self.use_residential_proxy = true;
        self.proxy_country = country.into();
        self
    }

    pub fn with_proxy_country(mut self, country: impl Into<String>) -> Self {
        self.proxy_country = country.into();
        self
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn use_residential_proxy(&self) -> bool {
        self.use_residential_proxy
    }

    pub fn proxy_country(&self) -> &str {
        &self.proxy_country
    }

    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }

    /// Upper-cased proxy country, or an error when it is not two ASCII letters.
    pub(crate) fn normalized_proxy_country(&self) -> Result<String, RequestError> {
        let country = self.proxy_country.trim();
        if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(country.to_ascii_uppercase())
        } else {
            Err(RequestError::InvalidProxyCountry(self.proxy_country.clone()))
        }
    }
}

pub const DEFAULT_PROXY_COUNTRY: &str = "US";

fn default_resolution() -> String {
    "360".to_string()
}

fn default_proxy_country() -> String {
    DEFAULT_PROXY_COUNTRY.to_string()
}

/// Configuration as handed over by the host, before any validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default)]
    pub use_residential_proxy: bool,
    #[serde(default = "default_proxy_country")]
    pub proxy_country: String,
    #[serde(default)]
    pub force_refresh: bool,
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            resolution: default_resolution(),
            use_residential_proxy: false,
            proxy_country: default_proxy_country(),
            force_refresh: false,
        }
    }
}

impl TryFrom<&InboundConfig> for Request {
    type Error = ConfigError;

    fn try_from(config: &InboundConfig) -> Result<Self, Self::Error> {
        let resolution = config.resolution.parse::<Resolution>()?;
        Ok(Self {
            source_url: config.url.clone(),
            resolution,
            use_residential_proxy: config.use_residential_proxy,
            proxy_country: config.proxy_country.clone(),
            force_refresh: config.force_refresh,
        })
    }
}

pub(crate) const MSG_FROM_CACHE: &str = "served from cache";
pub(crate) const MSG_FRESH: &str = "freshly fetched";

/// Outcome of one resolution, always produced even on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResolveResult {
    pub success: bool,
    pub message: String,
    pub mp4_url: String,
    pub cached: bool,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub video_description: String,
}

impl ResolveResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub(crate) fn from_cache(entry: CacheEntry) -> Self {
        Self::with_entry(MSG_FROM_CACHE, true, entry)
    }

    pub(crate) fn fresh(entry: CacheEntry) -> Self {
        Self::with_entry(MSG_FRESH, false, entry)
    }

    fn with_entry(message: &str, cached: bool, entry: CacheEntry) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            mp4_url: entry.mp4_url,
            cached,
            video_title: entry.title.unwrap_or_default(),
            channel_name: entry.channel.unwrap_or_default(),
            video_description: entry.description.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_suffixed_resolutions() {
        assert_eq!("720".parse::<Resolution>().unwrap(), Resolution::P720);
        assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::P1080);
        assert_eq!(" 144P ".parse::<Resolution>().unwrap(), Resolution::P144);
        assert_eq!(Resolution::P2160.to_string(), "2160");
        assert_eq!(Resolution::P720.actor_label(), "720p");
    }

    #[test]
    fn rejects_unknown_resolutions() {
        for bad in ["9999", "", "highest", "720pp", "-360", "+720", "+720p", "7 20"] {
            let err = bad.parse::<Resolution>().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidResolution(_)), "{bad}");
        }
    }

    #[test]
    fn inbound_config_defaults() {
        let config: InboundConfig =
            serde_json::from_str(r#"{"url": "https://youtu.be/abc"}"#).unwrap();
        assert_eq!(config.resolution, "360");
        assert_eq!(config.proxy_country, "US");
        assert!(!config.use_residential_proxy);
        assert!(!config.force_refresh);

        let request = Request::try_from(&config).unwrap();
        assert_eq!(request.resolution(), Resolution::P360);
        assert_eq!(request.source_url(), "https://youtu.be/abc");
    }

    #[test]
    fn proxy_country_normalization() {
        let request = Request::new("u", Resolution::P720).with_residential_proxy("de");
        assert_eq!(request.normalized_proxy_country().unwrap(), "DE");

        let request = Request::new("u", Resolution::P720).with_proxy_country("USA");
        assert_eq!(
            request.normalized_proxy_country(),
            Err(RequestError::InvalidProxyCountry("USA".to_string()))
        );
    }

    #[test]
    fn failure_result_carries_no_link() {
        let result = ResolveResult::failure("boom");
        assert!(!result.success);
        assert!(!result.cached);
        assert!(result.mp4_url.is_empty());
        assert_eq!(result.message, "boom");
    }

    #[test]
    fn results_carry_entry_metadata() {
        let entry = CacheEntry::new("https://cdn.example/v.mp4")
            .with_title_option(Some("T".into()))
            .with_description_option(Some("D".into()));

        let result = ResolveResult::from_cache(entry.clone());
        assert!(result.cached);
        assert_eq!(result.message, "served from cache");
        assert_eq!(result.video_title, "T");
        assert_eq!(result.channel_name, "");
        assert_eq!(result.video_description, "D");

        let result = ResolveResult::fresh(entry);
        assert!(!result.cached);
        assert_eq!(result.message, "freshly fetched");
        assert_eq!(result.mp4_url, "https://cdn.example/v.mp4");
    }
}
