use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "APIFY_API_KEY";
pub const API_BASE_ENV: &str = "TUBELINK_API_BASE";
pub const ACTOR_ID_ENV: &str = "TUBELINK_ACTOR_ID";
pub const STORE_NAME_ENV: &str = "TUBELINK_STORE_NAME";
pub const PROBE_TIMEOUT_ENV: &str = "TUBELINK_PROBE_TIMEOUT_SECS";
pub const FETCH_TIMEOUT_ENV: &str = "TUBELINK_FETCH_TIMEOUT_SECS";
pub const FRESH_WINDOW_ENV: &str = "TUBELINK_FRESH_WINDOW_SECS";

pub const DEFAULT_API_BASE: &str = "https://api.apify.com";
pub const DEFAULT_ACTOR_ID: &str = "QrdkHOap2H2LvbyZk";
pub const DEFAULT_STORE_NAME: &str = "youtube-mp4-links";

/// Settings for the resolver and its Apify-backed collaborators.
#[derive(Clone)]
pub struct EngineConfig {
    /// Credential for both the actor and the key-value store
    pub api_token: String,
    /// Base url of the Apify api, without trailing slash
    pub api_base: String,
    /// Actor that turns a video url into a download link
    pub actor_id: String,
    /// Name of the key-value store holding cached links
    pub store_name: String,
    /// Timeout for one validity probe
    pub probe_timeout: Duration,
    /// Timeout for one extraction run
    pub fetch_timeout: Duration,
    /// Entries younger than this are served without probing
    pub fresh_window: Option<Duration>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("actor_id", &self.actor_id)
            .field("store_name", &self.store_name)
            .field("probe_timeout", &self.probe_timeout)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("fresh_window", &self.fresh_window)
            .finish()
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EngineConfig: api={}, actor={}, store={}, probe_timeout={}s, fetch_timeout={}s, fresh_window={}",
            self.api_base,
            self.actor_id,
            self.store_name,
            self.probe_timeout.as_secs(),
            self.fetch_timeout.as_secs(),
            self.fresh_window
                .map(|w| format!("{}s", w.as_secs()))
                .unwrap_or_else(|| "off".to_string()),
        )
    }
}

impl EngineConfig {
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            actor_id: DEFAULT_ACTOR_ID.to_string(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            fresh_window: None,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup(API_KEY_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_ENV))?;

        let mut config = Self::new(api_token);

        if let Some(base) = non_empty(lookup(API_BASE_ENV)) {
            config = config.with_api_base(base);
        }
        if let Some(actor) = non_empty(lookup(ACTOR_ID_ENV)) {
            config.actor_id = actor;
        }
        if let Some(store) = non_empty(lookup(STORE_NAME_ENV)) {
            config.store_name = store;
        }
        if let Some(secs) = parse_secs(PROBE_TIMEOUT_ENV, lookup(PROBE_TIMEOUT_ENV))? {
            config.probe_timeout = secs;
        }
        if let Some(secs) = parse_secs(FETCH_TIMEOUT_ENV, lookup(FETCH_TIMEOUT_ENV))? {
            config.fetch_timeout = secs;
        }
        if let Some(window) = parse_secs(FRESH_WINDOW_ENV, lookup(FRESH_WINDOW_ENV))? {
            config.fresh_window = Some(window).filter(|w| !w.is_zero());
        }

        if config.probe_timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: PROBE_TIMEOUT_ENV,
                value: "0".to_string(),
            });
        }
        if config.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: FETCH_TIMEOUT_ENV,
                value: "0".to_string(),
            });
        }

        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self
    }

    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = store_name.into();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_fresh_window(mut self, window: Option<Duration>) -> Self {
        self.fresh_window = window;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(name: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidSetting { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_credential_is_a_config_error() {
        let err = EngineConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(API_KEY_ENV)));

        let err = EngineConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = EngineConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "secret")])).unwrap();
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.actor_id, DEFAULT_ACTOR_ID);
        assert_eq!(config.store_name, DEFAULT_STORE_NAME);
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.fetch_timeout, Duration::from_secs(300));
        assert_eq!(config.fresh_window, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "secret"),
            (API_BASE_ENV, "http://127.0.0.1:9000/"),
            (STORE_NAME_ENV, "links"),
            (PROBE_TIMEOUT_ENV, "2"),
            (FRESH_WINDOW_ENV, "60"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.store_name, "links");
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.fresh_window, Some(Duration::from_secs(60)));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "secret"),
            (PROBE_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting { name: PROBE_TIMEOUT_ENV, .. }
        ));

        let err = EngineConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "secret"),
            (FETCH_TIMEOUT_ENV, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[test]
    fn debug_redacts_token() {
        let config = EngineConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
        assert!(!config.to_string().contains("super-secret"));
    }
}
