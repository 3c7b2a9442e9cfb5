//! Resolve YouTube videos to direct, time-limited MP4 download links.
//!
//! Extraction is delegated to an Apify actor. Results are cached in a named
//! Apify key-value store and revalidated with a lightweight probe before a
//! cached link is served again.
//!
//! ```no_run
//! use tubelink_engine::{EngineConfig, LinkResolver, Request, Resolution};
//!
//! # async fn run() -> Result<(), tubelink_engine::ConfigError> {
//! let config = EngineConfig::from_env()?;
//! let resolver = LinkResolver::from_config(&config)?;
//! let result = resolver
//!     .resolve(&Request::new("https://youtu.be/dQw4w9WgXcQ", Resolution::P720))
//!     .await;
//! println!("{} (cached: {})", result.mp4_url, result.cached);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod error;
pub mod extractor;
mod handler;
pub mod key;
pub mod probe;
pub mod request;
pub mod resolver;
pub mod store;
#[cfg(test)]
mod test_utils;

pub use client::create_client;
pub use config::EngineConfig;
pub use error::{CacheError, ConfigError, ExtractionError, RequestError};
pub use extractor::{ApifyExtractor, ExtractedVideo, ExtractionRequest, VideoExtractor};
pub use handler::{execute, execute_with_lookup};
pub use key::{CacheKey, normalize_url};
pub use probe::{HttpProbe, LinkProbe, ProbeOutcome};
pub use request::{InboundConfig, Request, Resolution, ResolveResult};
pub use resolver::LinkResolver;
pub use store::{ApifyKeyValueStore, CacheEntry, CacheStore, MemoryStore};
