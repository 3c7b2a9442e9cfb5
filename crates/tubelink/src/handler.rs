use tracing::{debug, error};

use crate::config::EngineConfig;
use crate::request::{InboundConfig, ResolveResult};
use crate::resolver::LinkResolver;

/// Host entry point: configure from the process environment and resolve `config`.
///
/// Every outcome, including a missing credential, comes back as a [`ResolveResult`].
pub async fn execute(config: &InboundConfig) -> ResolveResult {
    execute_with_lookup(config, |name| std::env::var(name).ok()).await
}

/// Same as [`execute`], reading engine settings through `lookup`.
pub async fn execute_with_lookup<F>(config: &InboundConfig, lookup: F) -> ResolveResult
where
    F: Fn(&str) -> Option<String>,
{
    let engine_config = match EngineConfig::from_lookup(lookup) {
        Ok(engine_config) => engine_config,
        Err(e) => {
            error!("Configuration error: {e}");
            return ResolveResult::failure(e.to_string());
        }
    };
    debug!("{engine_config}");

    let resolver = match LinkResolver::from_config(&engine_config) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Failed to initialize resolver: {e}");
            return ResolveResult::failure(e.to_string());
        }
    };

    resolver.resolve_inbound(config).await
}
