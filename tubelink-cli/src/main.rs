use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tubelink_engine::{InboundConfig, ResolveResult};

mod error;

use error::AppError;

fn main() {
    match bootstrap() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            error!(error = ?e, "Application failed");
            std::process::exit(2);
        }
    }
}

/// Reads the host configuration as JSON on stdin and writes the result as
/// JSON on stdout. Returns whether a link was resolved.
#[tokio::main]
async fn bootstrap() -> Result<bool, AppError> {
    // A missing .env file is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let config: InboundConfig = if input.trim().is_empty() {
        InboundConfig::default()
    } else {
        serde_json::from_str(&input)?
    };

    info!(
        url = %config.url,
        resolution = %config.resolution,
        force_refresh = config.force_refresh,
        "Resolving"
    );
    let result: ResolveResult = tubelink_engine::execute(&config).await;
    info!(success = result.success, cached = result.cached, "{}", result.message);

    let mut output = serde_json::to_vec_pretty(&result)?;
    output.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&output).await?;
    stdout.flush().await?;

    Ok(result.success)
}
