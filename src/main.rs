//! # Chaser-Lens command line
//!
//! Opens a URL in a managed Chrome session and prints the extracted page
//! model: `chaser-lens <url> [max_length]`.
//!
//! ## Environment variables
//! - `CHASER_LENS_CDP_ENDPOINT`: attach to a running browser instead of launching one
//! - `CHASER_LENS_CHROME_PATH`: Chrome executable
//! - `CHASER_LENS_HEADLESS`: `false` to show the window
//! - `CHASER_LENS_MAX_CONTENT_LENGTH`: default byte budget for the output
//! - `RUST_LOG`: log filter (falls back to `CHASER_LENS_LOG_LEVEL`)

use anyhow::{bail, Context};
use chaser_lens::{
    cdp::ChromeLauncher,
    config::Config,
    session::{SessionManager, SessionManagerImpl},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Chaser-Lens v{}", chaser_lens::VERSION);

    let mut args = std::env::args().skip(1);
    let url = match args.next() {
        Some(url) => url,
        None => bail!("usage: chaser-lens <url> [max_length]"),
    };
    let max_length = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid max_length '{}'", raw))?,
        None => config.max_content_length,
    };

    let timeout = config.default_timeout();
    let manager = SessionManagerImpl::new(config, Arc::new(ChromeLauncher::new()));

    let outcome = tokio::select! {
        outcome = run(&manager, &url, max_length, timeout) => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C signal");
            Ok(())
        }
    };

    if let Err(e) = manager.stop().await {
        warn!("Failed to stop session: {}", e);
    }
    outcome
}

async fn run(
    manager: &SessionManagerImpl,
    url: &str,
    max_length: usize,
    timeout: std::time::Duration,
) -> anyhow::Result<()> {
    let page = manager
        .navigate(url, timeout.max(std::time::Duration::from_secs(30)))
        .await
        .with_context(|| format!("navigating to {}", url))?;
    println!("# {}\n# {}\n", page.title, page.url);

    let extraction = manager
        .extract(max_length, timeout)
        .await
        .context("extracting page model")?;
    println!("{}", extraction.text);
    if extraction.truncated {
        println!(
            "\n[truncated to {} bytes; {} elements addressable]",
            max_length, extraction.element_count
        );
    }
    Ok(())
}
