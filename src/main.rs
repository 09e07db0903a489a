//! lsync - LinkSync link import tool.
//!
//! Imports bookmark records from a legacy SQL dump into a PocketBase
//! `links` collection, enriching each record with a discovered favicon.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linksync::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "linksync=info"
    } else {
        "linksync=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
