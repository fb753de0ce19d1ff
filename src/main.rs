use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use giveawayd::platform::NullPlatform;
use giveawayd::scheduler::{ClaimLoop, SchedulerConfig};
use giveawayd::store::JsonStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giveawayd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store_path = std::env::var("GIVEAWAYD_STORE").unwrap_or_else(|_| "giveaways.json".into());
    let store = match JsonStore::open(&store_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(path = %store_path, error = %e, "Failed to open giveaway store");
            std::process::exit(1);
        }
    };
    tracing::info!(path = %store_path, "Giveaway store opened");

    // No chat gateway is wired in this binary: message operations are logged,
    // not sent. The claim/finalize lifecycle runs for real against the store.
    let claim_loop =
        ClaimLoop::new(store, NullPlatform::new()).with_config(SchedulerConfig::from_env());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    claim_loop.run(shutdown).await;
}
