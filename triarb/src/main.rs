use std::sync::Arc;
use tracing::{error, info, warn};
use triarb::{Config, Credentials, DemoTransport, Engine};

const CONFIG_PATH: &str = "triarb.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    triarb::init_logging();

    let config = Config::load(CONFIG_PATH).map_err(|e| {
        error!(error = %e, "fatal configuration error");
        e
    })?;
    // Validated at startup even though the demo transport below doesn't use
    // it: a real `ExchangeTransport` would need it, and a missing credential
    // should fail fast regardless of which transport is wired in.
    let _credentials = Credentials::from_env().map_err(|e| {
        error!(error = %e, "fatal configuration error");
        e
    })?;

    info!(
        base_currency = %config.base_currency,
        dry_run = config.dry_run,
        max_triangles = config.max_triangles,
        max_concurrent_triangles = config.max_concurrent_triangles,
        min_profit_threshold = config.min_profit_threshold,
        effective_min_profit = config.effective_min_profit(),
        "starting triarb"
    );

    if !config.dry_run {
        warn!("dry_run is disabled: orders will be sent to the configured exchange");
    }

    // No production `ExchangeTransport` implementation lives in this
    // workspace (wiring a real exchange is an external integration
    // concern), so the binary runs against a synthetic in-process
    // transport until a real one is supplied.
    let transport = Arc::new(DemoTransport::new());

    let engine = Arc::new(Engine::bootstrap(transport, config).await?);

    let run_handle = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run().await }
    });

    tokio::signal::ctrl_c().await.ok();
    info!("received ctrl-c, shutting down");
    engine.request_shutdown();

    if let Err(error) = run_handle.await {
        error!(%error, "engine task did not shut down cleanly");
    }

    info!("triarb shut down cleanly");
    Ok(())
}
