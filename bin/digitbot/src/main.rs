use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::{AppState, RecentEvents};
use common::{Config, PipelineEvent, PipelineStats, Tick, TickSource};
use engine::DerivStream;
use strategy::{run_pipeline, Pipeline, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("loading configuration")?;
    let pipeline_cfg = match &cfg.pipeline_config_path {
        Some(path) => PipelineConfig::load(path).context("loading pipeline config")?,
        None => PipelineConfig::default(),
    };
    info!(market = %cfg.market, "DigitBot starting");

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let pipeline = Pipeline::new(pipeline_cfg).context("building pipeline")?;
    let stats = Arc::new(RwLock::new(PipelineStats::default()));

    // ── Channels ──────────────────────────────────────────────────────────────
    let (tick_tx, tick_rx) = mpsc::channel::<Tick>(1024);
    let (events_tx, _) = broadcast::channel::<PipelineEvent>(1024);

    // ── Tick source ───────────────────────────────────────────────────────────
    let source = DerivStream::new(cfg.deriv_ws_url.clone(), cfg.deriv_app_id, cfg.market.clone());
    info!(symbol = %source.symbol(), app_id = cfg.deriv_app_id, "Tick source configured");

    // ── Dashboard ─────────────────────────────────────────────────────────────
    let recent = RecentEvents::default();
    let api_state = AppState {
        market: cfg.market.clone(),
        events_tx: events_tx.clone(),
        recent: recent.clone(),
        stats: stats.clone(),
    };

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let port = cfg.port;
    tokio::spawn(recent.run(events_tx.subscribe()));
    tokio::spawn(run_pipeline(pipeline, tick_rx, events_tx, stats));
    tokio::spawn(async move { source.run(tick_tx).await });
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "Dashboard server stopped");
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutdown signal received. Exiting.");
    Ok(())
}
