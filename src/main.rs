use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transcode_pipeline::config::settings::AppConfig;
use transcode_pipeline::infrastructure::db::pool::connect_to_db;
use transcode_pipeline::infrastructure::redis::client::RedisService;
use transcode_pipeline::modules::transcode::repository::TranscodeRepository;
use transcode_pipeline::state::AppState;
use transcode_pipeline::workers::transcoder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::new().context("incomplete environment configuration")?;

    info!(worker = %config.worker_name, "Starting transcode worker...");

    let db = connect_to_db(&config.database_url).await?;
    let redis = RedisService::new(&config.redis_url).await?;

    TranscodeRepository::ensure_transcode_columns(&db)
        .await
        .context("failed to ensure transcode columns")?;

    let state = AppState::new(config, db, redis);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let mut loops = Vec::new();
    for _ in 0..state.config.worker_concurrency.max(1) {
        loops.push(tokio::spawn(transcoder::run_worker(
            state.clone(),
            shutdown_rx.clone(),
        )));
    }

    for handle in loops {
        let _ = handle.await;
    }

    info!("Transcode worker stopped");
    Ok(())
}
