use crate::config::env::{self, EnvKey};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    /// Directory the public upload paths are resolved against.
    pub storage_root: String,
    pub worker_name: String,
    pub worker_concurrency: usize,
    pub poll_timeout_secs: u64,
    pub lock_ttl_secs: u64,
    pub dedup_ttl_secs: u64,
    pub ffmpeg_path: String,
    /// Demo asset substituted for missing sources by the requeue tool.
    pub fallback_asset: Option<String>,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            database_url: env::get(EnvKey::DatabaseUrl)?,
            redis_url: env::get(EnvKey::RedisUrl)?,
            storage_root: env::get_or(EnvKey::StorageRoot, "."),
            worker_name: env::get_or(
                EnvKey::WorkerName,
                &format!("worker-{}", std::process::id()),
            ),
            worker_concurrency: env::get_parsed(EnvKey::WorkerConcurrency, 1),
            poll_timeout_secs: env::get_parsed(EnvKey::PollTimeoutSecs, 2),
            lock_ttl_secs: env::get_parsed(EnvKey::LockTtlSecs, 60 * 60),
            dedup_ttl_secs: env::get_parsed(EnvKey::DedupTtlSecs, 60 * 60 * 24),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            fallback_asset: env::get_opt(EnvKey::FallbackAsset),
        })
    }
}
