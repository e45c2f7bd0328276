use std::env;
use std::str::FromStr;

pub enum EnvKey {
    DatabaseUrl,
    RedisUrl,
    StorageRoot,
    WorkerName,
    WorkerConcurrency,
    PollTimeoutSecs,
    LockTtlSecs,
    DedupTtlSecs,
    FfmpegPath,
    FallbackAsset,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::StorageRoot => "STORAGE_ROOT",
            EnvKey::WorkerName => "TRANSCODE_WORKER_NAME",
            EnvKey::WorkerConcurrency => "TRANSCODE_WORKER_CONCURRENCY",
            EnvKey::PollTimeoutSecs => "TRANSCODE_POLL_TIMEOUT_SECS",
            EnvKey::LockTtlSecs => "TRANSCODE_LOCK_TTL_SECS",
            EnvKey::DedupTtlSecs => "TRANSCODE_DEDUP_TTL_SECS",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FallbackAsset => "TRANSCODE_FALLBACK_ASSET",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok()
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
